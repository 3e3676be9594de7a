//! Aggregated HTML rendering of a structured run record

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::record::{RunRecord, Scenario, StepStatus};

/// Metadata block shown at the top of the aggregated report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetadata {
    pub app_version: String,
    pub test_environment: String,
    pub browser: String,
    pub platform: String,
    pub parallel: String,
    pub executed: String,
}

impl ReportMetadata {
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("App Version", self.app_version.as_str()),
            ("Test Environment", self.test_environment.as_str()),
            ("Browser", self.browser.as_str()),
            ("Platform", self.platform.as_str()),
            ("Parallel", self.parallel.as_str()),
            ("Executed", self.executed.as_str()),
        ]
    }
}

const STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
table{border-collapse:collapse;margin-bottom:1.5em}\
td,th{border:1px solid #ccc;padding:4px 10px;text-align:left}\
.passed{color:#2e7d32}.failed{color:#c62828}.skipped,.pending,.undefined,.ambiguous{color:#f9a825}\
section.feature{margin-bottom:2em}details{margin:4px 0 4px 2em}\
pre{background:#f5f5f5;padding:6px;white-space:pre-wrap}footer{color:#777;margin-top:3em}";

/// Render the full report page.
///
/// Output depends only on the inputs; `generated_at` is the single
/// time-varying part and appears only in the footer.
pub fn render(record: &RunRecord, meta: &ReportMetadata, generated_at: DateTime<Utc>) -> String {
    let summary = record.summary();
    let mut out = String::with_capacity(8 * 1024);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Storefront E2E Report</title>\n");
    let _ = writeln!(out, "<style>{}</style>", STYLE);
    out.push_str("</head>\n<body>\n<h1>Storefront E2E Report</h1>\n");

    out.push_str("<table class=\"metadata\">\n");
    for (key, value) in meta.entries() {
        let _ = writeln!(
            out,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape(key),
            escape(value)
        );
    }
    out.push_str("</table>\n");

    let _ = writeln!(
        out,
        "<table class=\"summary\">\n\
         <tr><th>Features</th><td>{}</td></tr>\n\
         <tr><th>Scenarios</th><td>{} (<span class=\"passed\">{} passed</span>, <span class=\"failed\">{} failed</span>)</td></tr>\n\
         <tr><th>Steps</th><td>{} (<span class=\"passed\">{} passed</span>, <span class=\"failed\">{} failed</span>, <span class=\"skipped\">{} other</span>)</td></tr>\n\
         </table>",
        summary.features,
        summary.scenarios,
        summary.scenarios_passed,
        summary.scenarios_failed,
        summary.steps,
        summary.steps_passed,
        summary.steps_failed,
        summary.steps_skipped,
    );

    for feature in &record.features {
        out.push_str("<section class=\"feature\">\n");
        let _ = writeln!(out, "<h2>Feature: {}</h2>", escape(&feature.name));
        if !feature.uri.is_empty() {
            let _ = writeln!(out, "<p class=\"uri\">{}</p>", escape(&feature.uri));
        }
        if !feature.description.trim().is_empty() {
            let _ = writeln!(out, "<p>{}</p>", escape(feature.description.trim()));
        }
        for scenario in &feature.elements {
            render_scenario(&mut out, scenario);
        }
        out.push_str("</section>\n");
    }

    let _ = writeln!(
        out,
        "<footer>Generated at {}</footer>\n</body>\n</html>",
        generated_at.to_rfc3339()
    );
    out
}

fn render_scenario(out: &mut String, scenario: &Scenario) {
    let status = scenario.status();
    let keyword = if scenario.keyword.is_empty() {
        "Scenario"
    } else {
        scenario.keyword.as_str()
    };

    let _ = writeln!(
        out,
        "<details{}><summary class=\"{}\">{}: {} ({} ms)</summary>",
        if status == StepStatus::Passed { "" } else { " open" },
        status.as_str(),
        escape(keyword),
        escape(&scenario.name),
        scenario.duration_ns() / 1_000_000,
    );

    out.push_str("<ol>\n");
    for step in scenario.reported_steps() {
        let _ = write!(
            out,
            "<li class=\"{}\">{} {} <em>{}</em>",
            step.result.status.as_str(),
            escape(step.keyword.trim()),
            escape(&step.name),
            step.result.status.as_str(),
        );
        if let Some(err) = &step.result.error_message {
            let _ = write!(out, "<pre>{}</pre>", escape(err));
        }
        for embedding in &step.embeddings {
            match embedding.text() {
                Some(text) => {
                    let _ = write!(
                        out,
                        "<details><summary>{}</summary><pre>{}</pre></details>",
                        escape(&embedding.mime_type),
                        escape(&text)
                    );
                }
                None => {
                    let _ = write!(
                        out,
                        "<p>attachment ({})</p>",
                        escape(&embedding.mime_type)
                    );
                }
            }
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ol>\n</details>\n");
}

/// Minimal HTML escaping for text and attribute content
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta() -> ReportMetadata {
        ReportMetadata {
            app_version: "1.0.0".into(),
            test_environment: "QA".into(),
            browser: "chrome".into(),
            platform: "linux".into(),
            parallel: "Scenarios".into(),
            executed: "Local".into(),
        }
    }

    const RECORD: &str = r#"[{"name":"Orders <history>","elements":[
        {"name":"No orders","steps":[
          {"keyword":"Then ","name":"I should see \"No Orders\"","result":{"status":"failed","error_message":"<div>Loading...</div>"},
           "embeddings":[{"data":"PGh0bWw+PC9odG1sPg==","mime_type":"text/html"}]}
        ]}]}]"#;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_render_contains_metadata_and_steps() {
        let record = RunRecord::from_json(RECORD).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let html = render(&record, &meta(), at);

        assert!(html.contains("<tr><th>Test Environment</th><td>QA</td></tr>"));
        assert!(html.contains("<tr><th>Executed</th><td>Local</td></tr>"));
        assert!(html.contains("Feature: Orders &lt;history&gt;"));
        assert!(html.contains("I should see &quot;No Orders&quot;"));
        assert!(html.contains("&lt;div&gt;Loading...&lt;/div&gt;"));
        assert!(html.contains("&lt;html&gt;&lt;/html&gt;"));
        assert!(html.contains("<details open><summary class=\"failed\">"));
        assert!(html.contains("Generated at 2024-05-01T12:00:00+00:00"));
    }

    #[test]
    fn test_failed_after_hook_is_rendered() {
        let record = RunRecord::from_json(
            r#"[{"name":"Orders","elements":[{"name":"Teardown breaks","steps":[
              {"keyword":"Before","hidden":true,"result":{"status":"passed"}},
              {"keyword":"Given ","name":"I open the application","result":{"status":"passed"}},
              {"keyword":"After","hidden":true,"result":{"status":"failed","error_message":"browser crashed"}}
            ]}]}]"#,
        )
        .unwrap();
        let html = render(&record, &meta(), Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        assert!(html.contains("<details open><summary class=\"failed\">"));
        assert!(html.contains("<li class=\"failed\">After"));
        assert!(html.contains("browser crashed"));
        assert!(!html.contains("<li class=\"passed\">Before"));
    }

    #[test]
    fn test_render_is_deterministic_apart_from_timestamp() {
        let record = RunRecord::from_json(RECORD).unwrap();
        let a = render(&record, &meta(), Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        let b = render(&record, &meta(), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let strip = |s: &str| {
            s.lines()
                .filter(|l| !l.starts_with("<footer>"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_ne!(a, b);
        assert_eq!(strip(&a), strip(&b));
    }
}
