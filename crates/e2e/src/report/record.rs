//! Structured run record (cucumber JSON) model

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub elements: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub result: StepResult,
    #[serde(default)]
    pub embeddings: Vec<Embedding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepResult {
    #[serde(default)]
    pub status: StepStatus,
    /// Nanoseconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
    Pending,
    Ambiguous,
    #[default]
    #[serde(other)]
    Undefined,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::Pending => "pending",
            StepStatus::Ambiguous => "ambiguous",
            StepStatus::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub mime_type: String,
}

impl Embedding {
    pub fn is_text(&self) -> bool {
        let mt = self.mime_type.to_ascii_lowercase();
        mt.starts_with("text/") || mt.contains("json") || mt.contains("xml")
    }

    /// Decoded text of a textual embedding. Data that is not valid base64 is
    /// taken verbatim.
    pub fn text(&self) -> Option<String> {
        if !self.is_text() {
            return None;
        }
        match base64::engine::general_purpose::STANDARD.decode(self.data.trim()) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(_) => Some(self.data.clone()),
        }
    }
}

impl Step {
    /// Before/After hooks are recorded as hidden steps
    pub fn is_hook(&self) -> bool {
        self.hidden
    }

    /// Regular steps always count; hooks only when they failed
    pub fn is_reported(&self) -> bool {
        !self.is_hook() || self.result.status == StepStatus::Failed
    }
}

impl Scenario {
    /// A scenario passes when every reported step passed
    pub fn status(&self) -> StepStatus {
        self.reported_steps()
            .map(|s| s.result.status)
            .find(|s| *s != StepStatus::Passed)
            .unwrap_or(StepStatus::Passed)
    }

    pub fn reported_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.is_reported())
    }

    pub fn duration_ns(&self) -> u64 {
        self.steps
            .iter()
            .filter_map(|s| s.result.duration)
            .fold(0u64, |total, d| total.saturating_add(d))
    }
}

/// Parsed structured run record
#[derive(Debug, Clone, Default)]
pub struct RunRecord {
    pub features: Vec<Feature>,
}

/// Pass/fail counts over a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub features: usize,
    pub scenarios: usize,
    pub scenarios_passed: usize,
    pub scenarios_failed: usize,
    pub steps: usize,
    pub steps_passed: usize,
    pub steps_failed: usize,
    pub steps_skipped: usize,
}

impl RunRecord {
    pub fn from_json(json: &str) -> E2eResult<Self> {
        let features: Vec<Feature> = if json.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(json)?
        };
        Ok(Self { features })
    }

    pub fn load(path: &Path) -> E2eResult<Self> {
        if !path.exists() {
            return Err(E2eError::RecordNotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn summary(&self) -> RecordSummary {
        let mut s = RecordSummary {
            features: self.features.len(),
            ..Default::default()
        };
        for scenario in self.features.iter().flat_map(|f| f.elements.iter()) {
            s.scenarios += 1;
            match scenario.status() {
                StepStatus::Passed => s.scenarios_passed += 1,
                _ => s.scenarios_failed += 1,
            }
            for step in scenario.reported_steps() {
                s.steps += 1;
                match step.result.status {
                    StepStatus::Passed => s.steps_passed += 1,
                    StepStatus::Failed => s.steps_failed += 1,
                    _ => s.steps_skipped += 1,
                }
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {
        "id": "place-order",
        "name": "Place order",
        "uri": "features/order.feature",
        "elements": [
          {
            "name": "Order a product",
            "keyword": "Scenario",
            "type": "scenario",
            "steps": [
              {"keyword": "Before", "hidden": true, "result": {"status": "passed", "duration": 100}},
              {"keyword": "Given ", "name": "I open the application", "result": {"status": "passed", "duration": 1000}},
              {"keyword": "When ", "name": "I login with alias \"buyer\"", "result": {"status": "failed", "error_message": "timeout"},
               "embeddings": [{"data": "eyJvayI6ZmFsc2V9", "mime_type": "application/json"}]},
              {"keyword": "Then ", "name": "I see the orders", "result": {"status": "skipped"}}
            ]
          },
          {
            "name": "Browse catalog",
            "keyword": "Scenario",
            "steps": [
              {"keyword": "Given ", "name": "I open the application", "result": {"status": "passed"}}
            ]
          }
        ]
      }
    ]"#;

    #[test]
    fn test_summary_counts() {
        let record = RunRecord::from_json(SAMPLE).unwrap();
        let s = record.summary();
        assert_eq!(s.features, 1);
        assert_eq!(s.scenarios, 2);
        assert_eq!(s.scenarios_passed, 1);
        assert_eq!(s.scenarios_failed, 1);
        assert_eq!(s.steps, 4);
        assert_eq!(s.steps_passed, 2);
        assert_eq!(s.steps_failed, 1);
        assert_eq!(s.steps_skipped, 1);
    }

    #[test]
    fn test_scenario_status_and_duration() {
        let record = RunRecord::from_json(SAMPLE).unwrap();
        let scenario = &record.features[0].elements[0];
        assert_eq!(scenario.status(), StepStatus::Failed);
        assert_eq!(scenario.duration_ns(), 1100);
    }

    #[test]
    fn test_failed_hook_fails_scenario() {
        let record = RunRecord::from_json(
            r#"[{"name":"f","elements":[{"name":"s","steps":[
              {"keyword":"Before","hidden":true,"result":{"status":"passed"}},
              {"keyword":"Given ","name":"I open the application","result":{"status":"passed"}},
              {"keyword":"After","hidden":true,"result":{"status":"failed","error_message":"teardown"}}
            ]}]}]"#,
        )
        .unwrap();
        let scenario = &record.features[0].elements[0];
        assert_eq!(scenario.status(), StepStatus::Failed);

        let reported: Vec<_> = scenario.reported_steps().map(|s| s.keyword.as_str()).collect();
        assert_eq!(reported, vec!["Given ", "After"]);

        let s = record.summary();
        assert_eq!(s.scenarios_passed, 0);
        assert_eq!(s.scenarios_failed, 1);
        assert_eq!(s.steps, 2);
        assert_eq!(s.steps_failed, 1);
    }

    #[test]
    fn test_duration_saturates() {
        let record = RunRecord::from_json(&format!(
            r#"[{{"name":"f","elements":[{{"name":"s","steps":[
              {{"name":"a","result":{{"status":"passed","duration":{max}}}}},
              {{"name":"b","result":{{"status":"passed","duration":{max}}}}}
            ]}}]}}]"#,
            max = u64::MAX
        ))
        .unwrap();
        assert_eq!(record.features[0].elements[0].duration_ns(), u64::MAX);
    }

    #[test]
    fn test_embedding_decoding() {
        let record = RunRecord::from_json(SAMPLE).unwrap();
        let emb = &record.features[0].elements[0].steps[2].embeddings[0];
        assert_eq!(emb.text().unwrap(), r#"{"ok":false}"#);

        let png = Embedding {
            data: "iVBORw0K".into(),
            mime_type: "image/png".into(),
        };
        assert!(png.text().is_none());
    }

    #[test]
    fn test_unknown_status_is_undefined() {
        let record = RunRecord::from_json(
            r#"[{"name":"f","elements":[{"name":"s","steps":[{"name":"x","result":{"status":"weird"}}]}]}]"#,
        )
        .unwrap();
        assert_eq!(
            record.features[0].elements[0].steps[0].result.status,
            StepStatus::Undefined
        );
    }

    #[test]
    fn test_empty_record() {
        assert!(RunRecord::from_json("").unwrap().features.is_empty());
        assert!(RunRecord::load(Path::new("/definitely/missing.json")).is_err());
    }
}
