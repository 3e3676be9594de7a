#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

use storefront_e2e::config::{CommandSpec, HarnessConfig, ReportToolConfig};

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

/// Stand-in for the report tool.
///
/// `generate <in> -o <out> --clean` writes `index.html` listing the input files
/// with their checksums plus a timestamp footer; `open <dir>` drops a marker.
const FAKE_REPORT_TOOL: &str = r#"
case "$1" in
  generate)
    in="$2"; out="$4"
    rm -rf "$out"
    mkdir -p "$out" || exit 1
    {
      echo "<html><body><ul>"
      for f in $(ls "$in" | sort); do
        echo "<li>$f $(cksum < "$in/$f" | cut -d' ' -f1)</li>"
      done
      echo "</ul>"
      echo "<footer>$(date -u)</footer></body></html>"
    } > "$out/index.html"
    ;;
  open)
    touch "$2/opened-by-tool"
    ;;
  *)
    exit 2
    ;;
esac
"#;

/// Write the fake report tool into `dir` and return a config invoking it
/// through `sh`, so the script never needs to be executable.
pub fn fake_report_tool(dir: &Path) -> ReportToolConfig {
    let script = dir.join("fake-report-tool.sh");
    std::fs::write(&script, FAKE_REPORT_TOOL).unwrap();
    ReportToolConfig {
        program: "sh".to_string(),
        args: vec![script.to_string_lossy().into_owned()],
    }
}

/// Opener that creates `<target>.opened` instead of showing anything
pub fn marker_opener() -> CommandSpec {
    CommandSpec::new("sh", &["-c", "touch \"$0.opened\"", "{target}"])
}

pub fn opened_marker(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".opened");
    PathBuf::from(name)
}

/// Harness config rooted at `root` with fast readiness bounds and the fake
/// tooling wired in.
pub fn test_config(root: &Path, env: &[(&str, &str)]) -> HarnessConfig {
    let pairs: Vec<(String, String)> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut config = HarnessConfig::load_with(root, None, move |key| {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    })
    .unwrap();

    let tools = root.join(".tools");
    std::fs::create_dir_all(&tools).unwrap();
    config.report_tool = fake_report_tool(&tools);
    config.launcher.file_openers = Some(vec![marker_opener()]);
    config.readiness.timeout_ms = 2_000;
    config.readiness.poll_interval_ms = 50;
    config
}

/// Directory holding the structured record and aggregated report
pub fn reports_dir(config: &HarnessConfig) -> PathBuf {
    config.structured_record().parent().unwrap().to_path_buf()
}

/// Poll for a path created by a detached process.
pub fn eventually_exists(path: &Path, within: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < within {
        if path.exists() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    path.exists()
}

pub const SAMPLE_RECORD: &str = r#"[
  {
    "name": "Order history",
    "uri": "features/orders.feature",
    "elements": [
      {
        "name": "No orders when the API returns 404",
        "keyword": "Scenario",
        "steps": [
          {"keyword": "Given ", "name": "I open the application", "result": {"status": "passed", "duration": 2000000}},
          {"keyword": "When ", "name": "I intercept the orders API to return 404", "result": {"status": "passed"}},
          {"keyword": "Then ", "name": "I should see the no-orders message \"No Orders\"", "result": {"status": "passed"}}
        ]
      }
    ]
  }
]"#;
