//! Harness configuration
//!
//! Values come from, in increasing precedence: built-in defaults, an optional
//! TOML file, and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use storefront_common::{EnvironmentDescriptor, DEFAULT_BROWSER};

use crate::error::{E2eError, E2eResult};

/// Config file looked up in the project root when no path is given
pub const CONFIG_FILE: &str = "storefront-e2e.toml";

/// Run environment name
pub const ENV_ENVIRONMENT: &str = "PW_ENV";
/// Browser override
pub const ENV_BROWSER: &str = "BROWSER";
/// Pipeline flag
pub const ENV_CI: &str = "CI";
/// Auto-open switch for the aggregated report
pub const ENV_AUTO_OPEN: &str = "REPORT_AUTO_OPEN";

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Project root all relative paths resolve against
    #[serde(skip)]
    pub root: PathBuf,

    pub paths: PathsConfig,
    pub environment: EnvironmentConfig,
    pub projects: Vec<ProjectConfig>,
    pub readiness: ReadinessConfig,
    pub report_tool: ReportToolConfig,
    pub launcher: LauncherConfig,

    /// Running inside a CI pipeline
    pub ci: bool,

    /// Open the aggregated report after generating it (never in CI)
    pub auto_open: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            paths: PathsConfig::default(),
            environment: EnvironmentConfig::default(),
            projects: default_projects(),
            readiness: ReadinessConfig::default(),
            report_tool: ReportToolConfig::default(),
            launcher: LauncherConfig::default(),
            ci: false,
            auto_open: true,
        }
    }
}

/// Artifact and report locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub artifact_dir: PathBuf,
    pub structured_record: PathBuf,
    pub aggregated_html: PathBuf,
    pub report_output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("allure-results"),
            structured_record: PathBuf::from("reports/cucumber-report.json"),
            aggregated_html: PathBuf::from("reports/cucumber-report.html"),
            report_output_dir: PathBuf::from("reports/allure-report"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub name: String,
    pub browser: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: storefront_common::DEFAULT_ENVIRONMENT.to_string(),
            browser: None,
        }
    }
}

/// A deployment target of the storefront
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub base_url: String,
    pub browser_name: String,
}

fn default_projects() -> Vec<ProjectConfig> {
    let project = |name: &str, base_url: &str, browser_name: &str| ProjectConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        browser_name: browser_name.to_string(),
    };

    vec![
        project("dev", "https://dev.rahulshettyacademy.com/client/", "chromium"),
        project("qa", "https://rahulshettyacademy.com/client/", "chrome"),
        project("stage", "https://stage.rahulshettyacademy.com/client/", "webkit"),
        project("prod", "https://rahulshettyacademy.com/client/", "chromium"),
    ]
}

/// Readiness polling bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 20_000,
            poll_interval_ms: 300,
        }
    }
}

/// External report-build tool invocation prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportToolConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ReportToolConfig {
    /// `npx allure`. On Windows npx is a `npx.cmd` shim, which process
    /// spawning does not resolve, so it goes through `cmd /C`.
    #[cfg(windows)]
    fn default() -> Self {
        Self {
            program: "cmd".to_string(),
            args: vec!["/C".to_string(), "npx".to_string(), "allure".to_string()],
        }
    }

    #[cfg(not(windows))]
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec!["allure".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Replaces the platform file-open chain when set
    pub file_openers: Option<Vec<CommandSpec>>,
}

/// A command template; `{target}` in any argument is replaced at launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Substitute `{target}`; a template without the placeholder gets the
    /// target appended.
    pub fn render(&self, target: &Path) -> (String, Vec<String>) {
        let target = target.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                if a.contains("{target}") {
                    substituted = true;
                    a.replace("{target}", &target)
                } else {
                    a.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(target.into_owned());
        }
        (self.program.clone(), args)
    }
}

impl HarnessConfig {
    /// Load configuration with an explicit environment lookup.
    pub fn load_with<F>(root: &Path, config_path: Option<&Path>, env: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match config_path {
            Some(p) if !p.exists() => {
                return Err(E2eError::Config(format!(
                    "config file {} does not exist",
                    p.display()
                )))
            }
            Some(p) => Some(p.to_path_buf()),
            None => {
                let candidate = root.join(CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };

        let mut config = match file {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                toml::from_str::<HarnessConfig>(&content)?
            }
            None => HarnessConfig::default(),
        };

        config.root = root.to_path_buf();
        config.apply_env(env);
        Ok(config)
    }

    /// Load configuration for `root` using the process environment.
    ///
    /// A bad or missing file only warns.
    ///
    /// Falls back to defaults rooted at `root` with environment overrides
    /// still applied, so a configuration mistake never stops a run.
    pub fn load_or_default(root: &Path, config_path: Option<&Path>) -> Self {
        Self::load_or_default_with(root, config_path, |key| std::env::var(key).ok())
    }

    pub fn load_or_default_with<F>(root: &Path, config_path: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match Self::load_with(root, config_path, &env) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring configuration, using defaults: {}", e);
                let mut config = HarnessConfig {
                    root: root.to_path_buf(),
                    ..HarnessConfig::default()
                };
                config.apply_env(&env);
                config
            }
        }
    }

    /// Apply environment overrides.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = env(ENV_ENVIRONMENT).filter(|v| !v.trim().is_empty()) {
            self.environment.name = name.trim().to_string();
        }
        if let Some(browser) = env(ENV_BROWSER).filter(|v| !v.trim().is_empty()) {
            self.environment.browser = Some(browser.trim().to_string());
        }
        if let Some(ci) = env(ENV_CI) {
            self.ci = parse_flag(&ci);
        }
        if let Some(open) = env(ENV_AUTO_OPEN) {
            self.auto_open = parse_flag(&open);
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.resolve(&self.paths.artifact_dir)
    }

    pub fn structured_record(&self) -> PathBuf {
        self.resolve(&self.paths.structured_record)
    }

    pub fn aggregated_html(&self) -> PathBuf {
        self.resolve(&self.paths.aggregated_html)
    }

    pub fn report_output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.report_output_dir)
    }

    /// Project named by the environment, else the first one
    pub fn selected_project(&self) -> Option<&ProjectConfig> {
        self.projects
            .iter()
            .find(|p| p.name == self.environment.name)
            .or_else(|| self.projects.first())
    }

    pub fn browser_name(&self) -> String {
        self.environment
            .browser
            .clone()
            .or_else(|| self.selected_project().map(|p| p.browser_name.clone()))
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_BROWSER.to_string())
    }

    pub fn base_url(&self) -> String {
        self.selected_project()
            .map(|p| p.base_url.clone())
            .unwrap_or_default()
    }

    pub fn environment_descriptor(&self) -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            environment_name: self.environment.name.clone(),
            browser_name: self.browser_name(),
            base_url: self.base_url(),
            ..Default::default()
        }
        .normalized()
    }

    /// `auto_open`, forced off in CI
    pub fn effective_auto_open(&self) -> bool {
        self.auto_open && !self.ci
    }

    /// Label for the "Executed" metadata entry
    pub fn execution_context(&self) -> &'static str {
        if self.ci {
            "Pipeline"
        } else {
            "Local"
        }
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness.poll_interval_ms)
    }
}

/// Truthy values: `1`, `true`, `yes`, `on` (case-insensitive)
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use test_case::test_case;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test_case("1", true)]
    #[test_case("TRUE", true)]
    #[test_case(" yes ", true)]
    #[test_case("on", true)]
    #[test_case("0", false)]
    #[test_case("false", false)]
    #[test_case("", false)]
    fn test_parse_flag(value: &str, expected: bool) {
        assert_eq!(parse_flag(value), expected);
    }

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = HarnessConfig::load_with(tmp.path(), None, env_of(&[])).unwrap();

        assert_eq!(config.environment.name, "prod");
        assert_eq!(config.browser_name(), "chromium");
        assert_eq!(config.artifact_dir(), tmp.path().join("allure-results"));
        assert_eq!(config.readiness_timeout(), Duration::from_secs(20));
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
        assert!(config.effective_auto_open());
        assert_eq!(config.execution_context(), "Local");
    }

    #[test]
    fn test_env_selects_project() {
        let tmp = TempDir::new().unwrap();
        let config =
            HarnessConfig::load_with(tmp.path(), None, env_of(&[("PW_ENV", "stage")])).unwrap();

        let env = config.environment_descriptor();
        assert_eq!(env.environment_name, "stage");
        assert_eq!(env.browser_name, "webkit");
        assert_eq!(env.base_url, "https://stage.rahulshettyacademy.com/client/");
    }

    #[test]
    fn test_browser_env_overrides_project() {
        let tmp = TempDir::new().unwrap();
        let config = HarnessConfig::load_with(
            tmp.path(),
            None,
            env_of(&[("PW_ENV", "stage"), ("BROWSER", "firefox")]),
        )
        .unwrap();
        assert_eq!(config.browser_name(), "firefox");
    }

    #[test]
    fn test_unknown_environment_falls_back_to_first_project() {
        let tmp = TempDir::new().unwrap();
        let config =
            HarnessConfig::load_with(tmp.path(), None, env_of(&[("PW_ENV", "perf")])).unwrap();
        assert_eq!(config.environment.name, "perf");
        assert_eq!(config.selected_project().unwrap().name, "dev");
    }

    #[test]
    fn test_ci_disables_auto_open() {
        let tmp = TempDir::new().unwrap();
        let config = HarnessConfig::load_with(
            tmp.path(),
            None,
            env_of(&[("CI", "true"), ("REPORT_AUTO_OPEN", "1")]),
        )
        .unwrap();
        assert!(config.ci);
        assert!(config.auto_open);
        assert!(!config.effective_auto_open());
        assert_eq!(config.execution_context(), "Pipeline");
    }

    #[test]
    fn test_toml_file_then_env() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
auto_open = false

[environment]
name = "qa"

[paths]
artifact_dir = "/tmp/elsewhere"

[readiness]
timeout_ms = 500

[report_tool]
program = "allure"
args = []
"#,
        )
        .unwrap();

        let config =
            HarnessConfig::load_with(tmp.path(), None, env_of(&[("PW_ENV", "dev")])).unwrap();

        assert_eq!(config.environment.name, "dev");
        assert!(!config.auto_open);
        assert_eq!(config.artifact_dir(), PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.readiness.timeout_ms, 500);
        assert_eq!(config.readiness.poll_interval_ms, 300);
        assert_eq!(config.report_tool.program, "allure");
        assert_eq!(config.projects.len(), 4);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        let err = HarnessConfig::load_with(tmp.path(), Some(&missing), env_of(&[])).unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[test]
    fn test_corrupt_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "readiness = \"oops").unwrap();
        assert!(HarnessConfig::load_with(tmp.path(), None, env_of(&[])).is_err());

        let config = HarnessConfig::load_or_default_with(
            tmp.path(),
            None,
            env_of(&[("PW_ENV", "qa"), ("CI", "true")]),
        );
        assert_eq!(config.root, tmp.path());
        assert_eq!(config.environment.name, "qa");
        assert!(config.ci);
        assert_eq!(config.readiness.timeout_ms, 20_000);
        assert_eq!(config.artifact_dir(), tmp.path().join("allure-results"));
    }

    #[test]
    fn test_missing_explicit_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        let config = HarnessConfig::load_or_default_with(tmp.path(), Some(&missing), env_of(&[]));
        assert_eq!(config.environment.name, "prod");
        assert_eq!(config.root, tmp.path());
    }

    #[cfg(windows)]
    #[test]
    fn test_report_tool_default_goes_through_cmd() {
        let tool = ReportToolConfig::default();
        assert_eq!(tool.program, "cmd");
        assert_eq!(tool.args, vec!["/C", "npx", "allure"]);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_report_tool_default_runs_npx() {
        let tool = ReportToolConfig::default();
        assert_eq!(tool.program, "npx");
        assert_eq!(tool.args, vec!["allure"]);
    }

    #[test]
    fn test_command_spec_render() {
        let spec = CommandSpec::new("open", &["-a", "Google Chrome", "{target}"]);
        let (program, args) = spec.render(Path::new("/r/index.html"));
        assert_eq!(program, "open");
        assert_eq!(args, vec!["-a", "Google Chrome", "/r/index.html"]);

        let (_, args) = CommandSpec::new("xdg-open", &[]).render(Path::new("/r/x.html"));
        assert_eq!(args, vec!["/r/x.html"]);
    }
}
