//! Core types for artifacts, environment descriptors and reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::properties::{parse_properties, to_properties};

/// Environment name written when none is configured
pub const DEFAULT_ENVIRONMENT: &str = "prod";

/// Browser name written when none is configured
pub const DEFAULT_BROWSER: &str = "chromium";

/// Kind of file held in the artifact directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Attachment,
    Result,
    Environment,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Attachment => write!(f, "attachment"),
            ArtifactKind::Result => write!(f, "result"),
            ArtifactKind::Environment => write!(f, "environment"),
        }
    }
}

/// Artifact body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Bytes(b) => b,
            Payload::Text(s) => s.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(b)
    }
}

/// One piece of evidence destined for the artifact directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub id: Uuid,
    pub kind: ArtifactKind,
    pub media_type: String,
    pub payload: Payload,
    pub written_at: DateTime<Utc>,
}

impl ArtifactDescriptor {
    /// New attachment with a fresh random id
    pub fn attachment(payload: impl Into<Payload>, media_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ArtifactKind::Attachment,
            media_type: media_type.to_string(),
            payload: payload.into(),
            written_at: Utc::now(),
        }
    }

    /// New result record (`<id>-result.json`)
    pub fn result(payload: impl Into<Payload>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ArtifactKind::Result,
            media_type: "application/json".to_string(),
            payload: payload.into(),
            written_at: Utc::now(),
        }
    }

    /// File name inside the artifact directory
    pub fn file_name(&self) -> String {
        match self.kind {
            ArtifactKind::Environment => ENVIRONMENT_FILE.to_string(),
            ArtifactKind::Result => format!("{}-result.json", self.id),
            ArtifactKind::Attachment => {
                format!("{}-{}", self.id, attachment_suffix(&self.media_type))
            }
        }
    }
}

/// Name of the environment descriptor file
pub const ENVIRONMENT_FILE: &str = "environment.properties";

fn attachment_suffix(media_type: &str) -> &'static str {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/json" => "attachment.json",
        "text/html" => "page-source.html",
        "text/plain" => "attachment.txt",
        "image/png" => "attachment.png",
        _ => "attachment.bin",
    }
}

/// Runtime environment of a run, written once before any scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    pub environment_name: String,
    pub browser_name: String,
    pub base_url: String,
    pub platform: String,
    pub runtime_version: String,
}

impl Default for EnvironmentDescriptor {
    fn default() -> Self {
        Self {
            environment_name: DEFAULT_ENVIRONMENT.to_string(),
            browser_name: DEFAULT_BROWSER.to_string(),
            base_url: String::new(),
            platform: std::env::consts::OS.to_string(),
            runtime_version: runtime_version(),
        }
    }
}

/// Version label of the harness runtime written under the `Runtime` key
pub fn runtime_version() -> String {
    format!("storefront-harness/{}", crate::VERSION)
}

impl EnvironmentDescriptor {
    /// Replace blank fields that have a documented default.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.environment_name.trim().is_empty() {
            self.environment_name = defaults.environment_name;
        }
        if self.browser_name.trim().is_empty() {
            self.browser_name = defaults.browser_name;
        }
        if self.platform.trim().is_empty() {
            self.platform = defaults.platform;
        }
        if self.runtime_version.trim().is_empty() {
            self.runtime_version = defaults.runtime_version;
        }
        self
    }

    pub fn to_properties(&self) -> String {
        to_properties(&[
            ("Environment", self.environment_name.as_str()),
            ("Browser", self.browser_name.as_str()),
            ("BaseURL", self.base_url.as_str()),
            ("Platform", self.platform.as_str()),
            ("Runtime", self.runtime_version.as_str()),
        ])
    }

    /// Parse a descriptor, filling unknown or blank keys with defaults.
    ///
    /// Fails only when none of the descriptor keys are present.
    pub fn from_properties(content: &str) -> Result<Self> {
        let map: BTreeMap<String, String> = parse_properties(content);
        let known = ["Environment", "Browser", "BaseURL", "Platform", "Runtime"];
        if !known.iter().any(|k| map.contains_key(*k)) {
            return Err(Error::InvalidProperties(
                "no environment keys found".to_string(),
            ));
        }

        let get = |k: &str| map.get(k).cloned().unwrap_or_default();
        Ok(Self {
            environment_name: get("Environment"),
            browser_name: get("Browser"),
            base_url: get("BaseURL"),
            platform: get("Platform"),
            runtime_version: get("Runtime"),
        }
        .normalized())
    }
}

/// Report flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Browsable tree built by the external report tool
    StructuredRecordReport,
    /// Single HTML page rendered from the structured run record
    AggregatedHtmlReport,
}

/// Outcome of a report build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    Failed,
    Skipped,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Ok => write!(f, "ok"),
            ReportStatus::Failed => write!(f, "failed"),
            ReportStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// A generated (or attempted) report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: ReportFormat,
    pub generated_at: DateTime<Utc>,
    pub status: ReportStatus,
}

impl ReportArtifact {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        format: ReportFormat,
        status: ReportStatus,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            format,
            generated_at: Utc::now(),
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReportStatus::Ok
    }
}

/// Host platform family, used to pick a file-open command chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Windows,
    MacOs,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Unix
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Unix => write!(f, "unix"),
        }
    }
}

/// Record of a fire-and-forget process launch. Never owns the child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessHandle {
    pub command: String,
    pub args: Vec<String>,
    pub platform: Platform,
    pub detached: bool,
    pub outcome_logged: bool,
}

impl ProcessHandle {
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
