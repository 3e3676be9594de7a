//! Error types for the run orchestrator

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Artifact directory unavailable: {0}")]
    ArtifactDir(String),

    #[error("Report tool failed: {0}")]
    ReportTool(String),

    #[error("Failed to spawn {command}: {reason}")]
    Spawn { command: String, reason: String },

    #[error("Structured run record not found: {0}")]
    RecordNotFound(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
