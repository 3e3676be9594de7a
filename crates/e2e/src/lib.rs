//! Storefront E2E run orchestration
//!
//! This crate owns everything that happens around a run of the storefront UI
//! suite, outside the scenarios themselves:
//! - Resets the artifact directory and records the run environment
//! - Persists evidence captured by scenario steps, safely under concurrency
//! - Waits for asynchronously flushed result files
//! - Builds the report tree and the aggregated HTML report
//! - Opens reports through detached, platform-specific viewers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RunLifecycleHooks                        │
//! │    on_run_start()  -> reset + write_environment             │
//! │    on_run_finish() -> open aggregated report                │
//! │                       wait for result files                 │
//! │                       generate report tree, open it         │
//! ├──────────────┬───────────────┬──────────────┬───────────────┤
//! │ ArtifactStore│ReadinessWaiter│ReportGenerator│ProcessLauncher│
//! └──────────────┴───────────────┴──────────────┴───────────────┘
//! ```
//!
//! Reporting is best-effort: no failure in here changes the run's result.

pub mod artifact;
pub mod config;
pub mod error;
pub mod launcher;
pub mod lifecycle;
pub mod readiness;
pub mod report;
pub mod scenario;

pub use artifact::ArtifactStore;
pub use config::HarnessConfig;
pub use error::{E2eError, E2eResult};
pub use launcher::ProcessLauncher;
pub use lifecycle::{FinishOutcome, FinishReport, RunLifecycleHooks, RunState};
pub use readiness::ReadinessWaiter;
pub use report::ReportGenerator;
pub use scenario::{EvidenceSink, ScenarioContext, StepExecutor};
