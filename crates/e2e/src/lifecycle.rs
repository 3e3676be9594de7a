//! Run lifecycle hooks
//!
//! ```text
//!  on_run_start            on_run_finish
//! INIT ──────────► RUNNING ─────────────► FINALIZING ──► DONE
//!  reset artifacts           open aggregated report
//!  write environment         artifact dir missing?  ──► DONE
//!                            wait for result files (timeout ──► DONE)
//!                            generate report, open it
//! ```
//!
//! Neither hook returns an error. Whatever goes wrong is logged, and the run's
//! own exit status is left alone.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use storefront_common::{Error as CommonError, ProcessHandle, ReportArtifact};

use crate::artifact::ArtifactStore;
use crate::config::HarnessConfig;
use crate::launcher::ProcessLauncher;
use crate::readiness::ReadinessWaiter;
use crate::report::ReportGenerator;

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    Running,
    Finalizing,
    Done,
}

impl RunState {
    fn can_advance_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Init, RunState::Running)
                | (RunState::Running, RunState::Finalizing)
                | (RunState::Init, RunState::Finalizing)
                | (RunState::Finalizing, RunState::Done)
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Init => write!(f, "init"),
            RunState::Running => write!(f, "running"),
            RunState::Finalizing => write!(f, "finalizing"),
            RunState::Done => write!(f, "done"),
        }
    }
}

/// How finalization ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FinishOutcome {
    /// No artifact directory; nothing to build
    NoArtifacts,
    /// No result file appeared before the readiness timeout
    ResultsTimedOut,
    /// The report tool ran; `viewer` is whatever was launched to show it
    Generated {
        report: ReportArtifact,
        viewer: Option<ProcessHandle>,
    },
    /// The report tool could not be run or exited non-zero
    GenerationFailed { report: ReportArtifact },
    /// `on_run_finish` was already called for this run
    AlreadyFinished,
}

/// Everything `on_run_finish` did
#[derive(Debug, Clone, Serialize)]
pub struct FinishReport {
    pub aggregated_viewer: Option<ProcessHandle>,
    #[serde(flatten)]
    pub outcome: FinishOutcome,
}

/// Sequences artifact reset, readiness, generation and viewing around the
/// run-start and run-finish signals. One instance per run.
pub struct RunLifecycleHooks {
    config: HarnessConfig,
    store: ArtifactStore,
    waiter: ReadinessWaiter,
    generator: ReportGenerator,
    launcher: ProcessLauncher,
    state: Mutex<RunState>,
}

impl RunLifecycleHooks {
    pub fn new(config: HarnessConfig) -> Self {
        let launcher = ProcessLauncher::from_config(&config);
        let generator = ReportGenerator::from_config(&config, launcher.clone());
        Self {
            store: ArtifactStore::new(config.artifact_dir()),
            waiter: ReadinessWaiter::new(config.readiness_timeout(), config.poll_interval()),
            generator,
            launcher,
            config,
            state: Mutex::new(RunState::Init),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The run's artifact store, for evidence capture while running
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn generator(&self) -> &ReportGenerator {
        &self.generator
    }

    pub fn launcher(&self) -> &ProcessLauncher {
        &self.launcher
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    fn advance(&self, next: RunState) -> Result<RunState, CommonError> {
        let mut state = self.state.lock();
        if !state.can_advance_to(next) {
            return Err(CommonError::InvalidStateTransition {
                from: state.to_string(),
                to: next.to_string(),
            });
        }
        let prev = *state;
        *state = next;
        Ok(prev)
    }

    /// Run-start signal: clean artifact directory plus environment descriptor.
    pub fn on_run_start(&self) -> RunState {
        if let Err(e) = self.advance(RunState::Running) {
            warn!("Ignoring run-start signal: {}", e);
            return self.state();
        }

        self.store.reset();

        let env = self.config.environment_descriptor();
        match self.store.write_environment(&env) {
            Ok(path) => info!(
                "Run starting: environment={} browser={} ({})",
                env.environment_name,
                env.browser_name,
                path.display()
            ),
            Err(e) => warn!("Could not write environment descriptor: {}", e),
        }

        RunState::Running
    }

    /// Adopt a run whose start signal was handled by another process.
    ///
    /// Moves INIT to RUNNING without touching the artifact directory.
    pub fn resume(&self) -> RunState {
        match self.advance(RunState::Running) {
            Ok(_) => debug!("Resumed run in {}", self.store.dir().display()),
            Err(e) => warn!("Cannot resume run: {}", e),
        }
        self.state()
    }

    /// Run-finish signal: open and build reports, best-effort throughout.
    pub async fn on_run_finish(&self) -> FinishReport {
        match self.advance(RunState::Finalizing) {
            Ok(RunState::Init) => warn!("Run finished without a start signal"),
            Ok(_) => {}
            Err(e) => {
                warn!("Ignoring run-finish signal: {}", e);
                return FinishReport {
                    aggregated_viewer: None,
                    outcome: FinishOutcome::AlreadyFinished,
                };
            }
        }

        let aggregated_viewer = self.open_aggregated_report();
        let outcome = self.finalize_artifact_report().await;

        if let Err(e) = self.advance(RunState::Done) {
            warn!("{}", e);
        }

        FinishReport {
            aggregated_viewer,
            outcome,
        }
    }

    fn open_aggregated_report(&self) -> Option<ProcessHandle> {
        let html = self.config.aggregated_html();
        if !html.exists() {
            info!("No aggregated report at {}", html.display());
            return None;
        }
        self.launcher.open_file(&html)
    }

    async fn finalize_artifact_report(&self) -> FinishOutcome {
        let artifact_dir = self.store.dir();
        if !self.store.exists() {
            return FinishOutcome::NoArtifacts;
        }

        if !self.waiter.wait(artifact_dir).await {
            warn!("No result files detected in {}", artifact_dir.display());
            return FinishOutcome::ResultsTimedOut;
        }

        let output_dir = self.config.report_output_dir();
        let report = self.generator.generate(artifact_dir, &output_dir).await;
        if !report.is_ok() {
            return FinishOutcome::GenerationFailed { report };
        }

        let viewer = self.launcher.open_best_effort(&output_dir);
        FinishOutcome::Generated { report, viewer }
    }

    /// `auto_open` as handed to aggregated report generation
    pub fn aggregated_auto_open(&self) -> bool {
        self.config.effective_auto_open()
    }

    /// Render the aggregated report with the configured paths and auto-open flag.
    pub fn generate_aggregated_report(&self) -> ReportArtifact {
        self.generator.generate_aggregated_report(
            &self.config.structured_record(),
            &self.config.aggregated_html(),
            self.aggregated_auto_open(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_linear() {
        use RunState::*;
        assert!(Init.can_advance_to(Running));
        assert!(Running.can_advance_to(Finalizing));
        assert!(Finalizing.can_advance_to(Done));
        assert!(Init.can_advance_to(Finalizing));

        assert!(!Running.can_advance_to(Running));
        assert!(!Done.can_advance_to(Init));
        assert!(!Done.can_advance_to(Finalizing));
        assert!(!Finalizing.can_advance_to(Running));
    }
}
