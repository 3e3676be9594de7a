//! Report generation
//!
//! Two report flavours come out of a run:
//! - the browsable tree built by the external report tool from the artifact
//!   directory (`generate`)
//! - a single aggregated HTML page rendered from the structured run record
//!   (`generate_aggregated_report`)
//!
//! Neither ever returns an error: failures are logged and reported through
//! [`ReportStatus`].

pub mod html;
pub mod record;

use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use storefront_common::{
    EnvironmentDescriptor, ReportArtifact, ReportFormat, ReportStatus, ENVIRONMENT_FILE,
};

use crate::artifact::read_environment_file;
use crate::config::{HarnessConfig, ReportToolConfig};
use crate::error::{E2eError, E2eResult};
use crate::launcher::ProcessLauncher;

pub use html::ReportMetadata;
pub use record::{RecordSummary, RunRecord};

/// Version label shown in the aggregated report metadata
pub const APP_VERSION: &str = "1.0.0";

/// Builds both report flavours
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    tool: ReportToolConfig,
    launcher: ProcessLauncher,
    environment_file: PathBuf,
    fallback_environment: EnvironmentDescriptor,
    execution_context: &'static str,
}

impl ReportGenerator {
    pub fn from_config(config: &HarnessConfig, launcher: ProcessLauncher) -> Self {
        Self {
            tool: config.report_tool.clone(),
            launcher,
            environment_file: config.artifact_dir().join(ENVIRONMENT_FILE),
            fallback_environment: config.environment_descriptor(),
            execution_context: config.execution_context(),
        }
    }

    /// Run the report tool over `input_dir`, writing into `output_dir`.
    ///
    /// Waits for the tool to exit. A missing input directory is `Skipped`;
    /// spawn failure or a non-zero exit is `Failed`.
    pub async fn generate(&self, input_dir: &Path, output_dir: &Path) -> ReportArtifact {
        let format = ReportFormat::StructuredRecordReport;

        if !input_dir.is_dir() {
            info!("No artifact directory at {}, skipping report", input_dir.display());
            return ReportArtifact::new(input_dir, output_dir, format, ReportStatus::Skipped);
        }

        let status = match self.run_tool(input_dir, output_dir).await {
            Ok(()) => {
                info!("Report generated at {}", output_dir.display());
                ReportStatus::Ok
            }
            Err(e) => {
                warn!("Report generation failed (this is non-fatal): {}", e);
                ReportStatus::Failed
            }
        };

        ReportArtifact::new(input_dir, output_dir, format, status)
    }

    async fn run_tool(&self, input_dir: &Path, output_dir: &Path) -> E2eResult<()> {
        let mut cmd = Command::new(&self.tool.program);
        cmd.args(&self.tool.args)
            .arg("generate")
            .arg(input_dir)
            .arg("-o")
            .arg(output_dir)
            .arg("--clean")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Running report tool: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| E2eError::Spawn {
            command: self.tool.program.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(E2eError::ReportTool(format!(
                "exited with {}\nstdout: {}\nstderr: {}",
                output.status,
                stdout.trim(),
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Metadata block for the aggregated report.
    ///
    /// Environment and browser come from the environment descriptor written at
    /// run start when one exists, otherwise from configuration.
    pub fn metadata(&self) -> ReportMetadata {
        let env = read_environment_file(&self.environment_file)
            .unwrap_or_else(|| self.fallback_environment.clone());

        ReportMetadata {
            app_version: APP_VERSION.to_string(),
            test_environment: env.environment_name.to_uppercase(),
            browser: env.browser_name,
            platform: std::env::consts::OS.to_string(),
            parallel: "Scenarios".to_string(),
            executed: self.execution_context.to_string(),
        }
    }

    /// Render the aggregated HTML report from the structured run record.
    ///
    /// Safe to call repeatedly; the output file is replaced each time. When
    /// `auto_open` is set the finished report is opened in a browser.
    pub fn generate_aggregated_report(
        &self,
        record_file: &Path,
        output_html: &Path,
        auto_open: bool,
    ) -> ReportArtifact {
        let format = ReportFormat::AggregatedHtmlReport;

        if !record_file.exists() {
            info!(
                "No structured run record at {}, skipping aggregated report",
                record_file.display()
            );
            return ReportArtifact::new(record_file, output_html, format, ReportStatus::Skipped);
        }

        match self.write_aggregated(record_file, output_html) {
            Ok(summary) => {
                info!(
                    "Aggregated report written to {} ({} scenarios, {} failed)",
                    output_html.display(),
                    summary.scenarios,
                    summary.scenarios_failed
                );
                if auto_open {
                    self.launcher.open_file(output_html);
                }
                ReportArtifact::new(record_file, output_html, format, ReportStatus::Ok)
            }
            Err(e) => {
                warn!("Failed to generate aggregated HTML report: {}", e);
                ReportArtifact::new(record_file, output_html, format, ReportStatus::Failed)
            }
        }
    }

    fn write_aggregated(&self, record_file: &Path, output_html: &Path) -> E2eResult<RecordSummary> {
        let record = RunRecord::load(record_file)?;
        let page = html::render(&record, &self.metadata(), Utc::now());

        let dir = match output_html.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(page.as_bytes())?;
        tmp.persist(output_html).map_err(|e| E2eError::Io(e.error))?;

        Ok(record.summary())
    }
}
