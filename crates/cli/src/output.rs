//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use storefront_common::{EnvironmentDescriptor, ProcessHandle, ReportArtifact};
use storefront_e2e::{FinishOutcome, FinishReport};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            table.add_row(item.row());
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
        }
        OutputFormat::Plain => {
            let row = item.row();
            for (header, value) in T::headers().iter().zip(row.iter()) {
                println!("{}: {}", header, value);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            _ => println!("No items found."),
        }
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "Warning:".yellow().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".cyan(), message);
}

fn viewer_cell(viewer: &Option<ProcessHandle>) -> String {
    viewer
        .as_ref()
        .map(ProcessHandle::command_line)
        .unwrap_or_else(|| "-".to_string())
}

impl TableDisplay for ReportArtifact {
    fn headers() -> Vec<&'static str> {
        vec!["Format", "Status", "Source", "Output", "Generated"]
    }

    fn row(&self) -> Vec<String> {
        let format = serde_json::to_value(self.format)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        vec![
            format,
            self.status.to_string(),
            self.source_dir.display().to_string(),
            self.output_dir.display().to_string(),
            self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

impl TableDisplay for EnvironmentDescriptor {
    fn headers() -> Vec<&'static str> {
        vec!["Environment", "Browser", "Base URL", "Platform", "Runtime"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.environment_name.clone(),
            self.browser_name.clone(),
            self.base_url.clone(),
            self.platform.clone(),
            self.runtime_version.clone(),
        ]
    }
}

impl TableDisplay for FinishReport {
    fn headers() -> Vec<&'static str> {
        vec!["Outcome", "Report", "Report Viewer", "Aggregated Viewer"]
    }

    fn row(&self) -> Vec<String> {
        let (outcome, report, viewer) = match &self.outcome {
            FinishOutcome::NoArtifacts => ("no artifacts", "-".to_string(), "-".to_string()),
            FinishOutcome::ResultsTimedOut => {
                ("results timed out", "-".to_string(), "-".to_string())
            }
            FinishOutcome::Generated { report, viewer } => (
                "generated",
                report.output_dir.display().to_string(),
                viewer_cell(viewer),
            ),
            FinishOutcome::GenerationFailed { report } => (
                "generation failed",
                report.output_dir.display().to_string(),
                "-".to_string(),
            ),
            FinishOutcome::AlreadyFinished => {
                ("already finished", "-".to_string(), "-".to_string())
            }
        };
        vec![
            outcome.to_string(),
            report,
            viewer,
            viewer_cell(&self.aggregated_viewer),
        ]
    }
}
