//! Report commands

use clap::Subcommand;

use storefront_e2e::launcher::REPORT_ENTRY_POINT;
use storefront_e2e::RunLifecycleHooks;

use crate::output::{print_info, print_item, print_success, print_warning, OutputFormat};

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Build the report tree from the artifact directory
    Generate,

    /// Render the aggregated HTML report from the structured run record
    Aggregate {
        /// Never open the rendered report
        #[arg(long)]
        no_open: bool,
    },

    /// Open the most recent report
    Open,
}

pub async fn execute(
    cmd: ReportCommands,
    hooks: &RunLifecycleHooks,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = hooks.config();

    match cmd {
        ReportCommands::Generate => {
            let artifact = hooks
                .generator()
                .generate(hooks.store().dir(), &config.report_output_dir())
                .await;
            print_item(&artifact, format);
        }
        ReportCommands::Aggregate { no_open } => {
            let auto_open = !no_open && hooks.aggregated_auto_open();
            let artifact = hooks.generator().generate_aggregated_report(
                &config.structured_record(),
                &config.aggregated_html(),
                auto_open,
            );
            print_item(&artifact, format);
        }
        ReportCommands::Open => {
            let report_dir = config.report_output_dir();
            let aggregated = config.aggregated_html();

            let viewer = if report_dir.join(REPORT_ENTRY_POINT).exists() {
                hooks.launcher().open_best_effort(&report_dir)
            } else if aggregated.exists() {
                hooks.launcher().open_file(&aggregated)
            } else {
                print_info("No report found; run `storefront report generate` first");
                return Ok(());
            };

            match viewer {
                Some(handle) => print_success(&format!("Opened with {}", handle.command_line())),
                None => print_warning("No viewer could be launched"),
            }
        }
    }

    Ok(())
}
