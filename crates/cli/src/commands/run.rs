//! Run lifecycle commands
//!
//! `run` wraps a scenario runner between the start and finish hooks. `start`
//! and `finish` expose the same hooks separately for runners that are driven
//! by some other tool.

use std::process::ExitStatus;

use clap::Args;
use tokio::process::Command;
use tracing::{debug, info};

use storefront_common::ReportStatus;
use storefront_e2e::RunLifecycleHooks;

use crate::output::{print_error, print_item, print_warning, OutputFormat};

/// Exit code when the runner itself cannot be started
const SPAWN_FAILURE_EXIT: i32 = 127;

#[derive(Args)]
pub struct RunArgs {
    /// Skip rendering the aggregated report from the structured run record
    #[arg(long)]
    pub no_aggregate: bool,

    /// Scenario runner command line, given after `--`
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Run the scenario runner between the lifecycle hooks.
///
/// Returns the runner's exit code; nothing the hooks do can change it.
pub async fn run(
    args: RunArgs,
    hooks: &RunLifecycleHooks,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    hooks.on_run_start();

    let code = run_scenarios(&args.command, hooks).await;

    if !args.no_aggregate {
        // Opened by the finish hook, so no auto-open here.
        let config = hooks.config();
        let artifact = hooks.generator().generate_aggregated_report(
            &config.structured_record(),
            &config.aggregated_html(),
            false,
        );
        debug!("Aggregated report: {}", artifact.status);
        if artifact.status == ReportStatus::Failed {
            print_warning("Aggregated report could not be rendered");
        }
    }

    let report = hooks.on_run_finish().await;
    print_item(&report, format);

    Ok(code)
}

async fn run_scenarios(command: &[String], hooks: &RunLifecycleHooks) -> i32 {
    let Some((program, args)) = command.split_first() else {
        print_error("No runner command given");
        return SPAWN_FAILURE_EXIT;
    };

    info!("Running scenarios: {}", command.join(" "));

    match Command::new(program)
        .args(args)
        .current_dir(&hooks.config().root)
        .status()
        .await
    {
        Ok(status) => {
            let code = exit_code(status);
            info!("Runner exited with code {}", code);
            code
        }
        Err(e) => {
            print_error(&format!("Failed to start '{}': {}", program, e));
            SPAWN_FAILURE_EXIT
        }
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Signal run start: reset artifacts and record the environment.
pub fn start(hooks: &RunLifecycleHooks, format: OutputFormat) -> anyhow::Result<()> {
    hooks.on_run_start();
    let env = hooks
        .store()
        .read_environment()
        .unwrap_or_else(|| hooks.config().environment_descriptor());
    print_item(&env, format);
    Ok(())
}

/// Signal run finish for a run started by an earlier `start`.
pub async fn finish(hooks: &RunLifecycleHooks, format: OutputFormat) -> anyhow::Result<()> {
    hooks.resume();
    let report = hooks.on_run_finish().await;
    print_item(&report, format);
    Ok(())
}
