//! Environment descriptor commands

use clap::Subcommand;

use storefront_e2e::RunLifecycleHooks;

use crate::output::{print_info, print_item, OutputFormat};

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Show the run environment
    ///
    /// Reads the descriptor recorded in the artifact directory, or resolves
    /// one from configuration when no run has started.
    Show,
}

pub async fn execute(
    cmd: EnvCommands,
    hooks: &RunLifecycleHooks,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        EnvCommands::Show => match hooks.store().read_environment() {
            Some(env) => print_item(&env, format),
            None => {
                if !matches!(format, OutputFormat::Json) {
                    print_info("No recorded environment; showing configuration");
                }
                print_item(&hooks.config().environment_descriptor(), format);
            }
        },
    }
    Ok(())
}
