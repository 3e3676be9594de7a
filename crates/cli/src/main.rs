//! Storefront CLI - Main Entry Point
//!
//! Drives a storefront E2E run: wraps the scenario runner with the lifecycle
//! hooks, captures evidence, and builds and opens reports.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use storefront_e2e::{HarnessConfig, RunLifecycleHooks};

mod commands;
mod output;

use commands::{artifacts, capture, env, report, run};

/// Storefront E2E - run orchestration and reporting
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root; relative paths in configuration resolve against it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Configuration file (defaults to storefront-e2e.toml under the root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario runner between the start and finish hooks
    Run(run::RunArgs),

    /// Signal run start
    Start,

    /// Signal run finish and build reports
    Finish,

    /// Persist a piece of evidence into the artifact directory
    Capture(capture::CaptureArgs),

    /// Wait for result files to appear
    Wait(artifacts::WaitArgs),

    /// Build and open reports
    #[command(subcommand)]
    Report(report::ReportCommands),

    /// Inspect the artifact directory
    #[command(subcommand)]
    Artifacts(artifacts::ArtifactCommands),

    /// Run environment
    #[command(subcommand)]
    Env(env::EnvCommands),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            println!("Storefront CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Runtime: {}", storefront_common::runtime_version());
        }
        command => {
            let config = HarnessConfig::load_or_default(&cli.root, cli.config.as_deref());
            let hooks = RunLifecycleHooks::new(config);
            dispatch(command, &hooks, cli.format).await?;
        }
    }

    Ok(())
}

async fn dispatch(
    command: Commands,
    hooks: &RunLifecycleHooks,
    format: output::OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => {
            let code = run::run(args, hooks, format).await?;
            std::process::exit(code);
        }
        Commands::Start => run::start(hooks, format)?,
        Commands::Finish => run::finish(hooks, format).await?,
        Commands::Capture(args) => capture::execute(args, hooks).await?,
        Commands::Wait(args) => artifacts::wait(args, hooks).await?,
        Commands::Report(cmd) => report::execute(cmd, hooks, format).await?,
        Commands::Artifacts(cmd) => artifacts::execute(cmd, hooks, format).await?,
        Commands::Env(cmd) => env::execute(cmd, hooks, format).await?,
        Commands::Version => {}
    }
    Ok(())
}
