//! Artifact directory inspection and readiness

use std::time::Duration;

use clap::{Args, Subcommand};
use serde::Serialize;

use storefront_common::{ArtifactKind, ENVIRONMENT_FILE};
use storefront_e2e::readiness::{is_result_file, wait_for_results};
use storefront_e2e::RunLifecycleHooks;

use crate::output::{print_list, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum ArtifactCommands {
    /// List files in the artifact directory
    List,
}

#[derive(Args)]
pub struct WaitArgs {
    /// Give up after this many milliseconds (defaults to configuration)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Poll interval in milliseconds (defaults to configuration)
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

#[derive(Serialize)]
struct ArtifactEntry {
    name: String,
    kind: ArtifactKind,
    size: u64,
}

impl TableDisplay for ArtifactEntry {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Kind", "Size"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.kind.to_string(), self.size.to_string()]
    }
}

fn kind_of(name: &str) -> ArtifactKind {
    if name == ENVIRONMENT_FILE {
        ArtifactKind::Environment
    } else if is_result_file(name) {
        ArtifactKind::Result
    } else {
        ArtifactKind::Attachment
    }
}

pub async fn execute(
    cmd: ArtifactCommands,
    hooks: &RunLifecycleHooks,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ArtifactCommands::List => {
            let store = hooks.store();
            let entries: Vec<ArtifactEntry> = store
                .list()
                .into_iter()
                .map(|name| ArtifactEntry {
                    size: std::fs::metadata(store.dir().join(&name))
                        .map(|m| m.len())
                        .unwrap_or(0),
                    kind: kind_of(&name),
                    name,
                })
                .collect();
            print_list(&entries, format);
        }
    }
    Ok(())
}

/// Block until a result file appears or the timeout passes.
pub async fn wait(args: WaitArgs, hooks: &RunLifecycleHooks) -> anyhow::Result<()> {
    let config = hooks.config();
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.readiness_timeout());
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.poll_interval());

    if wait_for_results(hooks.store().dir(), timeout, interval).await {
        print_success("Result files present");
    } else {
        print_warning(&format!("No result files after {:?}", timeout));
    }
    Ok(())
}
