//! Evidence capture from outside the scenario process

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tokio::io::AsyncReadExt;

use storefront_common::ArtifactDescriptor;
use storefront_e2e::RunLifecycleHooks;

use crate::output::{print_success, print_warning};

#[derive(Args)]
pub struct CaptureArgs {
    /// Media type of the evidence
    #[arg(long, default_value = "application/json")]
    pub media_type: String,

    /// Read the payload from a file instead of stdin
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub async fn execute(args: CaptureArgs, hooks: &RunLifecycleHooks) -> anyhow::Result<()> {
    let payload = match &args.file {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let descriptor = ArtifactDescriptor::attachment(payload, &args.media_type);
    match hooks.store().capture(&descriptor) {
        Ok(path) => print_success(&format!("Captured {}", path.display())),
        Err(e) => print_warning(&format!("Evidence not captured: {}", e)),
    }
    Ok(())
}
