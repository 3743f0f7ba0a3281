//! Implementation of the `meridian status` command.

use std::path::Path;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

/// Arguments for the status command.
#[derive(clap::Args)]
pub struct StatusArgs {
    /// Application status URL, absolute or relative to the GitOps API
    #[arg(short, long)]
    pub url: String,
}

pub async fn run(
    config_path: Option<&Path>,
    args: StatusArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let orchestrator = super::orchestrator(config)?;

    orchestrator
        .await_healthy(&args.url, cancel)
        .await
        .with_context(|| format!("{} did not become healthy", args.url))?;

    println!("healthy");
    Ok(())
}
