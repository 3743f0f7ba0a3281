//! Implementation of the `meridian deploy` command.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use meridian_control::{DeployScope, DeploymentRequest, DeploymentSummary};
use tokio_util::sync::CancellationToken;

use super::TargetArgs;

/// Arguments for the deploy command.
#[derive(clap::Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// User requesting the deployment
    #[arg(short, long, env = "USER", default_value = "unknown")]
    pub user: String,

    /// Deploy only one kind of unit
    #[arg(long, value_enum)]
    pub only: Option<Only>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Unit selection for `--only`.
#[derive(Clone, Copy, ValueEnum)]
pub enum Only {
    Pipeline,
    Aliases,
    Namespace,
}

fn scope(only: Option<Only>) -> DeployScope {
    match only {
        None => DeployScope::All,
        Some(Only::Pipeline) => DeployScope::Pipeline,
        Some(Only::Aliases) => DeployScope::Aliases,
        Some(Only::Namespace) => DeployScope::Namespace,
    }
}

pub async fn run(
    config_path: Option<&Path>,
    args: DeployArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let request = DeploymentRequest {
        definition: args.target.definition()?,
        team: args.target.team(),
        environment: args.target.environment,
        user: args.user,
        scope: scope(args.only),
    };

    let orchestrator = super::orchestrator(config)?;
    let summary = orchestrator
        .deploy_all(request, cancel)
        .await
        .context("deployment run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    let failed = summary.failures().count();
    if failed > 0 {
        bail!("{failed} of {} units failed", summary.units.len());
    }
    Ok(())
}

fn print_summary(summary: &DeploymentSummary) {
    println!("Run {}", summary.run_id);
    for unit in &summary.units {
        print!(
            "  {:<10} {:<32} {}",
            unit.kind.as_str(),
            unit.application_name,
            unit.state.as_str()
        );
        if let Some(error) = &unit.error {
            print!("  ({error})");
        }
        println!();
        if let Some(warning) = &unit.namespace_error {
            println!("  {:<10} {:<32} namespace create failed: {warning}", "", "");
        }
    }
}
