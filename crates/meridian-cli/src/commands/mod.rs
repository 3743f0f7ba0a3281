//! Subcommand implementations and the wiring they share.

pub mod build;
pub mod deploy;
pub mod render;
pub mod status;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use meridian_control::{
    AllowListChecker, ControlConfig, Environment, Orchestrator, PlatformClient,
    ReqwestTransport, TokioClock,
};
use meridian_control::unit::{PipelineDefinition, Team, UnitSet};
use meridian_secrets::SecretsProvider;

/// Load configuration from `path`, or from the default file and environment.
pub fn load_config(path: Option<&Path>) -> Result<ControlConfig> {
    let config = match path {
        Some(path) => ControlConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ControlConfig::load().context("failed to load configuration")?,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Build an authenticated platform client.
pub fn platform_client(config: &ControlConfig) -> Result<PlatformClient> {
    let secrets =
        SecretsProvider::from_config(&config.secrets).context("failed to set up secrets")?;
    let platform_token = secrets
        .getter(config.platform_api.secret_name.as_str())
        .context("platform API token unavailable")?;
    let gitops_token = secrets
        .getter(config.gitops_api.secret_name.as_str())
        .context("GitOps API token unavailable")?;
    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;

    Ok(PlatformClient::from_config(
        config,
        Arc::new(transport),
        Arc::new(platform_token),
        Arc::new(gitops_token),
    ))
}

/// Wire an orchestrator for real use.
pub fn orchestrator(config: ControlConfig) -> Result<Orchestrator> {
    let client = platform_client(&config)?;
    let permissions = AllowListChecker::from_config(&config.authz);
    Ok(Orchestrator::new(
        Arc::new(client),
        config,
        Arc::new(TokioClock::new()),
        Arc::new(permissions),
    ))
}

/// Team and target arguments shared by `deploy` and `render`.
#[derive(clap::Args)]
pub struct TargetArgs {
    /// Pipeline definition file
    #[arg(short, long)]
    pub definition: std::path::PathBuf,

    /// Team name (also the GitOps project)
    #[arg(short, long)]
    pub team: String,

    /// Kubernetes namespace of the team
    #[arg(short, long)]
    pub namespace: String,

    /// Target environment: prod or nonprod
    #[arg(short, long)]
    pub environment: Environment,

    /// Contact recorded on application-owner records (defaults to the team)
    #[arg(long)]
    pub contact: Option<String>,
}

impl TargetArgs {
    /// Parse the definition file.
    pub fn definition(&self) -> Result<PipelineDefinition> {
        PipelineDefinition::from_file(&self.definition)
            .with_context(|| format!("failed to read {}", self.definition.display()))
    }

    /// The team these arguments describe.
    pub fn team(&self) -> Team {
        let team = Team::new(&self.team, &self.namespace);
        match &self.contact {
            Some(contact) => team.with_contact(contact),
            None => team,
        }
    }

    /// Resolve units without touching the network.
    pub fn units(&self, config: &ControlConfig) -> Result<UnitSet> {
        Ok(UnitSet::resolve(
            &self.definition()?,
            self.team(),
            self.environment,
            config,
        ))
    }
}
