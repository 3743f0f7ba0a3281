//! Configuration for meridian-control.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use meridian_secrets::SecretsConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::remote::PollPolicy;
use crate::types::{Environment, UnitKind};

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "MERIDIAN_";

/// Default configuration file name.
const DEFAULT_FILE: &str = "meridian.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Platform API (provisioning, manifests, sync, builds).
    #[serde(default = "ApiConfig::platform")]
    pub platform_api: ApiConfig,

    /// GitOps controller API (application status).
    #[serde(default = "ApiConfig::gitops")]
    pub gitops_api: ApiConfig,

    /// Bounded poll used for build and health waits.
    #[serde(default)]
    pub poll: PollConfig,

    /// Sync retry budget.
    #[serde(default = "PollConfig::sync")]
    pub sync: PollConfig,

    /// Values identifying where units land.
    #[serde(default)]
    pub target: TargetConfig,

    /// Pinned chart versions.
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Credential source.
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Permission allow-lists.
    #[serde(default)]
    pub authz: AuthzConfig,
}

impl ControlConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `meridian.toml` in the current directory (if present)
    /// 3. Environment variables with `MERIDIAN_` prefix, nested with `__`
    pub fn load() -> ControlResult<Self> {
        Self::figment(Toml::file(DEFAULT_FILE))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ControlResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ControlError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::figment(Toml::file(path))
    }

    fn figment(file: figment::providers::Data<Toml>) -> ControlResult<Self> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ControlError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every run fail or hang.
    pub fn validate(&self) -> ControlResult<()> {
        for (section, api) in [
            ("platform_api", &self.platform_api),
            ("gitops_api", &self.gitops_api),
        ] {
            if api.base_url.trim().is_empty() {
                return Err(ControlError::Config(format!("{section}.base_url is empty")));
            }
            if api.max_attempts == 0 {
                return Err(ControlError::Config(format!(
                    "{section}.max_attempts must be at least 1"
                )));
            }
        }

        for (section, poll) in [("poll", &self.poll), ("sync", &self.sync)] {
            if poll.max_attempts == 0 || poll.interval_secs == 0 {
                return Err(ControlError::Config(format!(
                    "{section} needs a non-zero max_attempts and interval_secs"
                )));
            }
        }

        if self.target.platform.is_empty() {
            return Err(ControlError::Config("target.platform is empty".to_owned()));
        }

        Ok(())
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            platform_api: ApiConfig::platform(),
            gitops_api: ApiConfig::gitops(),
            poll: PollConfig::default(),
            sync: PollConfig::sync(),
            target: TargetConfig::default(),
            charts: ChartsConfig::default(),
            secrets: SecretsConfig::default(),
            authz: AuthzConfig::default(),
        }
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are joined onto it.
    pub base_url: String,

    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts when a request hits a read timeout.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Name of the secret holding the API token.
    pub secret_name: String,
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_attempts() -> u32 {
    3
}

impl ApiConfig {
    /// Defaults for the platform API.
    #[must_use]
    pub fn platform() -> Self {
        Self {
            base_url: "https://jetstreamapi.apps.stratos.prci.com/api/v1/stratos".to_owned(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            secret_name: "PLATFORM_API_TOKEN".to_owned(),
        }
    }

    /// Defaults for the GitOps controller API.
    #[must_use]
    pub fn gitops() -> Self {
        Self {
            base_url: "https://argocd.mgmt.stratos.prci.com/api/v1".to_owned(),
            timeout_secs: 15,
            max_attempts: default_max_attempts(),
            secret_name: "GITOPS_API_TOKEN".to_owned(),
        }
    }

    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::platform()
    }
}

/// Attempt budget with a fixed wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum attempts.
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,

    /// Seconds between attempts.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

const fn default_poll_attempts() -> u32 {
    30
}

const fn default_interval_secs() -> u64 {
    60
}

impl PollConfig {
    /// Defaults for the sync retry loop: 12 attempts, one minute apart.
    #[must_use]
    pub const fn sync() -> Self {
        Self {
            max_attempts: 12,
            interval_secs: default_interval_secs(),
        }
    }

    /// Convert into a poll policy.
    #[must_use]
    pub const fn policy(&self) -> PollPolicy {
        PollPolicy::new(self.max_attempts, Duration::from_secs(self.interval_secs))
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_poll_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

/// Values that identify where units land on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Platform name.
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Cluster type units are deployed to.
    #[serde(default = "default_cluster_type")]
    pub cluster_type: String,

    /// Cloud account that owns created namespaces.
    #[serde(default = "default_account_id")]
    pub account_id: String,

    /// Container registry host used in image paths.
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Cluster types an application owner may deploy to.
    #[serde(default = "default_allowed_cluster_types")]
    pub allowed_cluster_types: Vec<String>,

    /// Pipeline ingress host. `{environment}` is substituted.
    #[serde(default = "default_ingress_host")]
    pub ingress_host: String,
}

fn default_platform() -> String {
    "eds".to_owned()
}

fn default_cluster_type() -> String {
    "blacklodge".to_owned()
}

fn default_account_id() -> String {
    "111111".to_owned()
}

fn default_registry() -> String {
    "artifactory.example.com".to_owned()
}

fn default_allowed_cluster_types() -> Vec<String> {
    vec![default_cluster_type()]
}

fn default_ingress_host() -> String {
    "pipelines-{environment}.apps.example.com".to_owned()
}

impl TargetConfig {
    /// Ingress host for an environment.
    #[must_use]
    pub fn ingress_host(&self, environment: Environment) -> String {
        self.ingress_host.replace("{environment}", environment.as_str())
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            cluster_type: default_cluster_type(),
            account_id: default_account_id(),
            registry: default_registry(),
            allowed_cluster_types: default_allowed_cluster_types(),
            ingress_host: default_ingress_host(),
        }
    }
}

/// A chart pinned by name and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPin {
    /// Chart name in the repository.
    pub name: String,
    /// Chart version.
    pub version: String,
}

impl ChartPin {
    fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: version.to_owned(),
        }
    }
}

/// Chart repository and per-kind pins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Helm repository URL.
    #[serde(default = "default_chart_repository")]
    pub repository: String,

    /// Chart for pipeline units.
    #[serde(default = "default_pipeline_chart")]
    pub pipeline: ChartPin,

    /// Chart for alias units.
    #[serde(default = "default_alias_chart")]
    pub alias: ChartPin,

    /// Chart for namespace units.
    #[serde(default = "default_namespace_chart")]
    pub namespace: ChartPin,
}

fn default_chart_repository() -> String {
    "https://charts.example.com/helm".to_owned()
}

fn default_pipeline_chart() -> ChartPin {
    ChartPin::new("pipeline", "0.3.25")
}

fn default_alias_chart() -> ChartPin {
    ChartPin::new("alias", "0.2.8")
}

fn default_namespace_chart() -> ChartPin {
    ChartPin::new("namespace", "0.1.1")
}

impl ChartsConfig {
    /// The pinned chart for a unit kind.
    #[must_use]
    pub const fn pin(&self, kind: UnitKind) -> &ChartPin {
        match kind {
            UnitKind::Pipeline => &self.pipeline,
            UnitKind::Alias => &self.alias,
            UnitKind::Namespace => &self.namespace,
        }
    }
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            repository: default_chart_repository(),
            pipeline: default_pipeline_chart(),
            alias: default_alias_chart(),
            namespace: default_namespace_chart(),
        }
    }
}

/// Allow-lists for the permission gate. Empty lists allow everyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthzConfig {
    /// Teams allowed to deploy.
    #[serde(default)]
    pub allowed_teams: Vec<String>,

    /// Users allowed to deploy.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}
