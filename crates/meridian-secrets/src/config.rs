//! Configuration types for secrets backends.

use serde::{Deserialize, Serialize};

use crate::types::SecretContext;

/// Configuration for secret retrieval.
///
/// ```toml
/// [secrets]
/// backend = "env"
/// prefix = "MERIDIAN"
/// team = "team-a"
///
/// [secrets.rate_limit]
/// requests_per_second = 5
/// burst_size = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// The backend secrets are read from.
    #[serde(default)]
    pub backend: SecretsBackendKind,

    /// Environment variable prefix for the `env` backend.
    #[serde(default = "default_env_prefix")]
    pub prefix: String,

    /// Team used for scope resolution.
    #[serde(default)]
    pub team: Option<String>,

    /// Environment used for scope resolution.
    #[serde(default)]
    pub environment: Option<String>,

    /// Budget for lookups against the backend. Unlimited when absent.
    #[serde(default)]
    pub rate_limit: Option<SecretsRateLimit>,
}

impl SecretsConfig {
    /// Creates a resolution context from the configuration.
    pub fn to_context(&self) -> SecretContext {
        let mut ctx = SecretContext::new();
        if let Some(team) = &self.team {
            ctx = ctx.with_team(team);
        }
        if let Some(environment) = &self.environment {
            ctx = ctx.with_environment(environment);
        }
        ctx
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            backend: SecretsBackendKind::default(),
            prefix: default_env_prefix(),
            team: None,
            environment: None,
            rate_limit: None,
        }
    }
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretsBackendKind {
    /// Environment variable backend.
    #[default]
    Env,
}

/// Token-bucket budget shared by every getter of one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretsRateLimit {
    /// Sustained lookups per second.
    pub requests_per_second: u32,
    /// Lookups allowed back to back before throttling starts.
    pub burst_size: u32,
}

fn default_env_prefix() -> String {
    "MERIDIAN".to_owned()
}
