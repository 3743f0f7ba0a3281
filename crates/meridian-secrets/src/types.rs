//! Core types for secret retrieval.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Scope at which a secret is stored.
///
/// Secrets are resolved from most specific (Environment) to least specific
/// (Global), so a team can override a platform-wide token for one
/// environment only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SecretScope {
    /// Available to every team and environment.
    Global,

    /// Available to every environment of one team.
    Team {
        /// The team identifier.
        team: String,
    },

    /// Specific to a team and environment.
    Environment {
        /// The team identifier.
        team: String,
        /// The environment name (`prod` or `nonprod`).
        environment: String,
    },
}

impl SecretScope {
    /// Creates a global scope.
    #[must_use]
    pub const fn global() -> Self {
        Self::Global
    }

    /// Creates a team scope.
    #[must_use]
    pub fn team(team: impl Into<String>) -> Self {
        Self::Team { team: team.into() }
    }

    /// Creates an environment scope.
    #[must_use]
    pub fn environment(team: impl Into<String>, environment: impl Into<String>) -> Self {
        Self::Environment {
            team: team.into(),
            environment: environment.into(),
        }
    }

    /// Returns a string key for storage.
    #[must_use]
    pub fn to_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SecretScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Team { team } => write!(f, "team:{team}"),
            Self::Environment { team, environment } => write!(f, "env:{team}:{environment}"),
        }
    }
}

/// A secret value with automatic memory zeroisation.
///
/// `Debug` never prints the value, so a token can sit inside structs that
/// are logged with `?` without leaking.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue {
    #[zeroize(skip)]
    inner: SecretString,
}

impl SecretValue {
    /// Creates a new secret value from a string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: SecretString::from(value.into()),
        }
    }

    /// Exposes the secret value for use.
    ///
    /// The returned reference must not be logged or stored.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Returns the length of the secret value in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Returns true if the secret value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SecretValue {
    /// Constant-time comparison.
    fn eq(&self, other: &Self) -> bool {
        let self_bytes = self.inner.expose_secret().as_bytes();
        let other_bytes = other.inner.expose_secret().as_bytes();

        if self_bytes.len() != other_bytes.len() {
            return false;
        }

        self_bytes.ct_eq(other_bytes).into()
    }
}

impl Eq for SecretValue {}

/// Context for resolving secrets across scopes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretContext {
    /// The team the secret is resolved for, if any.
    pub team: Option<String>,

    /// The target environment, if any.
    pub environment: Option<String>,
}

impl SecretContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the team for this context.
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Sets the environment for this context.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Returns the scopes to search in resolution order (most specific first).
    #[must_use]
    pub fn resolution_order(&self) -> Vec<SecretScope> {
        let mut scopes = Vec::with_capacity(3);

        if let (Some(team), Some(environment)) = (&self.team, &self.environment) {
            scopes.push(SecretScope::environment(team, environment));
        }

        if let Some(team) = &self.team {
            scopes.push(SecretScope::team(team));
        }

        scopes.push(SecretScope::global());
        scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_scope_to_key() {
        assert_eq!(SecretScope::global().to_key(), "global");
        assert_eq!(SecretScope::team("team-a").to_key(), "team:team-a");
        assert_eq!(
            SecretScope::environment("team-a", "prod").to_key(),
            "env:team-a:prod"
        );
    }

    #[test]
    fn secret_value_redacted_debug() {
        let value = SecretValue::new("super-secret");
        let debug = format!("{value:?}");
        assert_eq!(debug, "[REDACTED]");
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn secret_value_compares_by_content() {
        assert_eq!(SecretValue::new("token-1234"), SecretValue::new("token-1234"));
        assert_ne!(SecretValue::new("token-1234"), SecretValue::new("token-9999"));
        assert_ne!(SecretValue::new("token"), SecretValue::new("token-1234"));
        assert!(SecretValue::new("").is_empty());
    }

    #[test]
    fn secret_context_resolution_order() {
        let ctx = SecretContext::new()
            .with_team("team-a")
            .with_environment("nonprod");

        let scopes = ctx.resolution_order();
        assert_eq!(
            scopes,
            vec![
                SecretScope::environment("team-a", "nonprod"),
                SecretScope::team("team-a"),
                SecretScope::global(),
            ]
        );
    }

    #[test]
    fn environment_without_team_is_ignored() {
        let ctx = SecretContext::new().with_environment("prod");
        assert_eq!(ctx.resolution_order(), vec![SecretScope::global()]);
    }
}
