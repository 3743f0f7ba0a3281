//! Environment variable secrets backend.
//!
//! A read-only backend for CI runners, where API tokens arrive as
//! environment variables.

use std::env;

use async_trait::async_trait;

use crate::error::SecretsError;
use crate::traits::SecretsBackend;
use crate::types::{SecretContext, SecretValue};

/// Default environment variable prefix.
pub(crate) const DEFAULT_PREFIX: &str = "MERIDIAN";

/// Environment variable secrets backend.
///
/// Secrets are read from variables named `{PREFIX}_{NAME}`, so with the
/// default prefix `PLATFORM_API_TOKEN` is read from
/// `MERIDIAN_PLATFORM_API_TOKEN`. Scopes are ignored.
#[derive(Debug, Clone)]
pub struct EnvSecrets {
    prefix: String,
}

impl Default for EnvSecrets {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvSecrets {
    /// Creates a backend with the default prefix.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Creates a backend with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn env_var_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[async_trait]
impl SecretsBackend for EnvSecrets {
    async fn get(
        &self,
        name: &str,
        _context: &SecretContext,
    ) -> Result<Option<SecretValue>, SecretsError> {
        let var_name = self.env_var_name(name);

        match env::var(&var_name) {
            Ok(value) => {
                tracing::debug!(
                    secret.name = name,
                    secret.env_var = %var_name,
                    secret.operation = "get",
                    "Secret read from environment"
                );
                Ok(Some(SecretValue::new(value)))
            }
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                tracing::warn!(
                    secret.name = name,
                    secret.env_var = %var_name,
                    "Environment variable contains invalid UTF-8"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn custom_prefix() {
        env::set_var("MERIDIAN_TEST_CUSTOM_TOKEN", "custom-key");

        let backend = EnvSecrets::with_prefix("MERIDIAN_TEST");
        let value = backend
            .get("CUSTOM_TOKEN", &SecretContext::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value.expose(), "custom-key");

        env::remove_var("MERIDIAN_TEST_CUSTOM_TOKEN");
    }

    #[tokio::test]
    async fn not_found() {
        let backend = EnvSecrets::new();
        let value = backend
            .get("DEFINITELY_NOT_SET_VAR_12345", &SecretContext::new())
            .await
            .unwrap();
        assert!(value.is_none());
    }
}
