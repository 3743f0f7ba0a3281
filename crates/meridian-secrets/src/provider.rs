//! Provider factory for secrets backends.

use std::sync::Arc;

use governor::DefaultDirectRateLimiter;

use crate::config::{SecretsBackendKind, SecretsConfig};
use crate::error::SecretsError;
use crate::getter::{lookup_budget, BackendSecretGetter};
use crate::traits::SecretsBackend;
use crate::types::SecretContext;

#[cfg(feature = "env")]
use crate::env::EnvSecrets;

/// Provider for secrets backends.
///
/// Builds a backend from configuration and hands out one getter per
/// credential, all sharing the backend, resolution context and lookup
/// budget.
#[derive(Clone, Default)]
#[must_use]
pub struct SecretsProvider {
    backend: Option<Arc<dyn SecretsBackend>>,
    context: SecretContext,
    budget: Option<Arc<DefaultDirectRateLimiter>>,
}

impl SecretsProvider {
    /// Creates a new empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider from configuration.
    pub fn from_config(config: &SecretsConfig) -> Result<Self, SecretsError> {
        let backend = Self::create_backend(config)?;
        let budget = config
            .rate_limit
            .map(|limit| lookup_budget(limit.requests_per_second, limit.burst_size))
            .transpose()?;

        Ok(Self {
            backend: Some(backend),
            context: config.to_context(),
            budget,
        })
    }

    /// Sets the backend for this provider.
    pub fn with_backend(mut self, backend: Arc<dyn SecretsBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the context for this provider.
    pub fn with_context(mut self, context: SecretContext) -> Self {
        self.context = context;
        self
    }

    /// Returns the configured backend.
    pub fn backend(&self) -> Result<Arc<dyn SecretsBackend>, SecretsError> {
        self.backend.clone().ok_or(SecretsError::NotConfigured)
    }

    /// Returns the configured context.
    pub const fn context(&self) -> &SecretContext {
        &self.context
    }

    /// Returns a getter that resolves `name` on every call.
    pub fn getter(&self, name: impl Into<String>) -> Result<BackendSecretGetter, SecretsError> {
        let getter = BackendSecretGetter::new(self.backend()?, name, self.context.clone());
        Ok(match &self.budget {
            Some(budget) => getter.with_budget(Arc::clone(budget)),
            None => getter,
        })
    }

    fn create_backend(config: &SecretsConfig) -> Result<Arc<dyn SecretsBackend>, SecretsError> {
        match config.backend {
            #[cfg(feature = "env")]
            SecretsBackendKind::Env => Ok(Arc::new(EnvSecrets::with_prefix(&config.prefix))),

            #[allow(unreachable_patterns)]
            other => Err(SecretsError::UnsupportedBackend(format!(
                "{other:?} backend not enabled in this build"
            ))),
        }
    }
}

impl std::fmt::Debug for SecretsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsProvider")
            .field("backend", &self.backend.is_some())
            .field("context", &self.context)
            .field("budgeted", &self.budget.is_some())
            .finish()
    }
}
