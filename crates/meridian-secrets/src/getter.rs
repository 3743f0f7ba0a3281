//! Single-credential getters built on a backend.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::error::SecretsError;
use crate::traits::{SecretGetter, SecretsBackend};
use crate::types::{SecretContext, SecretValue};

/// Build a shared lookup budget.
///
/// Both limits must be non-zero.
pub fn lookup_budget(
    requests_per_second: u32,
    burst_size: u32,
) -> Result<Arc<DefaultDirectRateLimiter>, SecretsError> {
    let rate = NonZeroU32::new(requests_per_second).ok_or_else(|| {
        SecretsError::Configuration("rate_limit.requests_per_second must be non-zero".to_owned())
    })?;
    let burst = NonZeroU32::new(burst_size).ok_or_else(|| {
        SecretsError::Configuration("rate_limit.burst_size must be non-zero".to_owned())
    })?;

    Ok(Arc::new(RateLimiter::direct(
        Quota::per_second(rate).allow_burst(burst),
    )))
}

/// Resolves one named secret from a backend on every call.
#[derive(Clone)]
pub struct BackendSecretGetter {
    backend: Arc<dyn SecretsBackend>,
    name: String,
    context: SecretContext,
    budget: Option<Arc<DefaultDirectRateLimiter>>,
}

impl BackendSecretGetter {
    /// Creates a getter for `name`, resolved with `context`.
    pub fn new(
        backend: Arc<dyn SecretsBackend>,
        name: impl Into<String>,
        context: SecretContext,
    ) -> Self {
        Self {
            backend,
            name: name.into(),
            context,
            budget: None,
        }
    }

    /// Waits on `budget` before every backend lookup.
    #[must_use]
    pub fn with_budget(mut self, budget: Arc<DefaultDirectRateLimiter>) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Returns the secret name this getter resolves.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl SecretGetter for BackendSecretGetter {
    async fn get_secret(&self) -> Result<SecretValue, SecretsError> {
        if let Some(budget) = &self.budget {
            budget.until_ready().await;
        }

        let value = self
            .backend
            .get(&self.name, &self.context)
            .await?
            .ok_or_else(|| SecretsError::not_found(&self.name))?;

        if value.is_empty() {
            return Err(SecretsError::Empty {
                name: self.name.clone(),
            });
        }

        Ok(value)
    }
}

impl std::fmt::Debug for BackendSecretGetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSecretGetter")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("budgeted", &self.budget.is_some())
            .finish_non_exhaustive()
    }
}
