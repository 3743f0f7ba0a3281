//! Traits for secret storage and retrieval.

use async_trait::async_trait;

use crate::error::SecretsError;
use crate::types::{SecretContext, SecretValue};

/// Read-only source of named secrets.
///
/// The `get` method with a `SecretContext` searches scopes in order from most
/// specific to least specific:
/// 1. Environment scope (team + environment)
/// 2. Team scope
/// 3. Global scope
#[async_trait]
pub trait SecretsBackend: Send + Sync {
    /// Retrieves a secret, searching through scopes based on the context.
    ///
    /// Returns `None` if the secret is not found at any scope.
    async fn get(
        &self,
        name: &str,
        context: &SecretContext,
    ) -> Result<Option<SecretValue>, SecretsError>;
}

/// Narrow contract used to authenticate remote calls.
///
/// Implementations resolve exactly one credential. Callers fetch it fresh
/// for every request and never cache the returned value.
#[async_trait]
pub trait SecretGetter: Send + Sync {
    /// Resolve the credential.
    async fn get_secret(&self) -> Result<SecretValue, SecretsError>;
}
