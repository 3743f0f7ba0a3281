//! Error types for secret retrieval.

use thiserror::Error;

/// Errors that can occur while resolving a secret.
#[derive(Debug, Error)]
pub enum SecretsError {
    /// Secret not found at any scope.
    #[error("secret not found: {name}")]
    NotFound {
        /// The name of the secret that was not found.
        name: String,
    },

    /// Backend not configured.
    #[error("secrets backend not configured")]
    NotConfigured,

    /// Unsupported backend type.
    #[error("unsupported secrets backend: {0}")]
    UnsupportedBackend(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Secret exists but holds no value.
    #[error("secret is empty: {name}")]
    Empty {
        /// The name of the empty secret.
        name: String,
    },
}

impl SecretsError {
    /// Create a not-found error for the named secret.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}
