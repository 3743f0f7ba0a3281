//! Error types for meridian-control.

use std::time::Duration;

use meridian_secrets::SecretsError;

use crate::transport::ApiResponse;

/// Result type alias using [`ControlError`].
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while provisioning and deploying units.
///
/// "Already exists" is not an error: ensure operations report it as
/// [`EnsureOutcome::AlreadyExists`](crate::provisioner::EnsureOutcome).
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Every attempt of a call hit a read timeout.
    #[error("{endpoint} timed out on all {attempts} attempts")]
    TransientNetwork {
        /// Endpoint that was called.
        endpoint: String,
        /// Attempts made.
        attempts: u32,
    },

    /// Transport failure other than a read timeout. Never retried.
    #[error("request to {endpoint} failed: {message}")]
    Transport {
        /// Endpoint that was called.
        endpoint: String,
        /// Transport error description.
        message: String,
    },

    /// Credential retrieval failed before any request was sent.
    #[error("authentication error: {0}")]
    Authentication(#[source] SecretsError),

    /// The remote side answered with a status the caller does not accept.
    #[error("{operation} failed with status {status}: {body}")]
    RemoteValidation {
        /// Operation being performed.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The GitOps controller still could not see the application after the
    /// sync retry budget was spent.
    #[error("{operation}: application still not visible after {attempts} attempts")]
    ResourceNotFoundYet {
        /// Operation being performed.
        operation: String,
        /// Attempts made.
        attempts: u32,
    },

    /// A poll ran out of attempts before its condition held.
    #[error("{operation} not ready after {attempts} attempts ({}s elapsed)", .elapsed.as_secs())]
    TimeoutExceeded {
        /// Operation being polled.
        operation: String,
        /// Attempts made.
        attempts: u32,
        /// Time spent polling.
        elapsed: Duration,
    },

    /// The run was cancelled.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Operation that observed the cancellation.
        operation: String,
    },

    /// Permission check denied the run.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Pipeline definition is invalid.
    #[error("invalid pipeline definition: {0}")]
    Definition(String),

    /// Manifest rendering failed.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialisation error.
    #[error("serialisation error: {0}")]
    Serialisation(String),
}

impl ControlError {
    /// Create a remote validation error from an unexpected response.
    #[must_use]
    pub fn remote(operation: impl Into<String>, response: &ApiResponse) -> Self {
        Self::RemoteValidation {
            operation: operation.into(),
            status: response.status,
            body: response.text.clone(),
        }
    }

    /// Create a cancellation error.
    #[must_use]
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a definition error.
    #[must_use]
    pub fn definition(msg: impl Into<String>) -> Self {
        Self::Definition(msg.into())
    }

    /// Create a manifest error.
    #[must_use]
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialisation(e.to_string())
    }
}

impl From<serde_yaml::Error> for ControlError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialisation(e.to_string())
    }
}
