//! HTTP transport seam.
//!
//! The remote call layer talks to the network only through
//! [`HttpTransport`], so tests can script responses and timeouts without a
//! server. [`ReqwestTransport`] is the production implementation.

mod client;

pub use client::ReqwestTransport;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{ControlError, ControlResult};

/// HTTP methods used against the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
}

impl HttpMethod {
    /// Get the method as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully-resolved request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

impl ApiRequest {
    /// Look up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response with its body already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub text: String,
}

impl ApiResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// Create a response with a JSON body.
    #[must_use]
    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Whether the status is exactly 200.
    ///
    /// The platform signals success with 200 only; other 2xx codes are not
    /// treated as success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Deserialise the body.
    pub fn json<T: DeserializeOwned>(&self) -> ControlResult<T> {
        serde_json::from_str(&self.text).map_err(ControlError::from)
    }

    /// Parse the body as untyped JSON, if it is JSON at all.
    #[must_use]
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.text).ok()
    }
}

/// Transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server did not answer within the request timeout.
    #[error("read timed out")]
    Timeout,

    /// Any other failure (DNS, connect, TLS, reset).
    #[error("{0}")]
    Other(String),
}

/// Sends requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request. No retries happen at this level.
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
