//! Remote call layer.
//!
//! [`RemoteCaller::call`] issues one request with immediate retry on read
//! timeout; [`poll_until`] repeats a fetch until a predicate holds or the
//! attempt budget runs out. Non-200 responses are returned to the caller
//! unchanged. Interpreting them is the caller's job.

mod poll;

pub use poll::{poll_until, PollPolicy};

use std::sync::Arc;
use std::time::Duration;

use meridian_secrets::SecretGetter;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ControlError, ControlResult};
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, TransportError};

/// How the API token is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `access_token: <token>` with `accept: application/json`.
    AccessToken,
    /// `Authorization: Bearer <token>`.
    Bearer,
}

impl AuthStyle {
    fn headers(self, token: &str) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_owned(), "application/json".to_owned())];
        match self {
            Self::AccessToken => {
                headers.push(("accept".to_owned(), "application/json".to_owned()));
                headers.push(("access_token".to_owned(), token.to_owned()));
            }
            Self::Bearer => {
                headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
            }
        }
        headers
    }
}

/// Authenticated client for one remote API.
#[derive(Clone)]
pub struct RemoteCaller {
    transport: Arc<dyn HttpTransport>,
    secrets: Arc<dyn SecretGetter>,
    auth: AuthStyle,
    base_url: String,
    timeout: Duration,
    max_attempts: u32,
}

impl RemoteCaller {
    /// Create a caller from API configuration.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        secrets: Arc<dyn SecretGetter>,
        auth: AuthStyle,
        config: &ApiConfig,
    ) -> Self {
        Self {
            transport,
            secrets,
            auth,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Override the total attempt budget for read timeouts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The base URL endpoints are joined onto.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an endpoint. Absolute URLs are used as given.
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_owned()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }

    /// Issue one request, retrying immediately on read timeout.
    ///
    /// The token is fetched before anything is sent; if that fails the
    /// call fails with [`ControlError::Authentication`] and no request is
    /// made. Other transport failures propagate on the first attempt.
    pub async fn call(
        &self,
        method: HttpMethod,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> ControlResult<ApiResponse> {
        let token = self
            .secrets
            .get_secret()
            .await
            .map_err(ControlError::Authentication)?;

        let request = ApiRequest {
            method,
            url: self.url(endpoint),
            headers: self.auth.headers(token.expose()),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            body,
            timeout: self.timeout,
        };

        for attempt in 1..=self.max_attempts {
            match self.transport.request(request.clone()).await {
                Ok(response) => {
                    debug!(
                        method = %method,
                        endpoint,
                        status = response.status,
                        attempt,
                        "remote call completed"
                    );
                    return Ok(response);
                }
                Err(TransportError::Timeout) => {
                    warn!(
                        method = %method,
                        endpoint,
                        attempt,
                        max_attempts = self.max_attempts,
                        "remote call timed out"
                    );
                }
                Err(TransportError::Other(message)) => {
                    return Err(ControlError::Transport {
                        endpoint: endpoint.to_owned(),
                        message,
                    });
                }
            }
        }

        Err(ControlError::TransientNetwork {
            endpoint: endpoint.to_owned(),
            attempts: self.max_attempts,
        })
    }

    /// GET with query parameters.
    pub async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> ControlResult<ApiResponse> {
        self.call(HttpMethod::Get, endpoint, query, None).await
    }

    /// POST a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ControlResult<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.call(HttpMethod::Post, endpoint, &[], Some(body)).await
    }
}

impl std::fmt::Debug for RemoteCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCaller")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
