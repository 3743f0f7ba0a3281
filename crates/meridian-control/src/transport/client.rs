//! `reqwest`-backed transport.

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::trace;

use crate::error::{ControlError, ControlResult};

use super::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, TransportError};

/// Production transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh connection pool.
    pub fn new() -> ControlResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("meridian/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ControlError::Http)?;

        Ok(Self { client })
    }
}

fn classify(error: &reqwest::Error) -> TransportError {
    // Connect timeouts are not read timeouts and are not retried.
    if error.is_timeout() && !error.is_connect() {
        TransportError::Timeout
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify(&e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| classify(&e))?;

        trace!(url = %request.url, status, "response received");

        Ok(ApiResponse { status, text })
    }
}
