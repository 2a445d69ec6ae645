//! reqwest-backed transport

use super::traits::Transport;
use crate::error::FetchError;
use crate::request::RequestSpec;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("getlush/", env!("CARGO_PKG_VERSION"));

/// HTTP transport over a pooled [`reqwest::Client`]
///
/// The client keeps no cookie store; the only cookie sent is the one in the request
/// headers.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new() -> crate::Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn classify(error: reqwest::Error, url: &str, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            reason: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: &RequestSpec, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let url = spec.url.as_str();
        let response = self
            .client
            .request(spec.method.clone(), spec.url.clone())
            .headers(spec.headers.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, url, timeout))?;

        // status is informational only, the portal returns 200 for error pages
        debug!(url, status = %response.status(), "response received");

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        Ok(body.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
