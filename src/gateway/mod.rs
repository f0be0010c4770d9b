//! HTTP gateways in front of the intelligence providers.
//!
//! [`ProviderGateway`] is the bounded-timeout wrapper every provider call
//! goes through. [`key_rotation`] and [`mirror`] layer the two fallback
//! strategies on top of it: quota-aware credential rotation and ordered
//! mirror attempts.

pub mod key_rotation;
pub mod mirror;

use std::sync::Arc;
use std::time::Duration;

use crate::error_handling::ProviderError;

pub use mirror::MirrorFetcher;

/// Status and body of a provider response.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl GatewayResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generic bounded-timeout HTTP call wrapper shared by all providers.
#[derive(Clone)]
pub struct ProviderGateway {
    client: Arc<reqwest::Client>,
    timeout: Duration,
}

impl ProviderGateway {
    /// Creates a gateway over a shared client with a default per-request
    /// timeout bound.
    pub fn new(client: Arc<reqwest::Client>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The default per-request timeout bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues a GET bounded by the default timeout; any status is returned.
    pub async fn get(&self, url: &str) -> Result<GatewayResponse, ProviderError> {
        self.get_with(url, &[], self.timeout).await
    }

    /// Issues a GET bounded by the default timeout; non-2xx becomes
    /// [`ProviderError::Upstream`].
    pub async fn get_ok(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<GatewayResponse, ProviderError> {
        let response = self.get_with(url, headers, self.timeout).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ProviderError::Upstream {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Issues a GET with extra headers, bounded by an explicit timeout.
    ///
    /// The bound covers the entire attempt including body read; exceeding it
    /// cancels the request and yields [`ProviderError::Timeout`]. Responses
    /// are returned whatever their status so callers can inspect bodies of
    /// non-2xx answers.
    pub async fn get_with(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        bound: Duration,
    ) -> Result<GatewayResponse, ProviderError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let attempt = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<GatewayResponse, reqwest::Error>(GatewayResponse { status, body })
        };

        match tokio::time::timeout(bound, attempt).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ProviderError::Network(e)),
            Err(_) => Err(ProviderError::Timeout(bound)),
        }
    }
}
