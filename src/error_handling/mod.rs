//! Error taxonomy for provider calls.
//!
//! Provider-level failures are isolated per source: the orchestrator logs
//! them and continues with whatever data the other sources produced. Only
//! input validation surfaces to the caller as a hard error.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while calling an intelligence provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A required credential is missing. Fatal to the single provider call,
    /// reported immediately, never retried.
    #[error("Server misconfigured: {0}")]
    Configuration(String),

    /// A required input parameter is missing or malformed.
    #[error("Missing required parameter: {0}")]
    InputValidation(String),

    /// The provider answered with a non-2xx status. The body is kept so
    /// boundary endpoints can pass it through verbatim.
    #[error("Upstream returned status {status}")]
    Upstream {
        /// HTTP status code from the provider.
        status: u16,
        /// Raw response body from the provider.
        body: String,
    },

    /// The attempt exceeded its timeout bound.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A quota-exceeded signal was detected in a response body. Triggers key
    /// rotation; not surfaced to scan callers.
    #[error("API key quota exceeded")]
    QuotaExceeded,

    /// The provider response could not be parsed.
    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    /// Transport-level failure (connect, DNS, TLS, body read).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    /// Whether this error is a per-attempt timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }

    /// Short category name, used in logs.
    pub fn category(&self) -> &'static str {
        match self {
            ProviderError::Configuration(_) => "configuration",
            ProviderError::InputValidation(_) => "input validation",
            ProviderError::Upstream { .. } => "upstream",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::QuotaExceeded => "quota exceeded",
            ProviderError::Parse(_) => "parse",
            ProviderError::Network(_) => "network",
        }
    }
}
