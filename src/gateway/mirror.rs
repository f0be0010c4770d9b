//! Ordered mirror fallback for fetching through relay endpoints.
//!
//! Some targets are only reachable through a relay. A mirror list holds URL
//! templates in priority order; each is tried in turn with a short
//! per-attempt bound, and the first 2xx body wins. Later mirrors pay no
//! cost when an earlier one answers.

use log::{debug, warn};
use std::time::Duration;

use crate::error_handling::ProviderError;
use crate::gateway::ProviderGateway;

/// Placeholder in a mirror template that receives the encoded target URL.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Tries an ordered list of relay mirrors until one yields a 2xx body.
#[derive(Clone)]
pub struct MirrorFetcher {
    gateway: ProviderGateway,
    mirrors: Vec<String>,
    attempt_timeout: Duration,
}

/// Percent-encodes a URL for embedding as a single query-string value.
///
/// Unreserved characters pass through; everything else, including `:`, `/`,
/// `?`, `&` and `=`, is escaped so the relay sees one opaque parameter.
pub fn encode_target(target: &str) -> String {
    let mut out = String::with_capacity(target.len() * 3);
    for byte in target.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

impl MirrorFetcher {
    /// Creates a fetcher over the given mirrors (priority order) with a
    /// per-attempt timeout bound.
    pub fn new(gateway: ProviderGateway, mirrors: Vec<String>, attempt_timeout: Duration) -> Self {
        Self {
            gateway,
            mirrors,
            attempt_timeout,
        }
    }

    /// Expands a mirror template with the encoded target URL.
    fn expand(template: &str, target: &str) -> String {
        template.replace(TARGET_PLACEHOLDER, &encode_target(target))
    }

    /// Fetches `target` through the mirrors in order, returning the first
    /// 2xx body.
    ///
    /// Every attempt is independently bounded by the per-attempt timeout, so
    /// a hung mirror costs at most that long. When all mirrors fail, the
    /// error from the *last* attempt is returned; a timeout there stays a
    /// timeout so callers can tell slowness from unreachability.
    pub async fn fetch(&self, target: &str) -> Result<String, ProviderError> {
        let mut last_error = None;
        for (index, template) in self.mirrors.iter().enumerate() {
            let url = Self::expand(template, target);
            debug!("mirror attempt {}/{}: {}", index + 1, self.mirrors.len(), url);
            match self.gateway.get_with(&url, &[], self.attempt_timeout).await {
                Ok(response) if response.is_success() => {
                    debug!("mirror {} answered with {}", index + 1, response.status);
                    return Ok(response.body);
                }
                Ok(response) => {
                    warn!(
                        "mirror {} returned status {}, trying next",
                        index + 1,
                        response.status
                    );
                    last_error = Some(ProviderError::Upstream {
                        status: response.status,
                        body: response.body,
                    });
                }
                Err(e) => {
                    warn!("mirror {} failed: {}, trying next", index + 1, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            ProviderError::InputValidation("mirror list is empty".to_string())
        }))
    }
}
