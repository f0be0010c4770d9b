//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

/// Initializes the shared HTTP client.
///
/// Creates a `reqwest::Client` configured with:
/// - A global request timeout
/// - A TCP connect timeout (half the global timeout, at least one second)
/// - Redirect following enabled (reqwest default, up to 10 hops)
///
/// # Arguments
///
/// * `timeout` - Global per-request timeout
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout: Duration) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let connect_timeout = std::cmp::max(timeout / 2, Duration::from_secs(1));
    let client = ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_builds() {
        let client = init_client(Duration::from_secs(8));
        assert!(client.is_ok());
    }
}
