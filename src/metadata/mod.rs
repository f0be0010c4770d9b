//! Page-metadata retrieval and extraction.
//!
//! The page is fetched through the mirror chain and handed to the pure
//! extractor. This whole branch runs detached from the scan; its only
//! output is a [`MetadataResult`], successful or not.

mod extract;

use log::{debug, warn};

use crate::gateway::MirrorFetcher;
use crate::models::MetadataResult;

pub use extract::extract;

/// Failure text when every mirror attempt timed out.
const TIMEOUT_MESSAGE: &str =
    "Request timed out while fetching metadata (try again or website may be slow)";

/// Fetches `https://<domain>` through the mirrors and extracts metadata.
///
/// Never fails: when every mirror is exhausted the failure-path record is
/// returned, with timeout aborts worded distinctly from other failures.
pub async fn fetch_metadata(fetcher: MirrorFetcher, domain: &str) -> MetadataResult {
    let target = format!("https://{domain}");
    match fetcher.fetch(&target).await {
        Ok(html) => {
            debug!("metadata page for {domain}: {} bytes", html.len());
            extract(&html, domain)
        }
        Err(e) if e.is_timeout() => {
            warn!("metadata fetch for {domain} timed out on every mirror");
            MetadataResult::failed(domain, TIMEOUT_MESSAGE.to_string())
        }
        Err(e) => {
            warn!("metadata fetch for {domain} failed: {e}");
            MetadataResult::failed(domain, format!("Failed to fetch metadata: {e}"))
        }
    }
}
