//! Centralized configuration for htrmopo.
//!
//! Constants for the hosted model repository plus the `MODEL_REPO_URL`
//! environment override used to point the client at a sandbox instance.

use std::time::Duration;

/// Repository-level configuration.
pub struct RepositoryConfig;

impl RepositoryConfig {
    pub const DEFAULT_REPO_URL: &'static str = "https://zenodo.org/api/";
    pub const REPO_URL_ENV: &'static str = "MODEL_REPO_URL";

    /// Community every public model deposit is submitted to.
    pub const COMMUNITY: &'static str = "ocr_models";

    /// v1 records carry their metadata in this Markdown file.
    pub const MODEL_CARD_FILENAME: &'static str = "README.md";
    /// v0 records carry their metadata in this JSON sidecar.
    pub const V0_METADATA_FILENAME: &'static str = "metadata.json";

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Largest page the records API serves to anonymous clients.
    pub const LISTING_PAGE_SIZE: u32 = 25;
    /// Requests in flight at once while listing.
    pub const MAX_CONCURRENT_REQUESTS: usize = 4;
    pub const USER_AGENT: &'static str = concat!("htrmopo/", env!("CARGO_PKG_VERSION"));

    /// Base URL of the repository REST API, always ending in `/`.
    pub fn repo_url() -> String {
        let url = std::env::var(Self::REPO_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_REPO_URL.to_string());
        with_trailing_slash(url.trim())
    }
}

pub(crate) fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
