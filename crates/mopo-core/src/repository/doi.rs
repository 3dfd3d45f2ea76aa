//! DOI helpers for Zenodo-minted identifiers.

use crate::error::{MopoError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Zenodo DOIs look like `10.5281/zenodo.14585602`.
static ZENODO_DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.]+/zenodo\.([0-9]+)").unwrap());

/// Strip the resolver from a DOI URL (`https://doi.org/10.5281/zenodo.1`
/// becomes `10.5281/zenodo.1`). Bare DOIs are returned unchanged.
pub fn doi_from_url(value: &str) -> String {
    let value = value.trim();
    match url::Url::parse(value) {
        Ok(url) if url.has_host() => url.path().trim_start_matches('/').to_string(),
        _ => value.to_string(),
    }
}

/// Numeric Zenodo record id of a DOI or DOI URL.
pub fn doi_to_record_id(doi: &str) -> Result<String> {
    let doi = doi_from_url(doi);
    ZENODO_DOI
        .captures(&doi)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| MopoError::InvalidIdentifier(doi.clone()))
}
