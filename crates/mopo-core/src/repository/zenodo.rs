//! Zenodo REST records API source.
//!
//! Records are looked up by numeric id (`GET {base}records/{id}`), the
//! model community is paged through `GET {base}records?communities=..`,
//! and metadata files are downloaded through the links in each record.
//! Only public records are read, so no access token is sent.

use super::doi::{doi_from_url, doi_to_record_id};
use super::{Payload, RecordSource, SourceEntry};
use crate::config::{with_trailing_slash, RepositoryConfig};
use crate::error::{MopoError, Result};
use crate::record::DepositIdentity;
use crate::schema::MetadataSchemaVersion;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// A record as returned by the records API. Only the fields used here.
#[derive(Debug, Clone, Deserialize)]
struct ZenodoRecord {
    id: u64,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    conceptdoi: Option<String>,
    #[serde(default)]
    metadata: ZenodoRecordMetadata,
    #[serde(default)]
    files: Vec<ZenodoFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ZenodoRecordMetadata {
    #[serde(default)]
    publication_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ZenodoFile {
    #[serde(alias = "filename")]
    key: String,
    #[serde(default)]
    links: ZenodoFileLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ZenodoFileLinks {
    #[serde(default)]
    content: Option<String>,
    #[serde(rename = "self", default)]
    self_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZenodoSearchResponse {
    hits: ZenodoHits,
}

#[derive(Debug, Deserialize)]
struct ZenodoHits {
    #[serde(default)]
    hits: Vec<ZenodoRecord>,
    #[serde(default)]
    total: u64,
}

impl ZenodoRecord {
    fn identity(&self) -> DepositIdentity {
        let id = self
            .doi
            .as_deref()
            .map(doi_from_url)
            .unwrap_or_else(|| self.id.to_string());
        DepositIdentity {
            id,
            concept_id: self.conceptdoi.as_deref().map(doi_from_url),
            publication_date: self
                .metadata
                .publication_date
                .as_deref()
                .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()),
        }
    }

    /// Metadata files of the record with their download links.
    fn metadata_files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().filter_map(|file| {
            MetadataSchemaVersion::from_filename(&file.key)?;
            let link = file
                .links
                .content
                .as_deref()
                .or(file.links.self_link.as_deref())?;
            Some((file.key.as_str(), link))
        })
    }
}

/// [`RecordSource`] backed by a Zenodo instance.
///
/// Listing pages and file downloads run with at most
/// [`RepositoryConfig::MAX_CONCURRENT_REQUESTS`] requests in flight. Any
/// failed request fails the whole listing rather than dropping deposits.
pub struct ZenodoSource {
    client: Client,
    base_url: String,
}

impl ZenodoSource {
    /// Source for the repository named by [`RepositoryConfig::repo_url`].
    pub fn new() -> Result<Self> {
        Self::with_base_url(RepositoryConfig::repo_url())
    }

    /// Source for an explicit API base URL, e.g. a sandbox instance.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(RepositoryConfig::REQUEST_TIMEOUT)
            .user_agent(RepositoryConfig::USER_AGENT)
            .build()
            .map_err(|e| MopoError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Self::with_client(base_url, client)
    }

    fn with_client(base_url: impl Into<String>, client: Client) -> Result<Self> {
        let base_url = with_trailing_slash(base_url.into().trim());
        url::Url::parse(&base_url).map_err(|e| MopoError::Config {
            message: format!("Invalid repository URL '{}': {}", base_url, e),
        })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn check_status(response: Response, url: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(MopoError::RateLimited {
                service: url::Url::parse(url)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_string))
                    .unwrap_or_else(|| url.to_string()),
                retry_after_secs: retry_after,
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(MopoError::RecordNotFound {
                identifier: url.to_string(),
            });
        }
        Err(MopoError::Network {
            message: format!("Repository returned {} for {}", status, url),
            cause: None,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;
        let response = Self::check_status(response, url)?;

        response.json().await.map_err(|e| MopoError::Json {
            message: format!("Failed to parse repository response: {}", e),
            source: None,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response, url)?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn entry(&self, record: &ZenodoRecord) -> Result<SourceEntry> {
        let mut entry = SourceEntry::new(record.identity());
        for (name, link) in record.metadata_files() {
            let contents = self.download(link).await?;
            if let Some(payload) = Payload::from_file(name, contents) {
                entry = entry.with_payload(payload);
            }
        }
        Ok(entry)
    }

    async fn search_page(&self, page: u64, since: Option<NaiveDate>) -> Result<ZenodoHits> {
        let url = format!("{}records", self.base_url);
        let mut query = vec![
            ("communities", RepositoryConfig::COMMUNITY.to_string()),
            ("size", RepositoryConfig::LISTING_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(since) = since {
            query.push(("q", publication_date_query(since)));
        }
        let response: ZenodoSearchResponse = self.get_json(&url, &query).await?;
        Ok(response.hits)
    }
}

/// Search query selecting records published on or after `since`.
fn publication_date_query(since: NaiveDate) -> String {
    format!("publication_date:[{} TO *]", since.format("%Y-%m-%d"))
}

#[async_trait]
impl RecordSource for ZenodoSource {
    async fn fetch(&self, identifier: &str) -> Result<SourceEntry> {
        let record_id = doi_to_record_id(identifier)?;
        let url = format!("{}records/{}", self.base_url, record_id);

        let record: ZenodoRecord = self.get_json(&url, &[]).await.map_err(|e| match e {
            MopoError::RecordNotFound { .. } => MopoError::RecordNotFound {
                identifier: identifier.to_string(),
            },
            other => other,
        })?;
        self.entry(&record).await
    }

    async fn list(&self, since: Option<NaiveDate>) -> Result<Vec<SourceEntry>> {
        let first = self.search_page(1, since).await?;
        let page_size = u64::from(RepositoryConfig::LISTING_PAGE_SIZE);
        let pages = first.total.div_ceil(page_size).max(1);

        let rest: Vec<ZenodoHits> = stream::iter(2..=pages)
            .map(|page| self.search_page(page, since))
            .buffered(RepositoryConfig::MAX_CONCURRENT_REQUESTS)
            .try_collect()
            .await?;
        let records: Vec<ZenodoRecord> = std::iter::once(first)
            .chain(rest)
            .flat_map(|hits| hits.hits)
            .collect();
        debug!("Community listing returned {} records", records.len());

        stream::iter(records)
            .map(|record| async move { self.entry(&record).await })
            .buffered(RepositoryConfig::MAX_CONCURRENT_REQUESTS)
            .try_collect()
            .await
    }
}
