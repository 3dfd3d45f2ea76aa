//! Repository access: where raw model metadata comes from.
//!
//! The schema and record layers never talk to the network. They consume a
//! [`RecordSource`], which hands out the raw metadata files of repository
//! deposits, and the [`Catalog`] turns those into [`Record`]s.
//!
//! ```text
//! Catalog<S: RecordSource>
//!     │
//!     ├── InMemorySource - fixed set of deposits (tests, embedding)
//!     │
//!     └── ZenodoSource   - Zenodo REST records API (feature `zenodo-client`)
//! ```
//!
//! [`Record`]: crate::record::Record

mod catalog;
pub mod doi;
mod memory;
#[cfg(feature = "zenodo-client")]
mod zenodo;

pub use catalog::{Catalog, RecordFilter, RecordVersions};
pub use doi::{doi_from_url, doi_to_record_id};
pub use memory::InMemorySource;
#[cfg(feature = "zenodo-client")]
pub use zenodo::ZenodoSource;

use crate::error::{MopoError, Result};
use crate::record::DepositIdentity;
use crate::schema::frontmatter::split;
use crate::schema::{MetadataBlock, MetadataSchemaVersion};
use async_trait::async_trait;
use chrono::NaiveDate;

/// One metadata file found in a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// v1 `README.md` model card, as downloaded.
    ModelCard(Vec<u8>),
    /// v0 `metadata.json` sidecar.
    JsonMetadata(Vec<u8>),
}

impl Payload {
    pub fn version(&self) -> MetadataSchemaVersion {
        match self {
            Payload::ModelCard(_) => MetadataSchemaVersion::V1,
            Payload::JsonMetadata(_) => MetadataSchemaVersion::V0,
        }
    }

    /// Classify a deposit file by name. Returns `None` for model weights
    /// and anything else that is not metadata.
    pub fn from_file(name: &str, contents: Vec<u8>) -> Option<Self> {
        match MetadataSchemaVersion::from_filename(name)? {
            MetadataSchemaVersion::V1 => Some(Payload::ModelCard(contents)),
            MetadataSchemaVersion::V0 => Some(Payload::JsonMetadata(contents)),
        }
    }

    /// Decode the metadata block, and for model cards the body.
    ///
    /// The version follows the file kind, not the content shape: a
    /// `README.md` is always read as a model card.
    pub fn decode(&self) -> Result<(MetadataBlock, Option<String>)> {
        match self {
            Payload::ModelCard(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| MopoError::MalformedMetadata {
                    message: format!("model card is not valid UTF-8: {}", e),
                })?;
                let parts = split(text)?;
                Ok((
                    MetadataBlock::from_front_matter(parts.metadata)?,
                    Some(parts.body.to_string()),
                ))
            }
            Payload::JsonMetadata(bytes) => Ok((MetadataBlock::from_json(bytes)?, None)),
        }
    }
}

/// A deposit with its metadata files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub identity: DepositIdentity,
    pub payloads: Vec<Payload>,
}

impl SourceEntry {
    pub fn new(identity: DepositIdentity) -> Self {
        Self {
            identity,
            payloads: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payloads.push(payload);
        self
    }

    pub fn payload(&self, version: MetadataSchemaVersion) -> Option<&Payload> {
        self.payloads.iter().find(|p| p.version() == version)
    }

    /// Whether the deposit was published on or after `since`. Undated
    /// deposits only pass when there is no lower bound.
    pub fn published_since(&self, since: Option<NaiveDate>) -> bool {
        match since {
            None => true,
            Some(since) => self
                .identity
                .publication_date
                .is_some_and(|date| date >= since),
        }
    }
}

/// Where deposits come from.
///
/// Implementations own all I/O concerns (HTTP, retries, credentials);
/// the catalog only sees finished entries.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one deposit by persistent identifier. A concept identifier
    /// resolves to its latest version.
    async fn fetch(&self, identifier: &str) -> Result<SourceEntry>;

    /// Fetch every deposit the source knows about, or only those
    /// published on or after `since` for incremental harvesting.
    async fn list(&self, since: Option<NaiveDate>) -> Result<Vec<SourceEntry>>;
}
