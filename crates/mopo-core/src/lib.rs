//! htrmopo - metadata layer of the HTR/OCR model repository.
//!
//! Models are deposited with one of two metadata generations: a v0
//! `metadata.json` sidecar or a v1 `README.md` model card with YAML front
//! matter. This crate splits and validates both, normalizes them into one
//! [`Record`] shape, and lists and filters records from a repository
//! through a pluggable [`RecordSource`].
//!
//! # Example
//!
//! ```rust,ignore
//! use htrmopo::{Catalog, RecordFilter, ZenodoSource};
//!
//! #[tokio::main]
//! async fn main() -> htrmopo::Result<()> {
//!     let catalog = Catalog::new(ZenodoSource::new()?);
//!
//!     let record = catalog.describe("10.5281/zenodo.8425684", None).await?;
//!     println!("{} ({})", record.summary(), record.license_label());
//!
//!     let arabic = catalog.search(&RecordFilter::new().with_script("Arab")).await?;
//!     println!("Found {} Arabic script models", arabic.len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod publish;
pub mod record;
pub mod repository;
pub mod schema;

// Re-export commonly used types
pub use config::RepositoryConfig;
pub use error::{MopoError, Result};
pub use publish::{prepare_publication, DepositMetadata, ModelCard, Publication};
pub use record::{load_record, normalize, normalize_deposit, DepositIdentity, Record, RecordAuthor};
pub use repository::{
    Catalog, InMemorySource, Payload, RecordFilter, RecordSource, RecordVersions, SourceEntry,
};
#[cfg(feature = "zenodo-client")]
pub use repository::ZenodoSource;
pub use schema::{
    detect_version, parse_document, split, validate, validate_document, MetadataBlock,
    MetadataSchemaVersion, SchemaViolation, SchemaWarning, ValidatedBlock, ValidationResult,
    ViolationKind,
};
