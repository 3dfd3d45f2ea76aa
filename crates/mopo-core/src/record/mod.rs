//! Unified model record.
//!
//! A [`Record`] is what listing, filtering and display code works with,
//! whatever schema generation the underlying metadata was written in. It
//! is built once by the [`normalizer`] and never changed afterwards: a new
//! model version is a new record with a new `id`, tied to its predecessors
//! through `concept_id` and `base_models`.

pub mod normalizer;

pub use normalizer::{normalize, normalize_deposit};

use crate::error::Result;
use crate::schema::{validate_document, vocab, MetadataSchemaVersion, ValidationResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Decode, validate and normalize a raw document (v0 JSON or v1 model
/// card) in one step.
///
/// Fails with [`crate::MopoError::InvalidMetadata`] carrying every
/// violation when the document does not satisfy its schema.
pub fn load_record(content: &str, identity: Option<&DepositIdentity>) -> Result<Record> {
    let document = validate_document(content)?;
    let identifier = identity.map_or("document", |identity| identity.id.as_str());
    let result = ValidationResult::Valid(document.result.into_result(identifier)?);
    let body = document.body.as_deref();
    match identity {
        Some(identity) => normalize_deposit(&result, document.version, body, identity),
        None => normalize(&result, document.version, body),
    }
}

/// One author of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

/// What a repository deposit says about a record, independent of the
/// metadata file inside it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositIdentity {
    /// Persistent identifier of this version (DOI).
    pub id: String,
    /// Identifier shared by all versions of the model.
    #[serde(default)]
    pub concept_id: Option<String>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
}

impl DepositIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_concept_id(mut self, concept_id: impl Into<String>) -> Self {
        self.concept_id = Some(concept_id.into());
        self
    }

    pub fn with_publication_date(mut self, date: NaiveDate) -> Self {
        self.publication_date = Some(date);
        self
    }
}

/// A single model version, normalized from v0 or v1 metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub(crate) id: String,
    pub(crate) concept_id: Option<String>,
    pub(crate) schema_version: MetadataSchemaVersion,
    pub(crate) summary: String,
    pub(crate) description: Option<String>,
    pub(crate) authors: Vec<RecordAuthor>,
    pub(crate) license: String,
    pub(crate) license_name: Option<String>,
    pub(crate) license_link: Option<String>,
    pub(crate) model_types: BTreeSet<String>,
    pub(crate) scripts: BTreeSet<String>,
    pub(crate) languages: BTreeSet<String>,
    pub(crate) metrics: BTreeMap<String, f64>,
    pub(crate) keywords: BTreeSet<String>,
    pub(crate) base_models: BTreeSet<String>,
    pub(crate) datasets: BTreeSet<String>,
    // v0 only
    pub(crate) name: Option<String>,
    pub(crate) graphemes: Vec<String>,
    // v1 only
    pub(crate) software_name: Option<String>,
    pub(crate) software_hints: Vec<String>,
    pub(crate) citation: Option<String>,
    pub(crate) publication_date: Option<NaiveDate>,
}

impl Record {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn concept_id(&self) -> Option<&str> {
        self.concept_id.as_deref()
    }

    pub fn schema_version(&self) -> MetadataSchemaVersion {
        self.schema_version
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn authors(&self) -> &[RecordAuthor] {
        &self.authors
    }

    pub fn license(&self) -> &str {
        &self.license
    }

    pub fn license_name(&self) -> Option<&str> {
        self.license_name.as_deref()
    }

    pub fn license_link(&self) -> Option<&str> {
        self.license_link.as_deref()
    }

    pub fn model_types(&self) -> &BTreeSet<String> {
        &self.model_types
    }

    pub fn scripts(&self) -> &BTreeSet<String> {
        &self.scripts
    }

    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    pub fn base_models(&self) -> &BTreeSet<String> {
        &self.base_models
    }

    pub fn datasets(&self) -> &BTreeSet<String> {
        &self.datasets
    }

    /// Model name from a v0 sidecar.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Character set of a v0 recognition model.
    pub fn graphemes(&self) -> &[String] {
        &self.graphemes
    }

    pub fn software_name(&self) -> Option<&str> {
        self.software_name.as_deref()
    }

    pub fn software_hints(&self) -> &[String] {
        &self.software_hints
    }

    pub fn citation(&self) -> Option<&str> {
        self.citation.as_deref()
    }

    pub fn publication_date(&self) -> Option<NaiveDate> {
        self.publication_date
    }

    /// Character error rate in percent, from `metrics.cer` or derived
    /// from a v0 `accuracy`.
    pub fn cer(&self) -> Option<f64> {
        self.metrics
            .get("cer")
            .copied()
            .or_else(|| self.metrics.get("accuracy").map(|accuracy| 100.0 - accuracy))
    }

    /// License label for display: the free-text name for `other-*`
    /// licenses, the identifier otherwise.
    pub fn license_label(&self) -> &str {
        match &self.license_name {
            Some(name) if vocab::is_other_license(&self.license) => name,
            _ => &self.license,
        }
    }

    /// Whether both records are versions of the same model.
    pub fn is_version_of(&self, other: &Record) -> bool {
        match (&self.concept_id, &other.concept_id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Author names joined for one-line display.
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
