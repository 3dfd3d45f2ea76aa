//! Record lookup, listing and filtering over a [`RecordSource`].

use super::{Payload, RecordSource, SourceEntry};
use crate::error::{MopoError, Result};
use crate::record::{normalize_deposit, Record};
use crate::schema::{validate, MetadataSchemaVersion, ValidationResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Both schema generations of one deposit, where present and valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordVersions {
    pub v0: Option<Record>,
    pub v1: Option<Record>,
}

impl RecordVersions {
    /// The v1 record if there is one, else the v0 record.
    pub fn preferred(&self) -> Option<&Record> {
        self.v1.as_ref().or(self.v0.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.v0.is_none() && self.v1.is_none()
    }
}

/// Conjunctive record filter. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// ISO 15924 script code.
    pub script: Option<String>,
    /// ISO 639-3 language code.
    pub language: Option<String>,
    pub model_type: Option<String>,
    pub keyword: Option<String>,
    /// Case-insensitive substring of summary, description or keywords.
    pub text: Option<String>,
    /// Only deposits published on or after this date.
    pub published_since: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = Some(model_type.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_published_since(mut self, since: NaiveDate) -> Self {
        self.published_since = Some(since);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let contains = |set: &std::collections::BTreeSet<String>, wanted: &Option<String>| {
            wanted.as_ref().map_or(true, |w| set.contains(w))
        };

        contains(record.scripts(), &self.script)
            && contains(record.languages(), &self.language)
            && contains(record.model_types(), &self.model_type)
            && contains(record.keywords(), &self.keyword)
            && self.text.as_ref().map_or(true, |text| matches_text(record, text))
            && self.published_since.map_or(true, |since| {
                record.publication_date().is_some_and(|date| date >= since)
            })
    }
}

fn matches_text(record: &Record, text: &str) -> bool {
    let needle = text.to_lowercase();
    let hit = |haystack: &str| haystack.to_lowercase().contains(&needle);

    hit(record.summary())
        || record.description().is_some_and(hit)
        || record.keywords().iter().any(|k| hit(k))
}

/// Turns deposits from a [`RecordSource`] into [`Record`]s.
///
/// Invalid metadata never aborts an operation: the offending payload is
/// logged and skipped, and the next one is tried.
pub struct Catalog<S: RecordSource> {
    source: S,
}

impl<S: RecordSource> Catalog<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Record for one persistent identifier.
    ///
    /// The v1 model card wins unless `preferred` asks for v0; the other
    /// generation is used when the preferred one is missing or invalid.
    pub async fn describe(
        &self,
        identifier: &str,
        preferred: Option<MetadataSchemaVersion>,
    ) -> Result<Record> {
        let entry = self.source.fetch(identifier).await?;
        let order = match preferred {
            Some(MetadataSchemaVersion::V0) => [MetadataSchemaVersion::V0, MetadataSchemaVersion::V1],
            _ => [MetadataSchemaVersion::V1, MetadataSchemaVersion::V0],
        };

        order
            .into_iter()
            .find_map(|version| load_entry(&entry, version))
            .ok_or_else(|| MopoError::RecordNotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Every deposit with at least one valid record, keyed by identifier.
    ///
    /// With `since`, only deposits published on or after that date are
    /// harvested, so a caller can refresh an earlier listing incrementally.
    pub async fn listing(
        &self,
        since: Option<NaiveDate>,
    ) -> Result<BTreeMap<String, RecordVersions>> {
        let entries = self.source.list(since).await?;
        let total = entries.len();

        let listing: BTreeMap<String, RecordVersions> = entries
            .iter()
            .filter(|entry| entry.published_since(since))
            .filter_map(|entry| {
                let versions = RecordVersions {
                    v0: load_entry(entry, MetadataSchemaVersion::V0),
                    v1: load_entry(entry, MetadataSchemaVersion::V1),
                };
                if versions.is_empty() {
                    debug!("No usable metadata in {}", entry.identity.id);
                    return None;
                }
                Some((entry.identity.id.clone(), versions))
            })
            .collect();

        info!("Listed {} of {} deposits", listing.len(), total);
        Ok(listing)
    }

    /// Preferred record of every deposit accepted by `filter`, ordered by
    /// identifier.
    pub async fn search(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        Ok(self
            .listing(filter.published_since)
            .await?
            .into_values()
            .filter_map(|versions| versions.preferred().cloned())
            .filter(|record| filter.matches(record))
            .collect())
    }
}

/// Validate and normalize the `version` payload of `entry`, logging why
/// it was rejected if it was.
fn load_entry(entry: &SourceEntry, version: MetadataSchemaVersion) -> Option<Record> {
    let payload = entry.payload(version)?;
    match load_payload(entry, payload) {
        Ok(record) => Some(record),
        Err(e) => {
            info!(
                "Skipping {} metadata of {}: {}",
                version, entry.identity.id, e
            );
            None
        }
    }
}

fn load_payload(entry: &SourceEntry, payload: &Payload) -> Result<Record> {
    let version = payload.version();
    let (block, body) = payload.decode()?;
    let validated = match validate(block, version) {
        ValidationResult::Valid(validated) => validated,
        ValidationResult::Invalid(violations) => {
            return Err(MopoError::InvalidMetadata {
                identifier: entry.identity.id.clone(),
                violations,
            })
        }
    };

    for warning in validated.warnings() {
        warn!("{}: {}", entry.identity.id, warning);
    }
    normalize_deposit(
        &ValidationResult::Valid(validated),
        version,
        body.as_deref(),
        &entry.identity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DepositIdentity;
    use crate::repository::InMemorySource;

    const CARD: &str = "---
id: 10.5281/zenodo.2
summary: Medieval Latin recognition
authors:
  - name: Jane Doe
license: CC-BY-4.0
software_name: kraken
language: [lat]
script: [Latn]
model_type: [recognition]
tags: [medieval]
---

Trained on charters.
";

    const SIDECAR: &str = r#"{
        "authors": [{"name": "Jane Doe", "affiliation": "EPHE"}],
        "summary": "Arabic print",
        "description": "Naskh type",
        "accuracy": 97.5,
        "license": "Apache-2.0",
        "script": ["Arab"],
        "name": "arabic_print",
        "graphemes": ["ا"]
    }"#;

    fn identity(id: &str) -> DepositIdentity {
        DepositIdentity::new(id).with_concept_id("10.5281/zenodo.1")
    }

    fn catalog() -> Catalog<InMemorySource> {
        let both = SourceEntry::new(identity("10.5281/zenodo.2"))
            .with_payload(Payload::ModelCard(CARD.into()))
            .with_payload(Payload::JsonMetadata(SIDECAR.as_bytes().to_vec()));
        let v0_only = SourceEntry::new(DepositIdentity::new("10.5281/zenodo.5"))
            .with_payload(Payload::JsonMetadata(SIDECAR.as_bytes().to_vec()));
        let broken = SourceEntry::new(DepositIdentity::new("10.5281/zenodo.9"))
            .with_payload(Payload::ModelCard(b"---\nid: x\n---\n".to_vec()));

        Catalog::new(
            InMemorySource::new()
                .with_entry(both)
                .with_entry(v0_only)
                .with_entry(broken),
        )
    }

    #[tokio::test]
    async fn test_describe_prefers_model_card() {
        let record = catalog().describe("10.5281/zenodo.2", None).await.unwrap();
        assert_eq!(record.schema_version(), MetadataSchemaVersion::V1);
        assert_eq!(record.id(), "10.5281/zenodo.2");
        assert_eq!(record.description(), Some("Trained on charters."));
    }

    #[tokio::test]
    async fn test_describe_v0_on_request() {
        let record = catalog()
            .describe("10.5281/zenodo.2", Some(MetadataSchemaVersion::V0))
            .await
            .unwrap();
        assert_eq!(record.schema_version(), MetadataSchemaVersion::V0);
        assert_eq!(record.name(), Some("arabic_print"));
        assert_eq!(record.concept_id(), Some("10.5281/zenodo.1"));
    }

    #[tokio::test]
    async fn test_describe_falls_back_to_other_version() {
        let record = catalog()
            .describe("10.5281/zenodo.5", Some(MetadataSchemaVersion::V1))
            .await
            .unwrap();
        assert_eq!(record.schema_version(), MetadataSchemaVersion::V0);
    }

    #[tokio::test]
    async fn test_describe_invalid_only() {
        let err = catalog().describe("10.5281/zenodo.9", None).await.unwrap_err();
        assert!(matches!(err, MopoError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_listing_skips_unusable_deposits() {
        let listing = catalog().listing(None).await.unwrap();
        assert_eq!(listing.len(), 2);

        let both = &listing["10.5281/zenodo.2"];
        assert!(both.v0.is_some());
        assert!(both.v1.is_some());
        assert_eq!(
            both.preferred().map(Record::schema_version),
            Some(MetadataSchemaVersion::V1)
        );

        let v0_only = &listing["10.5281/zenodo.5"];
        assert!(v0_only.v1.is_none());
        assert!(!listing.contains_key("10.5281/zenodo.9"));
    }

    #[tokio::test]
    async fn test_search() {
        let catalog = catalog();

        let latin = catalog
            .search(&RecordFilter::new().with_script("Latn"))
            .await
            .unwrap();
        assert_eq!(latin.len(), 1);
        assert_eq!(latin[0].id(), "10.5281/zenodo.2");

        let recognition = catalog
            .search(&RecordFilter::new().with_model_type("recognition"))
            .await
            .unwrap();
        assert_eq!(recognition.len(), 2);

        let none = catalog
            .search(&RecordFilter::new().with_script("Latn").with_language("ara"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_search_text_is_case_insensitive() {
        let hits = catalog()
            .search(&RecordFilter::new().with_text("NASKH"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "10.5281/zenodo.5");

        let by_keyword = catalog()
            .search(&RecordFilter::new().with_text("Medieval"))
            .await
            .unwrap();
        assert_eq!(by_keyword.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_since_harvests_newer_deposits() {
        let dated = |id: &str, day: u32| {
            SourceEntry::new(
                DepositIdentity::new(id)
                    .with_publication_date(NaiveDate::from_ymd_opt(2024, 3, day).unwrap()),
            )
            .with_payload(Payload::JsonMetadata(SIDECAR.as_bytes().to_vec()))
        };
        let catalog = Catalog::new(
            InMemorySource::new()
                .with_entry(dated("10.5281/zenodo.10", 1))
                .with_entry(dated("10.5281/zenodo.11", 15))
                .with_entry(
                    SourceEntry::new(DepositIdentity::new("10.5281/zenodo.12"))
                        .with_payload(Payload::JsonMetadata(SIDECAR.as_bytes().to_vec())),
                ),
        );
        let since = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        assert_eq!(catalog.listing(None).await.unwrap().len(), 3);

        let recent = catalog.listing(Some(since)).await.unwrap();
        let ids: Vec<&str> = recent.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["10.5281/zenodo.11"]);

        let hits = catalog
            .search(&RecordFilter::new().with_script("Arab").with_published_since(since))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "10.5281/zenodo.11");
    }
}
