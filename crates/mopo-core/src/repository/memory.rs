//! In-memory record source.

use super::doi::doi_from_url;
use super::{RecordSource, SourceEntry};
use crate::error::{MopoError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

/// A fixed set of deposits held in memory.
///
/// Concept identifiers resolve to the newest deposit of the concept: the
/// one with the latest publication date, ties going to the entry added
/// last.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    entries: Vec<SourceEntry>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: SourceEntry) -> Self {
        self.insert(entry);
        self
    }

    /// Add a deposit, replacing any previous one with the same identifier.
    pub fn insert(&mut self, entry: SourceEntry) {
        self.entries.retain(|e| e.identity.id != entry.identity.id);
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&self, identifier: &str) -> Option<&SourceEntry> {
        if let Some(entry) = self.entries.iter().find(|e| e.identity.id == identifier) {
            return Some(entry);
        }
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.identity.concept_id.as_deref() == Some(identifier))
            .max_by_key(|(index, e)| (e.identity.publication_date, *index))
            .map(|(_, e)| e)
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn fetch(&self, identifier: &str) -> Result<SourceEntry> {
        let identifier = doi_from_url(identifier);
        self.resolve(&identifier)
            .cloned()
            .ok_or(MopoError::RecordNotFound { identifier })
    }

    async fn list(&self, since: Option<NaiveDate>) -> Result<Vec<SourceEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.published_since(since))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DepositIdentity;

    fn entry(id: &str, concept: &str, date: (i32, u32, u32)) -> SourceEntry {
        SourceEntry::new(
            DepositIdentity::new(id)
                .with_concept_id(concept)
                .with_publication_date(NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap()),
        )
    }

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_entry(entry("10.5281/zenodo.2", "10.5281/zenodo.1", (2024, 5, 1)))
            .with_entry(entry("10.5281/zenodo.3", "10.5281/zenodo.1", (2022, 1, 1)))
    }

    #[tokio::test]
    async fn test_fetch_by_version_id() {
        let entry = source().fetch("10.5281/zenodo.3").await.unwrap();
        assert_eq!(entry.identity.id, "10.5281/zenodo.3");
    }

    #[tokio::test]
    async fn test_fetch_by_concept_id_returns_newest() {
        let entry = source()
            .fetch("https://doi.org/10.5281/zenodo.1")
            .await
            .unwrap();
        assert_eq!(entry.identity.id, "10.5281/zenodo.2");
    }

    #[tokio::test]
    async fn test_fetch_unknown() {
        let err = source().fetch("10.5281/zenodo.99").await.unwrap_err();
        assert!(matches!(err, MopoError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_insert_replaces_same_id() {
        let mut source = source();
        source.insert(entry("10.5281/zenodo.2", "10.5281/zenodo.1", (2024, 6, 1)));
        assert_eq!(source.len(), 2);
        assert_eq!(source.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_since_filters_by_publication_date() {
        let mut source = source();
        source.insert(SourceEntry::new(DepositIdentity::new("10.5281/zenodo.4")));

        let since = NaiveDate::from_ymd_opt(2023, 1, 1);
        let recent = source.list(since).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].identity.id, "10.5281/zenodo.2");

        let on_the_day = source.list(NaiveDate::from_ymd_opt(2024, 5, 1)).await.unwrap();
        assert_eq!(on_the_day.len(), 1);
        assert_eq!(source.list(None).await.unwrap().len(), 3);
    }
}
