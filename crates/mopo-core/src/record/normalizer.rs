//! Normalization of validated v0/v1 metadata into [`Record`]s.
//!
//! | Record field   | v0                          | v1                              |
//! |----------------|-----------------------------|---------------------------------|
//! | `model_types`  | always `{"recognition"}`    | `model_type`                    |
//! | `metrics`      | `{"accuracy": accuracy}`    | `metrics`                       |
//! | `languages`    | empty                       | `language`                      |
//! | `description`  | `description`               | model card body                 |
//! | `keywords`     | empty                       | `tags` ∪ `keywords`             |
//! | `concept_id`   | deposit only                | deposit only                    |

use super::{DepositIdentity, Record, RecordAuthor};
use crate::error::{MopoError, Result};
use crate::schema::vocab::V0_MODEL_TYPE;
use crate::schema::{MetadataBlock, MetadataSchemaVersion, ValidatedBlock, ValidationResult};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Build a [`Record`] from a `Valid` result.
///
/// `body` is the model card body for v1 and ignored for v0. Calling this
/// with an `Invalid` result, or with a `version` other than the one the
/// block was validated against, is a caller bug and yields
/// [`MopoError::Normalization`].
pub fn normalize(
    result: &ValidationResult,
    version: MetadataSchemaVersion,
    body: Option<&str>,
) -> Result<Record> {
    build(expect_valid(result, version)?, body, None)
}

/// Like [`normalize`], but takes `id`, `concept_id` and the publication
/// date from the repository deposit the metadata was found in.
pub fn normalize_deposit(
    result: &ValidationResult,
    version: MetadataSchemaVersion,
    body: Option<&str>,
    identity: &DepositIdentity,
) -> Result<Record> {
    build(expect_valid(result, version)?, body, Some(identity))
}

fn expect_valid(
    result: &ValidationResult,
    version: MetadataSchemaVersion,
) -> Result<&ValidatedBlock> {
    match result {
        ValidationResult::Valid(validated) if validated.version() == version => Ok(validated),
        ValidationResult::Valid(validated) => Err(MopoError::Normalization {
            message: format!(
                "block validated as {} cannot be normalized as {}",
                validated.version(),
                version
            ),
        }),
        ValidationResult::Invalid(violations) => Err(MopoError::Normalization {
            message: format!(
                "metadata with {} violation(s) cannot be normalized",
                violations.len()
            ),
        }),
    }
}

fn build(
    validated: &ValidatedBlock,
    body: Option<&str>,
    identity: Option<&DepositIdentity>,
) -> Result<Record> {
    let block = validated.block();
    match validated.version() {
        MetadataSchemaVersion::V0 => build_v0(block, identity),
        MetadataSchemaVersion::V1 => build_v1(block, body, identity),
    }
}

fn build_v0(block: &MetadataBlock, identity: Option<&DepositIdentity>) -> Result<Record> {
    let name = required_str(block, "name")?;
    let accuracy = block
        .get("accuracy")
        .and_then(Value::as_f64)
        .ok_or_else(|| missing("accuracy"))?;

    Ok(Record {
        id: identity.map(|i| i.id.clone()).unwrap_or_else(|| name.clone()),
        concept_id: identity.and_then(|i| i.concept_id.clone()),
        schema_version: MetadataSchemaVersion::V0,
        summary: required_str(block, "summary")?,
        description: non_empty(block.get_str("description")),
        authors: authors(block)?,
        license: required_str(block, "license")?,
        license_name: None,
        license_link: None,
        model_types: BTreeSet::from([V0_MODEL_TYPE.to_string()]),
        scripts: string_list(block, "script").collect(),
        languages: BTreeSet::new(),
        metrics: BTreeMap::from([("accuracy".to_string(), accuracy)]),
        keywords: BTreeSet::new(),
        base_models: BTreeSet::new(),
        datasets: BTreeSet::new(),
        name: Some(name),
        graphemes: string_list(block, "graphemes").collect(),
        software_name: None,
        software_hints: Vec::new(),
        citation: None,
        publication_date: identity.and_then(|i| i.publication_date),
    })
}

fn build_v1(
    block: &MetadataBlock,
    body: Option<&str>,
    identity: Option<&DepositIdentity>,
) -> Result<Record> {
    let id = match identity {
        Some(identity) => identity.id.clone(),
        None => required_str(block, "id")?,
    };
    let description = match body {
        Some(body) => non_empty(Some(body)),
        None => non_empty(block.get_str("description")),
    };
    let metrics = block
        .get("metrics")
        .and_then(Value::as_object)
        .map(|metrics| {
            metrics
                .iter()
                .filter_map(|(name, value)| value.as_f64().map(|v| (name.clone(), v)))
                .collect()
        })
        .unwrap_or_default();

    Ok(Record {
        id,
        concept_id: identity.and_then(|i| i.concept_id.clone()),
        schema_version: MetadataSchemaVersion::V1,
        summary: required_str(block, "summary")?,
        description,
        authors: authors(block)?,
        license: required_str(block, "license")?,
        license_name: non_empty(block.get_str("license_name")),
        license_link: non_empty(block.get_str("license_link")),
        model_types: string_list(block, "model_type").collect(),
        scripts: string_list(block, "script").collect(),
        languages: string_list(block, "language").collect(),
        metrics,
        keywords: string_list(block, "tags")
            .chain(string_list(block, "keywords"))
            .collect(),
        base_models: string_list(block, "base_model").collect(),
        datasets: string_list(block, "datasets").collect(),
        name: None,
        graphemes: Vec::new(),
        software_name: non_empty(block.get_str("software_name")),
        software_hints: string_list(block, "software_hints").collect(),
        citation: non_empty(block.get_str("citation")),
        publication_date: identity.and_then(|i| i.publication_date),
    })
}

fn missing(field: &str) -> MopoError {
    MopoError::Normalization {
        message: format!("validated block lacks required field '{}'", field),
    }
}

fn required_str(block: &MetadataBlock, field: &str) -> Result<String> {
    block
        .get_str(field)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| missing(field))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list<'b>(block: &'b MetadataBlock, field: &str) -> impl Iterator<Item = String> + 'b {
    block
        .get(field)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
}

fn authors(block: &MetadataBlock) -> Result<Vec<RecordAuthor>> {
    let entries = block
        .get("authors")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("authors"))?;

    Ok(entries
        .iter()
        .filter_map(Value::as_object)
        .map(|author| {
            let field = |name: &str| non_empty(author.get(name).and_then(Value::as_str));
            RecordAuthor {
                name: field("name").unwrap_or_default(),
                affiliation: field("affiliation"),
                orcid: field("orcid"),
            }
        })
        .collect())
}
