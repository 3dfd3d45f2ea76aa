//! Model card preparation for repository deposits.
//!
//! Uploading is left to the caller. This module produces the two
//! artifacts a deposit needs once the repository has pre-reserved a DOI:
//! the final `README.md` with the DOI as its `id`, and the deposit
//! metadata payload derived from it.

use crate::config::RepositoryConfig;
use crate::error::Result;
use crate::schema::frontmatter::split;
use crate::schema::{validate, MetadataBlock, MetadataSchemaVersion, ValidatedBlock};
use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// A v1 model card, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCard {
    metadata: MetadataBlock,
    body: String,
}

impl ModelCard {
    /// Split and decode a Markdown model card.
    pub fn parse(text: &str) -> Result<Self> {
        let parts = split(text)?;
        Ok(Self {
            metadata: MetadataBlock::from_front_matter(parts.metadata)?,
            body: parts.body.to_string(),
        })
    }

    pub fn metadata(&self) -> &MetadataBlock {
        &self.metadata
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// A copy of this card whose `id` is `identifier`. The original card
    /// is left as it was, so the previous version's document survives.
    pub fn with_identifier(&self, identifier: &str) -> Self {
        Self {
            metadata: self
                .metadata
                .with_field("id", Value::String(identifier.to_string())),
            body: self.body.clone(),
        }
    }

    /// Serialize back to `---\n<yaml>---\n<body>`.
    pub fn render(&self) -> Result<String> {
        let header = serde_yaml::to_string(self.metadata.as_map())?;
        Ok(format!("---\n{}---\n{}", header, self.body))
    }

    /// Validate against the v1 schema, failing with
    /// [`crate::MopoError::InvalidMetadata`].
    pub fn validate(&self) -> Result<ValidatedBlock> {
        let identifier = self.metadata.get_str("id").unwrap_or("<unidentified>");
        validate(self.metadata.clone(), MetadataSchemaVersion::V1).into_result(identifier)
    }

    /// Body rendered as HTML, for the deposit description.
    pub fn body_html(&self) -> String {
        let mut output = String::new();
        html::push_html(&mut output, Parser::new_ext(&self.body, Options::ENABLE_TABLES));
        output
    }
}

/// A deposit creator, as the repository expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Creator {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Community {
    pub identifier: String,
}

/// Link from the deposit to something it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedIdentifier {
    pub relation: String,
    pub identifier: String,
    pub resource_type: String,
}

impl RelatedIdentifier {
    fn derived_from(identifier: &str, resource_type: &str) -> Self {
        Self {
            relation: "isDerivedFrom".to_string(),
            identifier: identifier.to_string(),
            resource_type: resource_type.to_string(),
        }
    }
}

/// Deposit metadata payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositMetadata {
    pub title: String,
    pub upload_type: String,
    pub publication_type: String,
    pub description: String,
    pub creators: Vec<Creator>,
    pub access_right: String,
    pub license: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub communities: Vec<Community>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_identifiers: Vec<RelatedIdentifier>,
}

/// Everything needed to fill a deposit with a pre-reserved DOI.
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    /// Final `README.md` contents.
    pub model_card: String,
    pub deposit: DepositMetadata,
}

impl Publication {
    /// Request body for a deposit metadata update: `{"metadata": {..}}`.
    pub fn deposit_body(&self) -> Result<Value> {
        Ok(serde_json::json!({ "metadata": serde_json::to_value(&self.deposit)? }))
    }
}

/// Prepare a model card for a deposit whose DOI the repository has
/// already reserved.
///
/// The DOI becomes the card's `id` before validation, so a card may be
/// written with an empty or placeholder `id`. `private` deposits are not
/// submitted to the model community.
pub fn prepare_publication(card_text: &str, reserved_doi: &str, private: bool) -> Result<Publication> {
    let card = ModelCard::parse(card_text)?.with_identifier(reserved_doi);
    let validated = card.validate()?;
    for warning in validated.warnings() {
        warn!("{}: {}", reserved_doi, warning);
    }

    let deposit = deposit_metadata(validated.block(), card.body_html(), private);
    info!(
        "Prepared deposit {} with {} related identifier(s)",
        reserved_doi,
        deposit.related_identifiers.len()
    );

    Ok(Publication {
        model_card: card.render()?,
        deposit,
    })
}

fn deposit_metadata(block: &MetadataBlock, description: String, private: bool) -> DepositMetadata {
    let text = |field: &str| block.get_str(field).unwrap_or_default().to_string();

    let mut keywords: Vec<String> = Vec::new();
    for keyword in strings(block, "tags").chain(strings(block, "keywords")) {
        if !keywords.iter().any(|k| k == keyword) {
            keywords.push(keyword.to_string());
        }
    }

    let communities = if private {
        Vec::new()
    } else {
        vec![Community {
            identifier: RepositoryConfig::COMMUNITY.to_string(),
        }]
    };

    let related_identifiers = strings(block, "datasets")
        .map(|ds| RelatedIdentifier::derived_from(ds, "dataset"))
        .chain(strings(block, "base_model").map(|m| RelatedIdentifier::derived_from(m, "other")))
        .collect();

    DepositMetadata {
        title: text("summary"),
        upload_type: "publication".to_string(),
        publication_type: "other".to_string(),
        description,
        creators: creators(block),
        access_right: "open".to_string(),
        license: text("license"),
        keywords,
        communities,
        related_identifiers,
    }
}

fn strings<'b>(block: &'b MetadataBlock, field: &str) -> impl Iterator<Item = &'b str> {
    block
        .get(field)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn creators(block: &MetadataBlock) -> Vec<Creator> {
    block
        .get("authors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|author| {
            let field = |name: &str| {
                author
                    .get(name)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            Creator {
                name: field("name").unwrap_or_default(),
                affiliation: field("affiliation"),
                orcid: field("orcid"),
            }
        })
        .collect()
}
