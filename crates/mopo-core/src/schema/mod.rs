//! Model metadata schema: versions, metadata blocks and validation results.
//!
//! Two schema generations coexist in the repository:
//! - **v0**: a flat JSON sidecar (`metadata.json`) next to the model file.
//! - **v1**: a Markdown model card (`README.md`) with a front matter block.
//!
//! Both decode into a [`MetadataBlock`], which [`validate`] checks against
//! the declared version.
//!
//! ```text
//! raw text ──► frontmatter::split (v1 only) ──► MetadataBlock
//!                                                   │
//!                                   validator::validate(block, version)
//!                                                   │
//!                                     Valid(ValidatedBlock) | Invalid(violations)
//! ```

pub mod frontmatter;
pub mod validator;
pub mod vocab;

pub use frontmatter::{detect_version, parse_document, split, FrontMatter, ParsedDocument};
pub use validator::{validate, validate_document};

use crate::error::{MopoError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Schema generation a metadata block is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSchemaVersion {
    /// Legacy JSON sidecar.
    V0,
    /// Markdown model card with front matter.
    V1,
}

impl MetadataSchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataSchemaVersion::V0 => "v0",
            MetadataSchemaVersion::V1 => "v1",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "v0" | "0" => Some(MetadataSchemaVersion::V0),
            "v1" | "1" => Some(MetadataSchemaVersion::V1),
            _ => None,
        }
    }

    /// Name of the file a deposit stores this generation's metadata in.
    pub fn metadata_filename(&self) -> &'static str {
        match self {
            MetadataSchemaVersion::V0 => crate::config::RepositoryConfig::V0_METADATA_FILENAME,
            MetadataSchemaVersion::V1 => crate::config::RepositoryConfig::MODEL_CARD_FILENAME,
        }
    }

    /// Schema generation stored in a deposit file called `name`.
    pub fn from_filename(name: &str) -> Option<Self> {
        [MetadataSchemaVersion::V1, MetadataSchemaVersion::V0]
            .into_iter()
            .find(|version| version.metadata_filename() == name)
    }
}

impl fmt::Display for MetadataSchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded, not yet validated, metadata: a string-keyed mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataBlock(Map<String, Value>);

impl MetadataBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a v0 JSON sidecar.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| MopoError::MalformedMetadata {
            message: format!("metadata is not valid JSON: {}", e),
        })?;
        Self::from_value(value)
    }

    /// Decode the text between two front matter delimiters.
    pub fn from_front_matter(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(MopoError::MalformedMetadata {
                message: "front matter block is empty".to_string(),
            });
        }
        let value: Value = serde_yaml::from_str(text).map_err(|e| MopoError::MalformedMetadata {
            message: format!("front matter is not a valid key/value document: {}", e),
        })?;
        Self::from_value(value)
    }

    /// Wrap an already decoded value. Only mappings are metadata blocks.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(MopoError::MalformedMetadata {
                message: format!("metadata must be a mapping, found {}", json_type_name(&other)),
            }),
        }
    }

    /// Field value, treating an explicit `null` the same as an absent key.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// A copy of this block with `field` set to `value`.
    pub fn with_field(&self, field: &str, value: Value) -> Self {
        let mut map = self.0.clone();
        map.insert(field.to_string(), value);
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for MetadataBlock {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// JSON type name used in violation messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// What went wrong with one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field absent, or present but empty.
    MissingRequired,
    WrongType,
    PatternMismatch,
    /// Value outside an embedded closed vocabulary.
    EnumMismatch,
    /// Repeated entry in a list that must hold unique items.
    UniquenessViolation,
    /// Number outside its permitted bounds.
    OutOfRange,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "missing_required",
            ViolationKind::WrongType => "wrong_type",
            ViolationKind::PatternMismatch => "pattern_mismatch",
            ViolationKind::EnumMismatch => "enum_mismatch",
            ViolationKind::UniquenessViolation => "uniqueness_violation",
            ViolationKind::OutOfRange => "out_of_range",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single schema violation at a field path such as `authors[1].name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.kind, self.message)
    }
}

/// A finding that does not make the block invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaWarning {
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A metadata block that passed validation for `version`.
///
/// Only the validator constructs these, so holding one is proof that
/// the block satisfies its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBlock {
    pub(crate) version: MetadataSchemaVersion,
    pub(crate) block: MetadataBlock,
    pub(crate) warnings: Vec<SchemaWarning>,
}

impl ValidatedBlock {
    pub fn version(&self) -> MetadataSchemaVersion {
        self.version
    }

    pub fn block(&self) -> &MetadataBlock {
        &self.block
    }

    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    pub fn into_block(self) -> MetadataBlock {
        self.block
    }
}

/// Outcome of validating one metadata block.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid(ValidatedBlock),
    /// Every violation found, in stable order.
    Invalid(Vec<SchemaViolation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid(violations) => violations,
        }
    }

    pub fn warnings(&self) -> &[SchemaWarning] {
        match self {
            ValidationResult::Valid(validated) => validated.warnings(),
            ValidationResult::Invalid(_) => &[],
        }
    }

    /// Turn an `Invalid` result into `MopoError::InvalidMetadata` for
    /// callers that cannot continue without a valid block.
    pub fn into_result(self, identifier: &str) -> Result<ValidatedBlock> {
        match self {
            ValidationResult::Valid(validated) => Ok(validated),
            ValidationResult::Invalid(violations) => Err(MopoError::InvalidMetadata {
                identifier: identifier.to_string(),
                violations,
            }),
        }
    }
}
