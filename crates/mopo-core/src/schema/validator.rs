//! Schema validation for v0 and v1 metadata blocks.
//!
//! Validation is exhaustive: every problem in a block is reported in one
//! pass. Violations come out in a stable order:
//! 1. `MissingRequired` for absent required fields, in declaration order.
//! 2. Per-field checks for present fields, in declaration order, with list
//!    entries in list order.
//!
//! Validation never touches the network. Open vocabularies are checked
//! by shape only.

use super::vocab::{self, LANGUAGE_CODE, ORCID, SCRIPT_CODE};
use super::{
    json_type_name, parse_document, MetadataBlock, MetadataSchemaVersion, SchemaViolation,
    SchemaWarning, ValidatedBlock, ValidationResult, ViolationKind,
};
use crate::error::Result;
use serde_json::Value;
use std::collections::HashSet;

/// How a single field is checked once present.
#[derive(Debug, Clone, Copy)]
enum FieldRule {
    /// String; `non_empty` rejects `""`.
    Text { non_empty: bool },
    /// Number within inclusive bounds.
    Number { min: f64, max: f64 },
    /// Single URI string.
    Uri,
    /// List of strings.
    TextList { unique: bool, items: ItemRule },
    /// List of `{name, affiliation?, orcid?}` mappings.
    Authors { affiliation_required: bool },
    /// Mapping of metric name to number.
    Metrics,
}

/// Constraint on each entry of a string list.
#[derive(Debug, Clone, Copy)]
enum ItemRule {
    Any,
    /// Closed ISO 15924 list embedded in the v0 schema.
    V0Script,
    ScriptCode,
    LanguageCode,
    Uri,
    /// Exactly one code point.
    Grapheme,
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    required: bool,
    rule: FieldRule,
}

const fn required(name: &'static str, rule: FieldRule) -> FieldSpec {
    FieldSpec {
        name,
        required: true,
        rule,
    }
}

const fn optional(name: &'static str, rule: FieldRule) -> FieldSpec {
    FieldSpec {
        name,
        required: false,
        rule,
    }
}

const TEXT: FieldRule = FieldRule::Text { non_empty: true };
const ANY_TEXT: FieldRule = FieldRule::Text { non_empty: false };

const V0_FIELDS: &[FieldSpec] = &[
    required(
        "authors",
        FieldRule::Authors {
            affiliation_required: true,
        },
    ),
    required("summary", TEXT),
    required("description", ANY_TEXT),
    required(
        "accuracy",
        FieldRule::Number {
            min: 0.0,
            max: 100.0,
        },
    ),
    required("license", TEXT),
    required(
        "script",
        FieldRule::TextList {
            unique: true,
            items: ItemRule::V0Script,
        },
    ),
    required("name", TEXT),
    required(
        "graphemes",
        FieldRule::TextList {
            unique: false,
            items: ItemRule::Grapheme,
        },
    ),
];

const V1_FIELDS: &[FieldSpec] = &[
    required("id", TEXT),
    required(
        "authors",
        FieldRule::Authors {
            affiliation_required: false,
        },
    ),
    required("summary", TEXT),
    optional("description", ANY_TEXT),
    required("license", TEXT),
    optional("license_name", TEXT),
    optional("license_link", FieldRule::Uri),
    required("software_name", TEXT),
    optional(
        "software_hints",
        FieldRule::TextList {
            unique: false,
            items: ItemRule::Any,
        },
    ),
    required(
        "language",
        FieldRule::TextList {
            unique: true,
            items: ItemRule::LanguageCode,
        },
    ),
    required(
        "script",
        FieldRule::TextList {
            unique: true,
            items: ItemRule::ScriptCode,
        },
    ),
    required(
        "model_type",
        FieldRule::TextList {
            unique: true,
            items: ItemRule::Any,
        },
    ),
    optional("metrics", FieldRule::Metrics),
    optional(
        "tags",
        FieldRule::TextList {
            unique: false,
            items: ItemRule::Any,
        },
    ),
    optional(
        "keywords",
        FieldRule::TextList {
            unique: false,
            items: ItemRule::Any,
        },
    ),
    optional(
        "datasets",
        FieldRule::TextList {
            unique: true,
            items: ItemRule::Uri,
        },
    ),
    optional(
        "base_model",
        FieldRule::TextList {
            unique: true,
            items: ItemRule::Uri,
        },
    ),
    optional("citation", FieldRule::Uri),
];

fn fields_for(version: MetadataSchemaVersion) -> &'static [FieldSpec] {
    match version {
        MetadataSchemaVersion::V0 => V0_FIELDS,
        MetadataSchemaVersion::V1 => V1_FIELDS,
    }
}

/// Names of the required fields of `version`, in declaration order.
pub fn required_fields(version: MetadataSchemaVersion) -> Vec<&'static str> {
    fields_for(version)
        .iter()
        .filter(|spec| spec.required)
        .map(|spec| spec.name)
        .collect()
}

/// Validate `block` against the schema of `version`.
pub fn validate(block: MetadataBlock, version: MetadataSchemaVersion) -> ValidationResult {
    let fields = fields_for(version);
    let mut collector = Collector::default();

    for spec in fields.iter().filter(|spec| spec.required) {
        if !block.contains(spec.name) {
            collector.violation(
                spec.name,
                ViolationKind::MissingRequired,
                "required field is missing",
            );
        }
    }

    for spec in fields {
        if let Some(value) = block.get(spec.name) {
            collector.check_field(spec.name, spec.rule, value);
        }
    }

    if version == MetadataSchemaVersion::V1 {
        collector.check_license_convention(&block);
    }

    if collector.violations.is_empty() {
        ValidationResult::Valid(ValidatedBlock {
            version,
            block,
            warnings: collector.warnings,
        })
    } else {
        ValidationResult::Invalid(collector.violations)
    }
}

/// Result of validating a raw document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentValidation {
    pub version: MetadataSchemaVersion,
    pub result: ValidationResult,
    /// Model card body; `None` for v0 sidecars.
    pub body: Option<String>,
}

/// Decode `content` (v0 JSON or v1 model card) and validate it.
///
/// Structural document errors are returned as `Err`; schema problems are
/// reported through [`DocumentValidation::result`].
pub fn validate_document(content: &str) -> Result<DocumentValidation> {
    let parsed = parse_document(content)?;
    Ok(DocumentValidation {
        version: parsed.version,
        result: validate(parsed.block, parsed.version),
        body: parsed.body,
    })
}

#[derive(Default)]
struct Collector {
    violations: Vec<SchemaViolation>,
    warnings: Vec<SchemaWarning>,
}

impl Collector {
    fn violation(&mut self, path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) {
        self.violations
            .push(SchemaViolation::new(path, kind, message));
    }

    fn wrong_type(&mut self, path: &str, expected: &str, found: &Value) {
        self.violation(
            path,
            ViolationKind::WrongType,
            format!("expected {}, found {}", expected, json_type_name(found)),
        );
    }

    fn check_field(&mut self, path: &str, rule: FieldRule, value: &Value) {
        match rule {
            FieldRule::Text { non_empty } => {
                self.check_text(path, value, non_empty);
            }
            FieldRule::Number { min, max } => match value.as_f64() {
                Some(n) if n < min || n > max => self.violation(
                    path,
                    ViolationKind::OutOfRange,
                    format!("{} is outside [{}, {}]", n, min, max),
                ),
                Some(_) => {}
                None => self.wrong_type(path, "number", value),
            },
            // Every URI field is optional, so an empty string is a bad URI.
            FieldRule::Uri => {
                if let Some(s) = self.check_text(path, value, false) {
                    self.check_item(path, ItemRule::Uri, s);
                }
            }
            FieldRule::TextList { unique, items } => self.check_text_list(path, value, unique, items),
            FieldRule::Authors {
                affiliation_required,
            } => self.check_authors(path, value, affiliation_required),
            FieldRule::Metrics => self.check_metrics(path, value),
        }
    }

    /// Check a string value, returning it when it is a string.
    fn check_text<'v>(&mut self, path: &str, value: &'v Value, non_empty: bool) -> Option<&'v str> {
        let Some(s) = value.as_str() else {
            self.wrong_type(path, "string", value);
            return None;
        };
        if non_empty && s.trim().is_empty() {
            self.violation(path, ViolationKind::MissingRequired, "must not be empty");
        }
        Some(s)
    }

    fn check_text_list(&mut self, path: &str, value: &Value, unique: bool, items: ItemRule) {
        let Some(entries) = value.as_array() else {
            self.wrong_type(path, "list", value);
            return;
        };
        if entries.is_empty() {
            self.violation(
                path,
                ViolationKind::MissingRequired,
                "must contain at least one entry",
            );
            return;
        }

        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let item_path = format!("{}[{}]", path, index);
            let Some(s) = entry.as_str() else {
                self.wrong_type(&item_path, "string", entry);
                continue;
            };
            self.check_item(&item_path, items, s);
            if unique && !seen.insert(s) {
                self.violation(
                    &item_path,
                    ViolationKind::UniquenessViolation,
                    format!("'{}' appears more than once", s),
                );
            }
        }
    }

    fn check_item(&mut self, path: &str, rule: ItemRule, s: &str) {
        match rule {
            ItemRule::Any => {
                if s.trim().is_empty() {
                    self.violation(path, ViolationKind::MissingRequired, "must not be empty");
                }
            }
            ItemRule::V0Script => {
                if !vocab::is_v0_script(s) {
                    self.violation(
                        path,
                        ViolationKind::EnumMismatch,
                        format!("'{}' is not a known ISO 15924 script code", s),
                    );
                }
            }
            ItemRule::ScriptCode => {
                if !SCRIPT_CODE.is_match(s) {
                    self.violation(
                        path,
                        ViolationKind::PatternMismatch,
                        format!("'{}' is not an ISO 15924 code (e.g. Latn)", s),
                    );
                }
            }
            ItemRule::LanguageCode => {
                if !LANGUAGE_CODE.is_match(s) {
                    self.violation(
                        path,
                        ViolationKind::PatternMismatch,
                        format!("'{}' is not an ISO 639-3 code (e.g. eng)", s),
                    );
                }
            }
            ItemRule::Uri => {
                if !vocab::is_uri(s) {
                    self.violation(
                        path,
                        ViolationKind::PatternMismatch,
                        format!("'{}' is not a URI", s),
                    );
                }
            }
            ItemRule::Grapheme => {
                if s.chars().count() != 1 {
                    self.violation(
                        path,
                        ViolationKind::PatternMismatch,
                        format!("'{}' is not a single code point", s),
                    );
                }
            }
        }
    }

    fn check_authors(&mut self, path: &str, value: &Value, affiliation_required: bool) {
        let Some(authors) = value.as_array() else {
            self.wrong_type(path, "list", value);
            return;
        };
        if authors.is_empty() {
            self.violation(
                path,
                ViolationKind::MissingRequired,
                "must contain at least one author",
            );
            return;
        }

        for (index, author) in authors.iter().enumerate() {
            let author_path = format!("{}[{}]", path, index);
            let Some(fields) = author.as_object() else {
                self.wrong_type(&author_path, "mapping", author);
                continue;
            };
            let field = |name: &str| fields.get(name).filter(|v| !v.is_null());

            let name_path = format!("{}.name", author_path);
            match field("name") {
                Some(name) => {
                    self.check_text(&name_path, name, true);
                }
                None => self.violation(
                    name_path,
                    ViolationKind::MissingRequired,
                    "required field is missing",
                ),
            }

            let affiliation_path = format!("{}.affiliation", author_path);
            match field("affiliation") {
                Some(affiliation) => {
                    self.check_text(&affiliation_path, affiliation, affiliation_required);
                }
                None if affiliation_required => self.violation(
                    affiliation_path,
                    ViolationKind::MissingRequired,
                    "required field is missing",
                ),
                None => {}
            }

            if let Some(orcid) = field("orcid") {
                let orcid_path = format!("{}.orcid", author_path);
                if let Some(s) = self.check_text(&orcid_path, orcid, true) {
                    if !s.is_empty() && !ORCID.is_match(s) {
                        self.violation(
                            orcid_path,
                            ViolationKind::PatternMismatch,
                            format!("'{}' is not an ORCID iD (0000-0000-0000-0000)", s),
                        );
                    }
                }
            }
        }
    }

    fn check_metrics(&mut self, path: &str, value: &Value) {
        let Some(metrics) = value.as_object() else {
            self.wrong_type(path, "mapping", value);
            return;
        };
        for (name, metric) in metrics {
            if !metric.is_number() {
                self.wrong_type(&format!("{}.{}", path, name), "number", metric);
            }
        }
    }

    /// `other-*` licenses should name and link the actual license. This is
    /// a soft check since the license vocabulary lives outside the schema.
    fn check_license_convention(&mut self, block: &MetadataBlock) {
        let Some(license) = block.get_str("license") else {
            return;
        };
        if !vocab::is_other_license(license) {
            return;
        }
        for field in ["license_name", "license_link"] {
            if !block.contains(field) {
                self.warnings.push(SchemaWarning {
                    path: field.to_string(),
                    message: format!("should be set when license is '{}'", license),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(value: Value) -> MetadataBlock {
        MetadataBlock::from_value(value).unwrap()
    }

    fn party_block() -> Value {
        json!({
            "id": "foo",
            "summary": "Pretrained multilingual Party model",
            "authors": [{"name": "Benjamin Kiessling"}],
            "license": "Apache-2.0",
            "software_name": "party",
            "language": ["ang"],
            "model_type": ["recognition"],
        })
    }

    fn urdu_block() -> Value {
        json!({
            "authors": [{"name": "Benjamin Kiessling", "affiliation": "EPHE"}],
            "summary": "Urdu recognition model",
            "description": "Trained on printed Urdu.",
            "accuracy": 7.82,
            "license": "Apache-2.0",
            "script": ["Arab"],
            "name": "urdu_best",
            "graphemes": ["ا", "ب", " "],
        })
    }

    fn kinds(result: &ValidationResult) -> Vec<(String, ViolationKind)> {
        result
            .violations()
            .iter()
            .map(|v| (v.path.clone(), v.kind))
            .collect()
    }

    #[test]
    fn test_v1_missing_script() {
        let result = validate(block(party_block()), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![("script".to_string(), ViolationKind::MissingRequired)]
        );
    }

    #[test]
    fn test_v1_complete_block_is_valid() {
        let mut value = party_block();
        value["script"] = json!(["Latn"]);
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert!(result.is_valid(), "{:?}", result.violations());
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_missing_required_fields_in_declaration_order() {
        let result = validate(block(json!({"summary": "x"})), MetadataSchemaVersion::V1);
        let paths: Vec<_> = result.violations().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "id",
                "authors",
                "license",
                "software_name",
                "language",
                "script",
                "model_type"
            ]
        );
        assert!(result
            .violations()
            .iter()
            .all(|v| v.kind == ViolationKind::MissingRequired));
        assert_eq!(paths, required_fields(MetadataSchemaVersion::V1)
            .into_iter()
            .filter(|f| *f != "summary")
            .collect::<Vec<_>>());
    }

    #[test]
    fn test_duplicate_script_reported_once_at_second_occurrence() {
        let mut value = party_block();
        value["script"] = json!(["Latn", "Latn"]);
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![("script[1]".to_string(), ViolationKind::UniquenessViolation)]
        );
    }

    #[test]
    fn test_every_later_duplicate_is_reported() {
        let mut value = party_block();
        value["script"] = json!(["Latn", "Grek", "Latn", "Latn"]);
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![
                ("script[2]".to_string(), ViolationKind::UniquenessViolation),
                ("script[3]".to_string(), ViolationKind::UniquenessViolation),
            ]
        );
    }

    #[test]
    fn test_v1_pattern_and_type_checks_are_exhaustive() {
        let mut value = party_block();
        value["script"] = json!(["latin", 5]);
        value["language"] = json!(["en"]);
        value["authors"] = json!([{"name": "A"}, {"affiliation": "B"}, {"name": "", "orcid": "123"}]);
        value["metrics"] = json!({"cer": 1.0, "wer": "low"});
        value["base_model"] = json!(["not a uri"]);
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![
                ("authors[1].name".to_string(), ViolationKind::MissingRequired),
                ("authors[2].name".to_string(), ViolationKind::MissingRequired),
                ("authors[2].orcid".to_string(), ViolationKind::PatternMismatch),
                ("language[0]".to_string(), ViolationKind::PatternMismatch),
                ("script[0]".to_string(), ViolationKind::PatternMismatch),
                ("script[1]".to_string(), ViolationKind::WrongType),
                ("metrics.wer".to_string(), ViolationKind::WrongType),
                ("base_model[0]".to_string(), ViolationKind::PatternMismatch),
            ]
        );
    }

    #[test]
    fn test_empty_required_list_is_missing() {
        let mut value = party_block();
        value["script"] = json!([]);
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![("script".to_string(), ViolationKind::MissingRequired)]
        );
    }

    #[test]
    fn test_wrong_container_type() {
        let mut value = party_block();
        value["script"] = json!("Latn");
        value["authors"] = json!({"name": "x"});
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![
                ("authors".to_string(), ViolationKind::WrongType),
                ("script".to_string(), ViolationKind::WrongType),
            ]
        );
    }

    #[test]
    fn test_other_license_is_a_soft_warning() {
        let mut value = party_block();
        value["script"] = json!(["Latn"]);
        value["license"] = json!("other-custom");
        value["license_name"] = json!("Custom research license");
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert!(result.is_valid());
        let warnings = result.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "license_link");
    }

    #[test]
    fn test_v0_valid() {
        let result = validate(block(urdu_block()), MetadataSchemaVersion::V0);
        assert!(result.is_valid(), "{:?}", result.violations());
    }

    #[test]
    fn test_v0_script_enum_and_accuracy_range() {
        let mut value = urdu_block();
        value["script"] = json!(["Arab", "Abcd"]);
        value["accuracy"] = json!(101.5);
        value["graphemes"] = json!(["ab", "c"]);
        value["authors"] = json!([{"name": "A"}]);
        let result = validate(block(value), MetadataSchemaVersion::V0);
        assert_eq!(
            kinds(&result),
            vec![
                ("authors[0].affiliation".to_string(), ViolationKind::MissingRequired),
                ("accuracy".to_string(), ViolationKind::OutOfRange),
                ("script[1]".to_string(), ViolationKind::EnumMismatch),
                ("graphemes[0]".to_string(), ViolationKind::PatternMismatch),
            ]
        );
    }

    #[test]
    fn test_v0_accuracy_bounds_are_inclusive() {
        for accuracy in [json!(0.0), json!(100.0), json!(0), json!(100)] {
            let mut value = urdu_block();
            value["accuracy"] = accuracy.clone();
            let result = validate(block(value), MetadataSchemaVersion::V0);
            assert!(result.is_valid(), "{}: {:?}", accuracy, result.violations());
        }

        let mut value = urdu_block();
        value["accuracy"] = json!(-0.1);
        let result = validate(block(value), MetadataSchemaVersion::V0);
        assert_eq!(
            kinds(&result),
            vec![("accuracy".to_string(), ViolationKind::OutOfRange)]
        );
    }

    #[test]
    fn test_v0_combining_sequence_is_not_one_grapheme() {
        let mut value = urdu_block();
        value["graphemes"] = json!(["e\u{301}", "\u{e9}"]);
        let result = validate(block(value), MetadataSchemaVersion::V0);
        assert_eq!(
            kinds(&result),
            vec![("graphemes[0]".to_string(), ViolationKind::PatternMismatch)]
        );
    }

    #[test]
    fn test_empty_optional_uri_is_pattern_mismatch() {
        let mut value = party_block();
        value["citation"] = json!("");
        value["license_link"] = json!("  ");
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![
                ("license_link".to_string(), ViolationKind::PatternMismatch),
                ("citation".to_string(), ViolationKind::PatternMismatch),
            ]
        );
    }

    #[test]
    fn test_v0_block_is_not_a_v1_block() {
        let result = validate(block(urdu_block()), MetadataSchemaVersion::V1);
        assert!(!result.is_valid());
        assert!(result
            .violations()
            .iter()
            .any(|v| v.path == "id" && v.kind == ViolationKind::MissingRequired));
    }

    #[test]
    fn test_null_required_field_is_missing() {
        let mut value = party_block();
        value["script"] = Value::Null;
        let result = validate(block(value), MetadataSchemaVersion::V1);
        assert_eq!(
            kinds(&result),
            vec![("script".to_string(), ViolationKind::MissingRequired)]
        );
    }

    #[test]
    fn test_validate_document() {
        let doc = "---\nid: foo\nsummary: s\nauthors:\n  - name: A\nlicense: MIT\nsoftware_name: kraken\nlanguage: [eng]\nscript: [Latn]\nmodel_type: [segmentation]\n---\nBody\n";
        let outcome = validate_document(doc).unwrap();
        assert_eq!(outcome.version, MetadataSchemaVersion::V1);
        assert!(outcome.result.is_valid());
        assert_eq!(outcome.body.as_deref(), Some("Body\n"));

        assert!(validate_document("---\nid: foo\n").is_err());
    }
}
