use htrmopo::{
    load_record, prepare_publication, validate_document, DepositIdentity, MetadataSchemaVersion,
    MopoError, ModelCard, ViolationKind,
};
use std::fs;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("records")
        .join(name)
}

fn load_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture should be readable")
}

#[test]
fn model_card_fixture_loads_as_v1_record() {
    let record = load_record(&load_fixture("llama_party.md"), None).unwrap();

    assert_eq!(record.schema_version(), MetadataSchemaVersion::V1);
    assert_eq!(record.id(), "10.5281/zenodo.14585602");
    assert_eq!(record.software_name(), Some("party"));
    assert_eq!(record.languages().len(), 3);
    assert!(record.scripts().contains("Latn"));
    assert_eq!(record.cer(), Some(4.1));
    assert_eq!(record.metrics().get("wer"), Some(&12.8));
    assert!(record.keywords().contains("llama"));
    assert!(record.keywords().contains("multilingual"));
    assert_eq!(record.datasets().len(), 1);
    assert_eq!(
        record.authors()[0].orcid.as_deref(),
        Some("0000-0001-9543-7827")
    );

    let description = record.description().expect("body should become the description");
    assert!(description.starts_with("# Llama party"));
    assert!(description.contains("## Training data"));
}

#[test]
fn sidecar_fixture_loads_as_v0_record() {
    let identity = DepositIdentity::new("10.5281/zenodo.8425684")
        .with_concept_id("10.5281/zenodo.8425683");
    let record = load_record(&load_fixture("urdu_best.json"), Some(&identity)).unwrap();

    assert_eq!(record.schema_version(), MetadataSchemaVersion::V0);
    assert_eq!(record.id(), "10.5281/zenodo.8425684");
    assert_eq!(record.concept_id(), Some("10.5281/zenodo.8425683"));
    assert_eq!(record.name(), Some("urdu_best"));
    assert_eq!(record.metrics().get("accuracy"), Some(&7.82));
    assert!(record.model_types().contains("recognition"));
    assert!(record.languages().is_empty());
    assert_eq!(record.graphemes().len(), 5);
}

#[test]
fn invalid_fixture_reports_every_violation() {
    let validation = validate_document(&load_fixture("invalid_party.md")).unwrap();
    assert_eq!(validation.version, MetadataSchemaVersion::V1);

    let violations = validation.result.violations();
    assert_eq!(violations.len(), 3);
    assert_eq!(violations[0].path, "model_type");
    assert_eq!(violations[0].kind, ViolationKind::MissingRequired);
    assert!(violations
        .iter()
        .any(|v| v.path == "language[0]" && v.kind == ViolationKind::PatternMismatch));
    assert!(violations
        .iter()
        .any(|v| v.path == "script[1]" && v.kind == ViolationKind::UniquenessViolation));
}

#[test]
fn invalid_fixture_fails_to_load() {
    let err = load_record(&load_fixture("invalid_party.md"), None).unwrap_err();
    assert!(matches!(err, MopoError::InvalidMetadata { .. }));
    assert_eq!(err.violations().len(), 3);
}

#[test]
fn other_license_fixture_is_valid_with_warnings() {
    let validation = validate_document(&load_fixture("other_license.md")).unwrap();
    assert!(validation.result.is_valid());

    let warned: Vec<&str> = validation
        .result
        .warnings()
        .iter()
        .map(|w| w.path.as_str())
        .collect();
    assert_eq!(warned, vec!["license_name", "license_link"]);

    let record = load_record(&load_fixture("other_license.md"), None).unwrap();
    assert_eq!(record.license_label(), "other-research");
}

#[test]
fn document_without_front_matter_is_rejected() {
    let err = load_record("# Just a README\n", None).unwrap_err();
    assert!(matches!(err, MopoError::NoFrontMatter));
    assert!(err.is_document_error());
}

#[test]
fn publication_round_trips_through_model_card() {
    let card_text = load_fixture("llama_party.md");
    let publication = prepare_publication(&card_text, "10.5281/zenodo.99999", false).unwrap();

    let card = ModelCard::parse(&publication.model_card).unwrap();
    assert_eq!(card.metadata().get_str("id"), Some("10.5281/zenodo.99999"));

    let record = load_record(&publication.model_card, None).unwrap();
    assert_eq!(record.id(), "10.5281/zenodo.99999");
    assert_eq!(publication.deposit.related_identifiers.len(), 2);
    assert_eq!(publication.deposit.keywords, vec!["multilingual", "party", "llama"]);
}
