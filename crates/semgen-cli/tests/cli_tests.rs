//! Command tests over files in a temporary directory

use pretty_assertions::assert_eq;
use semgen_agent::{RunRequest, ValidationPolicy};
use semgen_cli::{commands, Overrides, SemgenConfig};
use semgen_test_utils::{invalid_model_json, valid_model_json, SAMPLE_CATALOG_JSON};
use std::path::PathBuf;

#[test]
fn validate_accepts_a_good_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, valid_model_json()).unwrap();

    let report = commands::validate(&path).unwrap();

    assert!(report.is_valid);
    assert!(report.fatal_issues.is_empty());
}

#[test]
fn validate_reports_fatal_issues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, invalid_model_json()).unwrap();

    let report = commands::validate(&path).unwrap();

    assert!(!report.is_valid);
    assert_eq!(report.fatal_issues.len(), 2);
}

#[test]
fn validate_rejects_non_model_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let err = commands::validate(&path).unwrap_err();

    assert!(format!("{err:#}").contains("parsing model"));
}

#[test]
fn config_file_and_overrides_combine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("semgen.toml");
    std::fs::write(
        &path,
        "output_dir = \"records\"\n\n[agent]\nmax_validation_attempts = 4\n",
    )
    .unwrap();

    let config = SemgenConfig::load(Some(&path))
        .unwrap()
        .with_overrides(Overrides {
            validation_policy: Some(ValidationPolicy::LlmGate),
            offline: true,
            ..Overrides::default()
        });

    assert_eq!(config.output_dir, PathBuf::from("records"));
    assert_eq!(config.agent.max_validation_attempts, 4);
    assert_eq!(config.agent.validation_policy, ValidationPolicy::LlmGate);
    assert!(config.osi.offline);
}

#[tokio::test]
async fn run_needs_an_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    std::fs::write(&catalog, SAMPLE_CATALOG_JSON).unwrap();

    let mut config = SemgenConfig::default();
    config.llm.api_key_env = "SEMGEN_CLI_TEST_KEY_NEVER_SET".into();
    config.output_dir = dir.path().join("out");

    let err = commands::run(&config, &catalog, RunRequest::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("SEMGEN_CLI_TEST_KEY_NEVER_SET"));
    assert!(!config.output_dir.exists());
}

#[tokio::test]
async fn run_reports_a_missing_catalog() {
    let dir = tempfile::tempdir().unwrap();

    let err = commands::run(
        &SemgenConfig::default(),
        &dir.path().join("missing.json"),
        RunRequest::new(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().starts_with("loading catalog snapshot"));
}
