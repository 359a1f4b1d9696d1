//! Configuration files driving the verification workflow.

mod common;

use common::fixtures::{self, TerminalKey};
use tempfile::TempDir;
use urna_verifier::config::{ConfigManager, ExportFormat};
use urna_verifier::{ErrorKind, VerifyWorkflow};

#[test]
fn record_positions_come_from_the_config_file() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_path(dir.path().join("config.toml"));
    manager.update_value("log_index", "9").unwrap();
    manager.update_value("terminal_id_prefix_len", "2").unwrap();
    let config = manager.load().unwrap();

    let key = TerminalKey::ecdsa();
    let contents = fixtures::result_files();
    let files = fixtures::file_signature_list(&key, &contents);
    let envelope = fixtures::envelope_with(&files, Some(fixtures::certificate(&key)));

    let report = VerifyWorkflow::from_config(&config)
        .run(&envelope, &contents[0], &contents[9])
        .unwrap();
    assert!(report.success());
    assert_eq!(report.log.file_name, fixtures::FILE_NAMES[9]);
    assert_eq!(report.terminal_id, "2000401234");
}

#[test]
fn hand_written_toml_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("urna.toml");
    std::fs::write(
        &path,
        "output_format = \"json\"\n\n[record_positions]\nbulletin_index = 0\nlog_index = 10\n",
    )
    .unwrap();

    let config = ConfigManager::with_path(&path).load().unwrap();
    assert!(config.wants_json());
    assert!(config.accept_pem_certificates);
}

#[test]
fn invalid_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("urna.toml");
    std::fs::write(&path, "[record_positions]\nbulletin_index = 3\nlog_index = 3\n").unwrap();

    let err = ConfigManager::with_path(&path).load().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    std::fs::write(&path, "verbose = \"sometimes\"\n").unwrap();
    let err = ConfigManager::with_path(&path).load().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn export_then_import_round_trips() {
    let dir = TempDir::new().unwrap();
    let source = ConfigManager::with_path(dir.path().join("a.toml"));
    source.update_value("accept_pem_certificates", "false").unwrap();
    let yaml = source.export_config(ExportFormat::Yaml).unwrap();

    let target = ConfigManager::with_path(dir.path().join("b.toml"));
    target.import_config(&yaml, ExportFormat::Yaml).unwrap();
    assert_eq!(target.load().unwrap(), source.load().unwrap());
}
