use std::fs;

use dupebridge::config::{Config, ConfigError};
use dupebridge::error::ExitCode;
use dupebridge::report::{read_report, ReadOptions};
use tempfile::tempdir;

use super::support::{run_report, write_file};

#[test]
fn test_config_file_threshold_applies_to_report() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"pair");
    write_file(data.path(), "b.txt", b"pair");
    let config = write_file(work.path(), "config.toml", b"duplicates_threshold = 3\n");

    let csv = work.path().join("report.csv");
    run_report(&config, &[data.path()], &csv).unwrap();

    let outcome = read_report(&csv, ReadOptions::default()).unwrap();
    assert!(outcome.rows.is_empty());
}

#[test]
fn test_cli_flag_overrides_config_file() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"pair");
    write_file(data.path(), "b.txt", b"pair");
    let config = write_file(work.path(), "config.toml", b"min_size = 1000\n");

    let csv = work.path().join("report.csv");
    super::support::run(&[
        "--config",
        config.to_str().unwrap(),
        "report",
        "--path",
        data.path().to_str().unwrap(),
        "--csv-file",
        csv.to_str().unwrap(),
        "--size",
        "1",
    ])
    .unwrap();

    let outcome = read_report(&csv, ReadOptions::default()).unwrap();
    assert_eq!(outcome.rows.len(), 2);
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let config = work.path().join("absent.toml");

    let err = run_report(&config, &[data.path()], &work.path().join("r.csv")).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::FileNotFound(_))
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_invalid_threshold_in_config_is_rejected() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let config = write_file(work.path(), "config.toml", b"duplicates_threshold = 1\n");

    let err = run_report(&config, &[data.path()], &work.path().join("r.csv")).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::ThresholdTooLow(1))
    ));
}

#[test]
fn test_environment_overrides_file() {
    let work = tempdir().unwrap();
    let config = work.path().join("config.toml");
    fs::write(&config, "console_report = false\nmin_size = 10\n").unwrap();

    // Only a console-output key, so parallel runs are unaffected
    std::env::set_var("DUPEBRIDGE_CONSOLE_REPORT", "true");
    let loaded = Config::load(Some(&config));
    std::env::remove_var("DUPEBRIDGE_CONSOLE_REPORT");

    let loaded = loaded.unwrap();
    assert!(loaded.console_report);
    assert_eq!(loaded.min_size, 10);
}
