//! Exit codes and structured error output for failed runs.

use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use dupebridge::actions::{PruneEngine, PruneError, PruneOptions};
use dupebridge::cli::Cli;
use dupebridge::duplicates::{DuplicateFinder, FinderConfig};
use dupebridge::error::{ExitCode, StructuredError};
use dupebridge::report::{read_report, ReadOptions, ReportWriter};
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dupebridge", "--quiet"];
    argv.extend_from_slice(args);
    dupebridge::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_exit_code_success_without_duplicates() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    fs::write(data.path().join("unique.txt"), b"unique").unwrap();
    let config = work.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let csv = work.path().join("out.csv");

    let code = run(&[
        "--config",
        config.to_str().unwrap(),
        "report",
        "--path",
        data.path().to_str().unwrap(),
        "--csv-file",
        csv.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(code.as_i32(), 0);
}

#[test]
fn test_missing_input_report_is_general_error() {
    let work = tempdir().unwrap();
    let config = work.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let missing = work.path().join("never-written.csv");

    let err = run(&[
        "--config",
        config.to_str().unwrap(),
        "prune",
        "--input-csv",
        missing.to_str().unwrap(),
    ])
    .unwrap_err();

    let code = ExitCode::for_error(&err);
    assert_eq!(code, ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("never-written.csv"));
}

#[test]
fn test_structured_error_json_fields() {
    let err = anyhow::anyhow!("input report not found: /tmp/x.csv");
    let structured = StructuredError::new(&err, ExitCode::GeneralError);
    let json: serde_json::Value = serde_json::to_value(&structured).unwrap();

    assert_eq!(json["code"], "DB001");
    assert_eq!(json["exit_code"], 1);
    assert_eq!(json["interrupted"], false);
    assert_eq!(json["message"], "input report not found: /tmp/x.csv");
}

#[test]
fn test_interrupted_scan_maps_to_130() {
    let data = tempdir().unwrap();
    fs::write(data.path().join("a"), b"dup").unwrap();
    fs::write(data.path().join("b"), b"dup").unwrap();

    let err = DuplicateFinder::new(FinderConfig::new(vec![data.path().to_path_buf()]))
        .with_shutdown_flag(Arc::new(AtomicBool::new(true)))
        .find()
        .unwrap_err();
    let err = anyhow::Error::new(err);

    assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
    assert!(StructuredError::new(&err, ExitCode::Interrupted).interrupted);
}

#[test]
fn test_interrupted_prune_keeps_files_and_maps_to_130() {
    let data = tempdir().unwrap();
    let a = data.path().join("a");
    let b = data.path().join("b");
    fs::write(&a, b"dup").unwrap();
    fs::write(&b, b"dup").unwrap();

    let outcome = DuplicateFinder::new(FinderConfig::new(vec![data.path().to_path_buf()]))
        .find()
        .unwrap();
    let text = ReportWriter::new(&outcome.checksum_index)
        .to_string()
        .unwrap()
        .replace(",false", ",true");
    let rows = dupebridge::report::read_report_from(text.as_bytes(), ReadOptions::default())
        .unwrap()
        .rows;
    assert_eq!(rows.len(), 2);

    let aborted = PruneEngine::new(PruneOptions::default())
        .with_shutdown_flag(Arc::new(AtomicBool::new(true)))
        .run(rows)
        .unwrap_err();
    assert!(matches!(aborted.source, PruneError::Interrupted));
    assert!(aborted.report.removed.is_empty());

    let err = anyhow::Error::new(aborted);
    assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_report_written_by_library_reads_back() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    fs::write(data.path().join("one"), b"same bytes").unwrap();
    fs::write(data.path().join("two"), b"same bytes").unwrap();

    let outcome = DuplicateFinder::new(FinderConfig::new(vec![data.path().to_path_buf()]))
        .find()
        .unwrap();
    let csv = work.path().join("r.csv");
    ReportWriter::new(&outcome.checksum_index)
        .write_file(&csv)
        .unwrap();

    let rows = read_report(&csv, ReadOptions::default()).unwrap().rows;
    let records: Vec<_> = outcome.checksum_index.records().collect();
    assert_eq!(rows.len(), records.len());
    for (row, record) in rows.iter().zip(records) {
        assert_eq!(row.path(), record.path);
        assert_eq!(Some(row.checksum), record.checksum);
        assert_eq!(row.size_in_bytes, Some(record.size));
    }
}
