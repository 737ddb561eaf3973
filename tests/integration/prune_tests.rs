use std::fs;

use dupebridge::actions::backup_destination;
use dupebridge::error::ExitCode;
use tempfile::tempdir;

use super::support::{empty_config, mark_for_removal, run, run_report, write_file};

fn prune(config: &std::path::Path, csv: &std::path::Path, extra: &[&str]) -> anyhow::Result<ExitCode> {
    let config = config.to_str().unwrap();
    let csv = csv.to_str().unwrap();
    let mut args = vec!["--config", config, "prune", "--input-csv", csv];
    args.extend_from_slice(extra);
    run(&args)
}

#[test]
fn test_prune_removes_only_marked_file() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let a = write_file(data.path(), "a.txt", b"duplicate body");
    let b = write_file(data.path(), "b.txt", b"duplicate body");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "b.txt");

    assert_eq!(prune(&config, &csv, &[]).unwrap(), ExitCode::Success);
    assert!(a.exists());
    assert!(!b.exists());
}

#[test]
fn test_prune_with_nothing_marked_changes_nothing() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let a = write_file(data.path(), "a.txt", b"same");
    let b = write_file(data.path(), "b.txt", b"same");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();

    assert_eq!(prune(&config, &csv, &[]).unwrap(), ExitCode::Success);
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_modified_file_is_rejected_and_kept() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"original");
    let b = write_file(data.path(), "b.txt", b"original");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "b.txt");
    // Same length, different content
    fs::write(&b, b"ORIGINAL").unwrap();

    let err = prune(&config, &csv, &[]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(b.exists());
    assert_eq!(fs::read(&b).unwrap(), b"ORIGINAL");
}

#[test]
fn test_modified_file_is_kept_when_ignoring_errors() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"original");
    let b = write_file(data.path(), "b.txt", b"original");
    let c = write_file(data.path(), "c.txt", b"original");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "b.txt");
    mark_for_removal(&csv, "c.txt");
    fs::write(&b, b"changed!").unwrap();

    let code = prune(&config, &csv, &["--ignore-errors"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(b.exists());
    assert!(!c.exists());
}

#[test]
fn test_backup_then_remove_and_rerun_fails() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let backups = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"keep me twice");
    let b = write_file(data.path(), "b.txt", b"keep me twice");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "b.txt");

    let backup_dir = backups.path().to_str().unwrap();
    prune(&config, &csv, &["--backup-dir", backup_dir]).unwrap();

    let copy = backup_destination(&b, backups.path()).unwrap();
    assert!(!b.exists());
    assert_eq!(fs::read(&copy).unwrap(), b"keep me twice");

    // The marked file is gone now, so its row no longer validates
    let err = prune(&config, &csv, &["--backup-dir", backup_dir]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert_eq!(fs::read(&copy).unwrap(), b"keep me twice");
}

#[test]
fn test_dry_run_leaves_everything_in_place() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let backups = tempdir().unwrap();
    let a = write_file(data.path(), "a.txt", b"twin");
    let b = write_file(data.path(), "b.txt", b"twin");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "a.txt");
    let report_before = fs::read(&csv).unwrap();

    let backup_dir = backups.path().to_str().unwrap();
    for _ in 0..2 {
        let code = prune(&config, &csv, &["--dry-run", "--backup-dir", backup_dir]).unwrap();
        assert_eq!(code, ExitCode::Success);
    }

    assert!(a.exists());
    assert!(b.exists());
    assert_eq!(fs::read_dir(backups.path()).unwrap().count(), 0);
    assert_eq!(fs::read(&csv).unwrap(), report_before);
}

#[test]
fn test_missing_backup_dir_fails_before_any_removal() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"twin");
    let b = write_file(data.path(), "b.txt", b"twin");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "b.txt");

    let missing = work.path().join("no-such-backups");
    let err = prune(&config, &csv, &["--backup-dir", missing.to_str().unwrap()]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(b.exists());
}

#[test]
fn test_headerless_report_with_use_first_row() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"twin");
    let b = write_file(data.path(), "b.txt", b"twin");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "b.txt");
    let text = fs::read_to_string(&csv).unwrap();
    let body: String = text.lines().skip(1).map(|l| format!("{l}\n")).collect();
    fs::write(&csv, body).unwrap();

    prune(&config, &csv, &["--use-first-row"]).unwrap();
    assert!(!b.exists());
}

#[test]
fn test_malformed_row_stops_prune_unless_ignored() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"twin");
    let b = write_file(data.path(), "b.txt", b"twin");
    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");

    run_report(&config, &[data.path()], &csv).unwrap();
    mark_for_removal(&csv, "b.txt");
    let mut text = fs::read_to_string(&csv).unwrap();
    text.push_str("only,three,fields\n");
    fs::write(&csv, text).unwrap();

    assert!(prune(&config, &csv, &[]).is_err());
    assert!(b.exists());

    prune(&config, &csv, &["--ignore-errors"]).unwrap();
    assert!(!b.exists());
}
