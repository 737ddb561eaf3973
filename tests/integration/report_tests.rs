use std::fs;

use dupebridge::error::ExitCode;
use dupebridge::report::{read_report, ReadOptions, HEADER};
use dupebridge::scanner::Checksum;
use tempfile::tempdir;

use super::support::{empty_config, run_report, write_file};

#[test]
fn test_report_lists_only_confirmed_duplicates() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let payload = [b'x'; 100];
    write_file(data.path(), "a.bin", &payload);
    write_file(data.path(), "b.bin", &payload);
    write_file(data.path(), "c.bin", &[b'y'; 100]);

    let csv = work.path().join("report.csv");
    let code = run_report(&empty_config(work.path()), &[data.path()], &csv).unwrap();
    assert_eq!(code, ExitCode::Success);

    let outcome = read_report(&csv, ReadOptions::default()).unwrap();
    assert!(outcome.skipped.is_empty());
    assert_eq!(outcome.rows.len(), 2);

    let expected = Checksum::compute(&data.path().join("a.bin")).unwrap();
    for row in &outcome.rows {
        assert_eq!(row.checksum, expected);
        assert_eq!(row.size_in_bytes, Some(100));
        assert!(!row.remove);
        assert_eq!(row.directory, data.path());
    }
    let names: Vec<_> = outcome.rows.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(names, ["a.bin", "b.bin"]);
}

#[test]
fn test_report_without_duplicates_has_only_header() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "one.txt", b"one");
    write_file(data.path(), "two.txt", b"two");

    let csv = work.path().join("report.csv");
    run_report(&empty_config(work.path()), &[data.path()], &csv).unwrap();

    let text = fs::read_to_string(&csv).unwrap();
    assert_eq!(text.trim_end(), HEADER.join(","));
}

#[test]
fn test_report_replaces_existing_file() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"same");
    write_file(data.path(), "b.txt", b"same");

    let csv = write_file(work.path(), "report.csv", b"stale contents\n");
    run_report(&empty_config(work.path()), &[data.path()], &csv).unwrap();

    let text = fs::read_to_string(&csv).unwrap();
    assert!(text.starts_with("directory,file,size,size_in_bytes,checksum,remove_file"));
    assert!(!text.contains("stale"));
}

#[test]
fn test_report_missing_output_directory_fails() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a.txt", b"same");

    let csv = work.path().join("missing").join("report.csv");
    let err = run_report(&empty_config(work.path()), &[data.path()], &csv).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(!csv.exists());
}

#[test]
fn test_report_missing_root_fails() {
    let work = tempdir().unwrap();
    let missing = work.path().join("nowhere");
    let csv = work.path().join("report.csv");

    let err = run_report(&empty_config(work.path()), &[missing.as_path()], &csv).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(!csv.exists());
}

#[test]
fn test_report_spans_several_roots() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(first.path(), "photo.jpg", b"pixels");
    write_file(second.path(), "copy-of-photo.jpg", b"pixels");

    let csv = work.path().join("report.csv");
    run_report(
        &empty_config(work.path()),
        &[first.path(), second.path()],
        &csv,
    )
    .unwrap();

    let outcome = read_report(&csv, ReadOptions::default()).unwrap();
    let dirs: Vec<_> = outcome.rows.iter().map(|r| r.directory.clone()).collect();
    assert_eq!(outcome.rows.len(), 2);
    assert!(dirs.contains(&first.path().to_path_buf()));
    assert!(dirs.contains(&second.path().to_path_buf()));
}

#[test]
fn test_blank_line_between_sets_reads_back() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    write_file(data.path(), "a1.txt", b"alpha");
    write_file(data.path(), "a2.txt", b"alpha");
    write_file(data.path(), "b1.txt", b"bravo!");
    write_file(data.path(), "b2.txt", b"bravo!");

    let config = empty_config(work.path());
    let csv = work.path().join("report.csv");
    super::support::run(&[
        "--config",
        config.to_str().unwrap(),
        "report",
        "--path",
        data.path().to_str().unwrap(),
        "--csv-file",
        csv.to_str().unwrap(),
        "--blank-line",
    ])
    .unwrap();

    let outcome = read_report(&csv, ReadOptions::default()).unwrap();
    assert_eq!(outcome.rows.len(), 4);
    assert_eq!(outcome.blank_rows, 1);
}
