use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use dupebridge::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupebridge::scanner::{Checksum, ScanConfig};
use sha2::{Digest, Sha256};
use tempfile::tempdir;

use super::support::write_file;

fn finder(roots: &[&std::path::Path], recursive: bool, min_size: u64) -> DuplicateFinder {
    let config = FinderConfig::new(roots.iter().map(|r| r.to_path_buf()).collect())
        .with_scan_config(ScanConfig::new(recursive, min_size));
    DuplicateFinder::new(config)
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let outcome = finder(&[dir.path()], true, 1).find().unwrap();

    assert!(outcome.checksum_index.is_empty());
    assert_eq!(outcome.summary.total_evaluated_files, 0);
    assert_eq!(outcome.summary.wasted_space, 0);
}

#[test]
fn test_scan_counts_for_one_pair() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.dat", &[1u8; 100]);
    write_file(dir.path(), "b.dat", &[1u8; 100]);
    write_file(dir.path(), "c.dat", &[2u8; 100]);

    let summary = finder(&[dir.path()], false, 1).find().unwrap().summary;

    assert_eq!(summary.total_evaluated_files, 3);
    assert_eq!(summary.size_match_sets, 1);
    assert_eq!(summary.size_match_files, 3);
    assert_eq!(summary.checksum_match_sets, 1);
    assert_eq!(summary.checksum_match_files, 2);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.wasted_space, 100);
}

#[test]
fn test_scan_nested_directories_only_when_recursive() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "top.txt", b"nested copy");
    write_file(dir.path(), "sub/deeper/inner.txt", b"nested copy");

    let flat = finder(&[dir.path()], false, 1).find().unwrap();
    assert_eq!(flat.summary.total_evaluated_files, 1);
    assert!(flat.checksum_index.is_empty());

    let deep = finder(&[dir.path()], true, 1).find().unwrap();
    assert_eq!(deep.summary.total_evaluated_files, 2);
    assert_eq!(deep.summary.duplicate_files, 1);
}

#[test]
fn test_indexed_checksums_match_file_contents() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", b"first set");
    write_file(dir.path(), "b.txt", b"first set");
    write_file(dir.path(), "c.txt", b"other set");
    write_file(dir.path(), "d.txt", b"other set");
    write_file(dir.path(), "sub/e.txt", b"other set");

    let outcome = finder(&[dir.path()], true, 1).find().unwrap();
    assert_eq!(outcome.checksum_index.len(), 2);

    for (key, records) in outcome.checksum_index.iter() {
        for record in records {
            let fresh = Checksum::compute(&record.path).unwrap();
            assert_eq!(record.checksum, Some(fresh));
            assert_eq!(*key, fresh);

            let expected = format!("{:x}", Sha256::digest(fs::read(&record.path).unwrap()));
            assert_eq!(fresh.to_string(), expected);
        }
    }
}

#[test]
fn test_min_size_excludes_small_files() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "small1.txt", b"tiny");
    write_file(dir.path(), "small2.txt", b"tiny");
    write_file(dir.path(), "big1.txt", &[9u8; 64]);
    write_file(dir.path(), "big2.txt", &[9u8; 64]);

    let outcome = finder(&[dir.path()], false, 64).find().unwrap();

    assert_eq!(outcome.summary.total_evaluated_files, 2);
    assert_eq!(outcome.summary.wasted_space, 64);
}

#[test]
fn test_empty_files_only_with_zero_threshold() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "empty1", b"");
    write_file(dir.path(), "empty2", b"");

    let outcome = finder(&[dir.path()], false, 1).find().unwrap();
    assert_eq!(outcome.summary.total_evaluated_files, 0);

    let outcome = finder(&[dir.path()], false, 0).find().unwrap();
    assert_eq!(outcome.summary.checksum_match_sets, 1);
    assert_eq!(outcome.summary.wasted_space, 0);
}

#[test]
fn test_roots_in_either_order_give_same_summary() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write_file(first.path(), "x", b"shared bytes");
    write_file(first.path(), "y", b"only here");
    write_file(second.path(), "z", b"shared bytes");

    let ab = finder(&[first.path(), second.path()], false, 1).find().unwrap();
    let ba = finder(&[second.path(), first.path()], false, 1).find().unwrap();

    assert_eq!(ab.summary, ba.summary);
    assert_eq!(ab.summary.duplicate_files, 1);
}

#[test]
fn test_higher_threshold_needs_more_copies() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "p1", b"pair");
    write_file(dir.path(), "p2", b"pair");
    write_file(dir.path(), "t1", b"triple");
    write_file(dir.path(), "t2", b"triple");
    write_file(dir.path(), "t3", b"triple");

    let config = FinderConfig::new(vec![dir.path().to_path_buf()])
        .with_scan_config(ScanConfig::new(false, 1))
        .with_duplicates_threshold(3);
    let outcome = DuplicateFinder::new(config).find().unwrap();

    assert_eq!(outcome.checksum_index.len(), 1);
    assert_eq!(outcome.summary.duplicate_files, 2);
    assert_eq!(outcome.summary.wasted_space, 12);
}

#[test]
fn test_missing_root_is_skipped_when_ignoring_errors() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("gone");
    write_file(dir.path(), "a", b"dup");
    write_file(dir.path(), "b", b"dup");

    let strict = finder(&[missing.as_path(), dir.path()], false, 1).find();
    assert!(matches!(strict, Err(FinderError::Scan(_))));

    let config = FinderConfig::new(vec![missing, dir.path().to_path_buf()])
        .with_scan_config(ScanConfig::new(false, 1))
        .with_ignore_errors(true);
    let outcome = DuplicateFinder::new(config).find().unwrap();
    assert_eq!(outcome.summary.duplicate_files, 1);
    assert_eq!(outcome.scan_errors.len(), 1);
}

#[test]
fn test_shutdown_flag_interrupts_scan() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"dup");
    write_file(dir.path(), "b", b"dup");

    let flag = Arc::new(AtomicBool::new(true));
    let result = finder(&[dir.path()], false, 1)
        .with_shutdown_flag(flag)
        .find();

    assert!(matches!(result, Err(FinderError::Interrupted)));
}
