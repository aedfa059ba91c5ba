use filetime::{set_file_mtime, FileTime};
use iddedup::actions::{Deleter, RetryPolicy};
use iddedup::duplicates::SizeComparator;
use iddedup::pool::WorkerPool;
use iddedup::scanner::{PolicyKind, Scanner};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

// ===== Helpers =====

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn deleter(pool: &WorkerPool) -> Deleter {
    Deleter::new(SizeComparator::new(pool.clone()))
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)))
}

/// Scan `dir` and run one committed resolution pass over it.
fn scan_and_commit(dir: &TempDir) -> iddedup::actions::ResolutionReport {
    let pool = WorkerPool::new(4).unwrap();
    let scanner = Scanner::new(pool.clone(), PolicyKind::Identifier.build("_", 14));
    let (groups, _) = scanner.scan(dir.path()).unwrap();
    deleter(&pool).commit().delete_by_identifier(&groups)
}

// ===== Date resolution =====

#[test]
fn test_newest_date_directory_survives() {
    let dir = tempdir().unwrap();
    let old = write(dir.path(), "2024-01-01/show_20240101000000_ep01.mp4", b"aaaa");
    let mid = write(dir.path(), "2024-01-15/show_20240101000000_ep01.mp4", b"aaaa");
    let new = write(dir.path(), "2024-02-01/show_20240101000000_ep01.mp4", b"aaaa");
    let other = write(dir.path(), "2024-01-01/show_20240202000000_ep02.mp4", b"b");

    let report = scan_and_commit(&dir);

    assert!(!old.exists());
    assert!(!mid.exists());
    assert!(new.exists());
    assert!(other.exists());
    assert_eq!(report.groups_examined, 1);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.kept, 1);
    assert!(report.is_clean());
}

#[test]
fn test_sidecar_deleted_with_stale_copies() {
    let dir = tempdir().unwrap();
    let sidecar = write(dir.path(), "2024-03-02/show_20240301000000_ep.mp4.aria2", b"s");
    let old = write(dir.path(), "2024-03-01/show_20240301000000_ep.mp4", b"v");
    let new = write(dir.path(), "2024-03-02/show_20240301000000_ep.mp4", b"v");

    let report = scan_and_commit(&dir);

    assert!(!sidecar.exists());
    assert!(!old.exists());
    assert!(new.exists());
    assert_eq!(report.deleted, 2);
}

// ===== Size resolution =====

#[test]
fn test_same_date_different_sizes_both_kept() {
    let dir = tempdir().unwrap();
    // Same bucket name under different parents
    let small = write(dir.path(), "2024-04-01/show_20240401000000_ep.mp4", b"1");
    let large = write(dir.path(), "x/2024-04-01/show_20240401000000_ep.mp4", b"22");

    let report = scan_and_commit(&dir);

    assert!(small.exists());
    assert!(large.exists());
    assert_eq!(report.deleted, 0);
    assert_eq!(report.kept, 2);
}

#[test]
fn test_same_date_same_size_keeps_most_recent() {
    let dir = tempdir().unwrap();
    let older = write(dir.path(), "2024-05-01/show_20240501000000.mp4", b"same");
    let newer = write(dir.path(), "y/2024-05-01/show_20240501000000.mp4", b"same");
    set_file_mtime(&older, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
    set_file_mtime(&newer, FileTime::from_unix_time(1_700_000_500, 0)).unwrap();

    let report = scan_and_commit(&dir);

    assert!(!older.exists());
    assert!(newer.exists());
    assert_eq!(report.deleted, 1);
    assert_eq!(report.kept, 1);
}

// ===== Safety =====

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempdir().unwrap();
    let old = write(dir.path(), "2024-01-01/show_20240101000000.mp4", b"a");
    let new = write(dir.path(), "2024-01-02/show_20240101000000.mp4", b"a");

    let pool = WorkerPool::new(2).unwrap();
    let scanner = Scanner::new(pool.clone(), PolicyKind::Identifier.build("_", 14));
    let (groups, _) = scanner.scan(dir.path()).unwrap();

    let report = deleter(&pool).delete_by_identifier(&groups);

    assert!(report.dry_run);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.scheduled.len(), 1);
    assert!(old.exists());
    assert!(new.exists());
}

#[test]
fn test_commit_applies_to_one_pass_only() {
    let dir = tempdir().unwrap();
    let old = write(dir.path(), "2024-01-01/show_20240101000000.mp4", b"a");
    write(dir.path(), "2024-01-02/show_20240101000000.mp4", b"a");

    let pool = WorkerPool::new(2).unwrap();
    let scanner = Scanner::new(pool.clone(), PolicyKind::Identifier.build("_", 14));
    let (groups, _) = scanner.scan(dir.path()).unwrap();
    let mut deleter = deleter(&pool);

    deleter.commit();
    let first = deleter.delete_by_identifier(&groups);
    assert!(!first.dry_run);
    assert!(!old.exists());

    let second = deleter.delete_by_identifier(&groups);
    assert!(second.dry_run);
}

#[test]
fn test_invalid_date_bucket_skips_only_that_group() {
    let dir = tempdir().unwrap();
    let bad_a = write(dir.path(), "not-a-date/show_20240101000000.mp4", b"a");
    let bad_b = write(dir.path(), "2024-01-02/show_20240101000000.mp4", b"a");
    let good_old = write(dir.path(), "2024-06-01/show_20240601000000.mp4", b"c");
    let good_new = write(dir.path(), "2024-06-02/show_20240601000000.mp4", b"c");

    let report = scan_and_commit(&dir);

    assert!(bad_a.exists());
    assert!(bad_b.exists());
    assert!(!good_old.exists());
    assert!(good_new.exists());
    assert_eq!(report.groups_examined, 2);
    assert_eq!(report.integrity_errors, 1);
    assert!(!report.is_clean());
}
