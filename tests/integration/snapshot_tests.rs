use clap::Parser;
use iddedup::cli::Cli;
use iddedup::error::ExitCode;
use iddedup::output::{load_snapshot, save_snapshot};
use iddedup::pool::WorkerPool;
use iddedup::scanner::{PolicyKind, Scanner};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_snapshot_of_scan_reloads_identically() {
    let tree = tempdir().unwrap();
    write(tree.path(), "2024-01-01/show_20240101000000_a.mp4", b"1");
    write(tree.path(), "2024-01-02/show_20240101000000_a.mp4", b"1");
    write(tree.path(), "2024-01-02/show_20240102000000_b.mp4", b"2");

    let scanner = Scanner::new(
        WorkerPool::new(2).unwrap(),
        PolicyKind::Identifier.build("_", 14),
    );
    let (groups, _) = scanner.scan(tree.path()).unwrap();

    let out = tempdir().unwrap();
    let snapshot = out.path().join("scan_snapshot.json");
    save_snapshot(&groups, &snapshot).unwrap();

    assert_eq!(load_snapshot(&snapshot).unwrap(), groups);
}

#[test]
fn test_scan_no_resolve_then_resolve_replay() {
    let tree = tempdir().unwrap();
    let out = tempdir().unwrap();
    let config = out.path().join("absent.toml");
    let snapshot = out.path().join("snap.json");
    let old = write(tree.path(), "2024-01-01/show_20240101000000_a.mp4", b"1");
    let new = write(tree.path(), "2024-01-02/show_20240101000000_a.mp4", b"1");

    let cli = Cli::try_parse_from([
        "iddedup",
        "--config",
        config.to_str().unwrap(),
        "scan",
        tree.path().to_str().unwrap(),
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--no-resolve",
    ])
    .unwrap();
    assert_eq!(iddedup::run_app(cli).unwrap(), ExitCode::Success);
    assert!(snapshot.exists());
    assert!(old.exists());

    let cli = Cli::try_parse_from([
        "iddedup",
        "--config",
        config.to_str().unwrap(),
        "resolve",
        snapshot.to_str().unwrap(),
        "--commit",
    ])
    .unwrap();
    assert_eq!(iddedup::run_app(cli).unwrap(), ExitCode::Success);
    assert!(!old.exists());
    assert!(new.exists());
}

#[test]
fn test_resolve_hand_written_snapshot() {
    let tree = tempdir().unwrap();
    let old = write(tree.path(), "2023-12-31/clip.mp4", b"x");
    let new = write(tree.path(), "2024-01-01/clip.mp4", b"x");
    let snapshot = tree.path().join("snap.json");
    let json = serde_json::json!({ "clip": [old, new] });
    fs::write(&snapshot, json.to_string()).unwrap();

    let groups = load_snapshot(&snapshot).unwrap();
    assert_eq!(groups.get("clip").unwrap().len(), 2);

    let cli = Cli::try_parse_from([
        "iddedup",
        "--config",
        tree.path().join("absent.toml").to_str().unwrap(),
        "resolve",
        snapshot.to_str().unwrap(),
        "--commit",
    ])
    .unwrap();
    assert_eq!(iddedup::run_app(cli).unwrap(), ExitCode::Success);
    assert!(!old.exists());
    assert!(new.exists());
}

#[test]
fn test_resolve_missing_snapshot_is_fatal() {
    let dir = tempdir().unwrap();
    let cli = Cli::try_parse_from([
        "iddedup",
        "--config",
        dir.path().join("absent.toml").to_str().unwrap(),
        "resolve",
        dir.path().join("missing.json").to_str().unwrap(),
    ])
    .unwrap();

    let err = iddedup::run_app(cli).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load snapshot"));
}

#[test]
fn test_resolve_snapshot_with_repeated_path_keeps_file() {
    let tree = tempdir().unwrap();
    let only = write(tree.path(), "2024-01-01/clip.mp4", b"x");
    let snapshot = tree.path().join("snap.json");
    let json = serde_json::json!({ "clip": [only, only] });
    fs::write(&snapshot, json.to_string()).unwrap();

    let cli = Cli::try_parse_from([
        "iddedup",
        "--config",
        tree.path().join("absent.toml").to_str().unwrap(),
        "resolve",
        snapshot.to_str().unwrap(),
        "--commit",
    ])
    .unwrap();
    assert_eq!(iddedup::run_app(cli).unwrap(), ExitCode::Success);
    assert!(only.exists());
}
