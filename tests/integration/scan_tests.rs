use iddedup::pool::WorkerPool;
use iddedup::scanner::{PolicyKind, Scanner};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use walkdir::WalkDir;

fn scanner(kind: PolicyKind, workers: usize) -> Scanner {
    Scanner::new(WorkerPool::new(workers).unwrap(), kind.build("_", 14))
}

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn regular_file_count(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (groups, stats) = scanner(PolicyKind::Identifier, 4).scan(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(stats.files, 0);
    assert_eq!(stats.directories, 1);
    assert!(!stats.has_errors());
}

#[test]
fn test_scan_groups_identifier_across_date_directories() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("2024-01-01/show_20240101000000_ep01.mp4"), b"old");
    write(&dir.path().join("2024-01-02/show_20240101000000_ep01.mp4"), b"new");
    write(&dir.path().join("2024-02-02/show_20240202000000_ep02.mp4"), b"other");

    let (groups, stats) = scanner(PolicyKind::Identifier, 4).scan(dir.path()).unwrap();

    assert_eq!(stats.files, 3);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups.get("20240101000000").unwrap().len(), 2);
    assert_eq!(groups.get("20240202000000").unwrap().len(), 1);
    assert_eq!(groups.duplicated().count(), 1);
}

#[test]
fn test_scan_every_regular_file_lands_in_exactly_one_group() {
    let dir = tempdir().unwrap();
    for day in 1..=5 {
        for ep in 0..7 {
            write(
                &dir.path()
                    .join(format!("2024-03-0{day}"))
                    .join(format!("nested/deeper/show_2024030{ep}000000_x.mkv")),
                b"data",
            );
        }
    }
    write(&dir.path().join("loose.txt"), b"no identifier here");

    let (groups, stats) = scanner(PolicyKind::Identifier, 3).scan(dir.path()).unwrap();

    let expected = regular_file_count(dir.path());
    assert_eq!(stats.files, expected);
    assert_eq!(groups.total_paths(), expected);
    // 7 identifiers plus the single-token name
    assert_eq!(groups.len(), 8);
    assert_eq!(groups.get("loose.txt").unwrap().len(), 1);
}

#[test]
fn test_scan_worker_count_does_not_change_result() {
    let dir = tempdir().unwrap();
    for i in 0..50 {
        write(
            &dir.path().join(format!("d{}/e{}/f_{:014}_{}.bin", i % 5, i % 3, i % 10, i)),
            b"x",
        );
    }

    let (one, _) = scanner(PolicyKind::Identifier, 1).scan(dir.path()).unwrap();
    let (many, _) = scanner(PolicyKind::Identifier, 16).scan(dir.path()).unwrap();

    assert_eq!(one.len(), many.len());
    assert_eq!(one.total_paths(), many.total_paths());
    for (id, paths) in one.iter() {
        let mut a = paths.to_vec();
        let mut b = many.get(id).unwrap().to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b, "identifier {id}");
    }
}

#[test]
fn test_scan_extension_policy() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a/one.MP4"), b"1");
    write(&dir.path().join("b/two.mp4"), b"2");
    write(&dir.path().join("c/three.srt"), b"3");
    write(&dir.path().join("c/README"), b"4");

    let (groups, _) = scanner(PolicyKind::Extension, 2).scan(dir.path()).unwrap();

    assert_eq!(groups.get("mp4").unwrap().len(), 2);
    assert_eq!(groups.get("srt").unwrap().len(), 1);
    assert_eq!(groups.get("").unwrap().len(), 1);
}

#[test]
fn test_scan_path_policy_never_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("2024-01-01/show_20240101000000.mp4"), b"1");
    write(&dir.path().join("2024-01-02/show_20240101000000.mp4"), b"2");

    let (groups, _) = scanner(PolicyKind::Path, 2).scan(dir.path()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups.duplicated().count(), 0);
}

#[test]
fn test_scan_missing_root_fails() {
    let dir = tempdir().unwrap();
    let result = scanner(PolicyKind::Identifier, 2).scan(&dir.path().join("absent"));
    assert!(result.is_err());
}
