use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use symdupe::duplicates::{CanonicalOrder, DuplicateFinder, FinderConfig};
use symdupe::scanner::DigestAlgorithm;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_concrete_three_file_scenario() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "A/a.txt", b"abc");
    write(&root, "A/sub/b.txt", b"abc");
    write(&root, "A/c.txt", b"abd");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&root.join("A")).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size(), 3);
    assert_eq!(
        groups[0].paths(),
        vec![root.join("A/a.txt"), root.join("A/sub/b.txt")]
    );
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.hashed_files, 3);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 3);
}

#[test]
fn test_multiple_roots_first_root_holds_canonical() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "B/photo.jpg", b"same bytes");
    write(&root, "A/photo.jpg", b"same bytes");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder
        .find_duplicates_in_paths(&[root.join("B"), root.join("A")])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].canonical().unwrap().path, root.join("B/photo.jpg"));
    assert_eq!(groups[0].duplicates()[0].path, root.join("A/photo.jpg"));
}

#[test]
fn test_canonical_path_order_picks_smallest_path() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "B/photo.jpg", b"same bytes");
    write(&root, "A/photo.jpg", b"same bytes");

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_canonical_order(CanonicalOrder::Path),
    );
    let (groups, _) = finder
        .find_duplicates_in_paths(&[root.join("B"), root.join("A")])
        .unwrap();

    assert_eq!(groups[0].canonical().unwrap().path, root.join("A/photo.jpg"));
}

#[test]
fn test_nested_roots_are_not_scanned_twice() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "A/one.txt", b"hello");
    write(&root, "A/sub/two.txt", b"hello");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder
        .find_duplicates_in_paths(&[root.join("A/sub"), root.join("A"), root.join("A")])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_md5_and_crc32_agree_on_groups() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "x1", b"content x");
    write(&root, "x2", b"content x");
    write(&root, "y1", b"content y");
    write(&root, "y2", b"content y");
    write(&root, "z", b"content z");

    let crc = DuplicateFinder::with_defaults().find_duplicates(&root).unwrap().0;
    let md5 = DuplicateFinder::new(FinderConfig::default().with_algorithm(DigestAlgorithm::Md5))
        .find_duplicates(&root)
        .unwrap()
        .0;

    let crc_paths: Vec<_> = crc.iter().map(|g| g.paths()).collect();
    let md5_paths: Vec<_> = md5.iter().map(|g| g.paths()).collect();
    assert_eq!(crc_paths, md5_paths);
    assert_eq!(crc_paths.len(), 2);
    assert_eq!(crc[0].digest().to_hex().len(), 8);
    assert_eq!(md5[0].digest().to_hex().len(), 32);
}

#[test]
fn test_modification_time_is_ignored() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let old = write(&root, "old.bin", b"payload");
    let new = write(&root, "new.bin", b"payload");
    set_file_mtime(&old, FileTime::from_unix_time(1_000_000, 0)).unwrap();
    set_file_mtime(&new, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults().find_duplicates(&root).unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].contains(&old));
    assert!(groups[0].contains(&new));
}

#[test]
fn test_same_size_different_content_is_not_a_group() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "a", &[0u8; 10_000]);
    let mut other = vec![0u8; 10_000];
    other[9_999] = 1;
    write(&root, "b", &other);

    let (groups, summary) = DuplicateFinder::with_defaults().find_duplicates(&root).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.hashed_files, 2);
}

#[test]
fn test_metadata_directories_are_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "photo.jpg", b"jpeg bytes");
    write(&root, "@eaDir/photo.jpg/SYNOPHOTO_THUMB.jpg", b"jpeg bytes");

    let (groups, summary) = DuplicateFinder::with_defaults().find_duplicates(&root).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}
