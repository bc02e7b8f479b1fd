use std::fs;
use std::path::{Path, PathBuf};
use symdupe::duplicates::{DuplicateFinder, FinderConfig};
use symdupe::scanner::{FileSpecs, WalkerConfig};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn find(root: &Path, walker: WalkerConfig) -> Vec<Vec<PathBuf>> {
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));
    let (groups, _) = finder.find_duplicates(root).unwrap();
    groups.iter().map(|g| g.paths()).collect()
}

#[test]
fn test_min_size_gate() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "small1", b"tiny");
    write(&root, "small2", b"tiny");
    let big1 = write(&root, "big1", &[7u8; 100]);
    let big2 = write(&root, "big2", &[7u8; 100]);

    let groups = find(&root, WalkerConfig::default().with_min_size(10));

    assert_eq!(groups, vec![vec![big1, big2]]);
}

#[test]
fn test_max_size_gate() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let small1 = write(&root, "small1", b"tiny");
    let small2 = write(&root, "small2", b"tiny");
    write(&root, "big1", &[7u8; 100]);
    write(&root, "big2", &[7u8; 100]);

    let groups = find(&root, WalkerConfig::default().with_max_size(Some(50)));

    assert_eq!(groups, vec![vec![small1, small2]]);
}

#[test]
fn test_empty_files_never_grouped() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "empty1", b"");
    write(&root, "empty2", b"");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&root).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_file_spec_gate() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let j1 = write(&root, "one.JPG", b"jpeg");
    let j2 = write(&root, "sub/two.JPG", b"jpeg");
    write(&root, "one.txt", b"text");
    write(&root, "two.txt", b"text");

    let specs = FileSpecs::new(["*.JPG"]).unwrap();
    let groups = find(&root, WalkerConfig::default().with_file_specs(specs));

    assert_eq!(groups, vec![vec![j1, j2]]);
}

#[test]
fn test_several_file_specs_are_alternatives() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "a.jpg", b"jpeg");
    write(&root, "b.jpg", b"jpeg");
    write(&root, "a.png", b"png!");
    write(&root, "b.png", b"png!");
    write(&root, "a.txt", b"text");
    write(&root, "b.txt", b"text");

    let specs = FileSpecs::new(["*.jpg", "*.png"]).unwrap();
    let groups = find(&root, WalkerConfig::default().with_file_specs(specs));

    assert_eq!(groups.len(), 2);
    assert!(groups
        .iter()
        .flatten()
        .all(|p| p.extension().unwrap() != "txt"));
}

#[test]
fn test_excluded_dir_names_and_ignore_patterns() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let keep1 = write(&root, "keep/a.bin", b"payload");
    let keep2 = write(&root, "keep/b.bin", b"payload");
    write(&root, ".thumbnails/c.bin", b"payload");
    write(&root, "keep/d.bin.part", b"payload");

    let walker = WalkerConfig::default()
        .with_excluded_dir_names(vec![".thumbnails".to_string()])
        .with_ignore_patterns(vec!["*.part".to_string()]);
    let groups = find(&root, walker);

    assert_eq!(groups, vec![vec![keep1, keep2]]);
}

#[test]
fn test_file_outside_spec_is_never_linked() {
    use clap::Parser;
    use std::sync::Arc;
    use symdupe::cli::Cli;
    use symdupe::config::Config;
    use symdupe::events::{Event, MemorySink};

    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "a.txt", b"text");
    write(&root, "b.txt", b"text");

    let cli = Cli::try_parse_from(["symdupe", "-d", root.to_str().unwrap(), "-f", "*.jpg", "-r"])
        .unwrap();
    let sink = Arc::new(MemorySink::new());
    symdupe::execute(&cli, &Config::default().apply_cli(&cli), sink.clone()).unwrap();

    assert!(!sink
        .events()
        .iter()
        .any(|e| matches!(e, Event::Replacement { .. })));
    assert!(fs::symlink_metadata(root.join("b.txt")).unwrap().is_file());
}
