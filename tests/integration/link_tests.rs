use clap::Parser;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symdupe::cli::Cli;
use symdupe::config::Config;
use symdupe::error::ExitCode;
use symdupe::events::{Event, MemorySink, ReplacementStatus};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str]) -> (ExitCode, Vec<Event>) {
    let cli = Cli::try_parse_from(std::iter::once("symdupe").chain(args.iter().copied())).unwrap();
    let config = Config::default().apply_cli(&cli);
    let sink = Arc::new(MemorySink::new());
    let code = symdupe::execute(&cli, &config, sink.clone()).unwrap();
    (code, sink.events())
}

/// Every entry under `root`: whether it is a symlink, plus its link target
/// or file bytes.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, (bool, Vec<u8>)> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            let meta = fs::symlink_metadata(&path).unwrap();
            if meta.file_type().is_symlink() {
                let target = fs::read_link(&path).unwrap();
                out.insert(path, (true, target.to_string_lossy().as_bytes().to_vec()));
            } else if meta.is_dir() {
                stack.push(path);
            } else {
                out.insert(path.clone(), (false, fs::read(&path).unwrap()));
            }
        }
    }
    out
}

fn replacements(events: &[Event]) -> Vec<(PathBuf, PathBuf, ReplacementStatus)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Replacement {
                duplicate,
                canonical,
                status,
                ..
            } => Some((duplicate.clone(), canonical.clone(), *status)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_dry_run_reports_and_changes_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "A/a.txt", b"abc");
    write(&root, "A/sub/b.txt", b"abc");
    write(&root, "A/c.txt", b"abd");
    let before = snapshot(&root);

    let a = root.join("A");
    let (first_code, first) = run(&["-d", a.to_str().unwrap()]);
    let (_, second) = run(&["-d", a.to_str().unwrap()]);

    assert_eq!(first_code, ExitCode::Success);
    assert_eq!(snapshot(&root), before);
    assert_eq!(
        replacements(&first),
        vec![(
            root.join("A/sub/b.txt"),
            root.join("A/a.txt"),
            ReplacementStatus::Planned
        )]
    );
    assert_eq!(replacements(&first), replacements(&second));
    assert!(first.contains(&Event::LinkSummary {
        mode: symdupe::actions::LinkMode::DryRun,
        completed: 1,
        bytes: 3,
        skipped: 0,
        failed: 0,
        interrupted: false,
    }));
}

#[cfg(unix)]
#[test]
fn test_real_run_replaces_duplicate_with_symlink() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let a = write(&root, "A/a.txt", b"abc");
    let b = write(&root, "A/sub/b.txt", b"abc");
    let c = write(&root, "A/c.txt", b"abd");

    let (code, events) = run(&["-d", root.join("A").to_str().unwrap(), "-r"]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        replacements(&events),
        vec![(b.clone(), a.clone(), ReplacementStatus::Replaced)]
    );

    let meta = fs::symlink_metadata(&b).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(fs::read_link(&b).unwrap(), a);
    assert_eq!(fs::read(&b).unwrap(), b"abc");

    assert!(fs::symlink_metadata(&a).unwrap().is_file());
    assert_eq!(fs::read(&a).unwrap(), b"abc");
    assert_eq!(fs::read(&c).unwrap(), b"abd");
}

#[cfg(unix)]
#[test]
fn test_rerun_after_real_run_converges() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "one.bin", b"0123456789");
    write(&root, "two.bin", b"0123456789");
    write(&root, "deep/three.bin", b"0123456789");
    let path = root.to_str().unwrap();

    let (_, first) = run(&["-d", path, "-r"]);
    assert_eq!(replacements(&first).len(), 2);
    let after_first = snapshot(&root);

    let (code, second) = run(&["-d", path, "-r"]);

    assert_eq!(code, ExitCode::Success);
    assert!(replacements(&second).is_empty());
    assert!(!second
        .iter()
        .any(|e| matches!(e, Event::DuplicateGroup { .. })));
    assert_eq!(snapshot(&root), after_first);
}

#[cfg(unix)]
#[test]
fn test_no_temporary_links_left_behind() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    for i in 0..5 {
        write(&root, &format!("copy{i}.dat"), b"shared payload");
    }

    run(&["-d", root.to_str().unwrap(), "-r"]);

    let names: Vec<String> = fs::read_dir(&root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 5);
    assert!(names.iter().all(|n| !n.starts_with('.')));
}

#[cfg(unix)]
#[test]
fn test_real_run_handles_long_file_names() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let a = write(&root, "a.jpg", b"same picture bytes");
    let long_name = format!("{}.jpg", "x".repeat(240));
    let b = write(&root, &long_name, b"same picture bytes");

    let (code, events) = run(&["-d", root.to_str().unwrap(), "-r"]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        replacements(&events),
        vec![(b.clone(), a.clone(), ReplacementStatus::Replaced)]
    );
    assert!(fs::symlink_metadata(&b).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&b).unwrap(), a);
    assert_eq!(fs::read(&b).unwrap(), b"same picture bytes");
}

#[test]
fn test_hardlinked_duplicate_is_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let original = write(&root, "a.txt", b"linked content");
    let link = root.join("b.txt");
    if let Err(e) = fs::hard_link(&original, &link) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let (code, events) = run(&["-d", root.to_str().unwrap(), "-r"]);

    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        replacements(&events),
        vec![(link.clone(), original.clone(), ReplacementStatus::Skipped)]
    );
    assert!(fs::symlink_metadata(&link).unwrap().is_file());
    assert!(events.iter().any(|e| matches!(
        e,
        Event::LinkSummary {
            completed: 0,
            bytes: 0,
            skipped: 1,
            ..
        }
    )));
}
