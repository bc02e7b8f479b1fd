#![cfg(unix)]

use clap::Parser;
use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt;
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

fn set_mode(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[test]
fn test_unreadable_file_is_dropped_and_scan_continues() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let a = write(&root, "a.dat", b"same content");
    let b = write(&root, "b.dat", b"same content");
    let locked = write(&root, "c.dat", b"same content");
    set_mode(&locked, 0o000);

    // Permission bits do not apply to root.
    if File::open(&locked).is_ok() {
        set_mode(&locked, 0o644);
        eprintln!("Skipping: running with elevated privileges");
        return;
    }

    let (code, events) = run(&["-d", root.to_str().unwrap()]);
    set_mode(&locked, 0o644);

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::HashError { path, .. } if *path == locked)));
    let group = events.iter().find_map(|e| match e {
        Event::DuplicateGroup {
            canonical,
            duplicates,
            ..
        } => Some((canonical.clone(), duplicates.clone())),
        _ => None,
    });
    assert_eq!(group, Some((a, vec![b])));
}

#[test]
fn test_failed_replacement_does_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "a/keep.txt", b"group one");
    let blocked = write(&root, "locked/dup.txt", b"group one");
    write(&root, "b/keep.bin", b"second group!!");
    let open = write(&root, "c/dup.bin", b"second group!!");
    set_mode(&root.join("locked"), 0o555);

    if File::create(root.join("locked/write-check")).is_ok() {
        let _ = fs::remove_file(root.join("locked/write-check"));
        set_mode(&root.join("locked"), 0o755);
        eprintln!("Skipping: running with elevated privileges");
        return;
    }

    let (code, events) = run(&["-d", root.to_str().unwrap(), "-r"]);
    set_mode(&root.join("locked"), 0o755);

    assert_eq!(code, ExitCode::PartialSuccess);

    let statuses: Vec<(PathBuf, ReplacementStatus)> = events
        .iter()
        .filter_map(|e| match e {
            Event::Replacement {
                duplicate, status, ..
            } => Some((duplicate.clone(), *status)),
            _ => None,
        })
        .collect();
    assert!(statuses.contains(&(blocked.clone(), ReplacementStatus::Failed)));
    assert!(statuses.contains(&(open.clone(), ReplacementStatus::Replaced)));

    assert!(fs::symlink_metadata(&blocked).unwrap().is_file());
    assert_eq!(fs::read(&blocked).unwrap(), b"group one");
    assert!(fs::symlink_metadata(&open).unwrap().file_type().is_symlink());

    assert!(events.iter().any(|e| matches!(
        e,
        Event::LinkSummary {
            completed: 1,
            failed: 1,
            ..
        }
    )));
}

#[test]
fn test_unreadable_directory_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "a.txt", b"dup");
    write(&root, "b.txt", b"dup");
    write(&root, "private/c.txt", b"dup");
    let private = root.join("private");
    set_mode(&private, 0o000);

    if fs::read_dir(&private).is_ok() {
        set_mode(&private, 0o755);
        eprintln!("Skipping: running with elevated privileges");
        return;
    }

    let (code, events) = run(&["-d", root.to_str().unwrap()]);
    set_mode(&private, 0o755);

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::ScanError { path, .. } if *path == private)));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::DuplicateGroup { duplicates, .. } if duplicates.len() == 1)));
}
