use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use symdupe::cli::Cli;
use symdupe::config::Config;
use symdupe::error::ExitCode;
use symdupe::output::{JsonlReporter, TextReporter};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_exit_code_success_without_directory() {
    let cli = Cli::try_parse_from(["symdupe"]).unwrap();
    let result = symdupe::run_app(cli).unwrap();
    assert_eq!(result, ExitCode::Success);
}

#[test]
fn test_exit_code_usage_error_on_missing_root() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let cli = Cli::try_parse_from(["symdupe", "-d", missing.to_str().unwrap(), "-q"]).unwrap();

    let err = symdupe::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::UsageError);
}

#[test]
fn test_exit_code_usage_error_on_file_root() {
    let dir = tempdir().unwrap();
    write(dir.path(), "plain.txt", b"x");
    let file = dir.path().join("plain.txt");
    let cli = Cli::try_parse_from(["symdupe", "-d", file.to_str().unwrap(), "-q"]).unwrap();

    let err = symdupe::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::UsageError);
}

#[test]
fn test_exit_code_usage_error_on_bad_file_spec() {
    let dir = tempdir().unwrap();
    let cli = Cli::try_parse_from(["symdupe", "-d", dir.path().to_str().unwrap(), "-f", "[", "-q"])
        .unwrap();

    let err = symdupe::run_app(cli).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::UsageError);
}

#[test]
fn test_exit_code_success_with_duplicates_json() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"dup");
    write(dir.path(), "b.txt", b"dup");

    let cli = Cli::try_parse_from([
        "symdupe",
        "-d",
        dir.path().to_str().unwrap(),
        "--output",
        "json",
    ])
    .unwrap();
    let result = symdupe::run_app(cli).unwrap();
    assert_eq!(result, ExitCode::Success);
}

#[test]
fn test_text_report_for_dry_run() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "A/a.txt", b"abc");
    write(&root, "A/sub/b.txt", b"abc");
    write(&root, "A/c.txt", b"abd");

    let a = root.join("A");
    let cli = Cli::try_parse_from(["symdupe", "-d", a.to_str().unwrap()]).unwrap();
    let reporter = Arc::new(TextReporter::new(Vec::new(), false));
    let config = Config::default().apply_cli(&cli);
    let code = symdupe::execute(&cli, &config, reporter.clone()).unwrap();

    let text = match Arc::try_unwrap(reporter) {
        Ok(r) => String::from_utf8(r.into_inner()).unwrap(),
        Err(_) => panic!("reporter still shared after run"),
    };
    let dup = root.join("A/sub/b.txt");
    let canon = root.join("A/a.txt");

    assert_eq!(code, ExitCode::Success);
    assert!(text.contains(&format!("Directory 1:    {}", a.display())));
    assert!(text.contains(
        "Potentially 2 duplicate files with total size before hash check: 6 bytes"
    ));
    assert!(text.contains("Calculating CRC32 checksums..."));
    assert!(text.contains(&format!(
        "DRY RUN - symlink : {} --> {}",
        dup.display(),
        canon.display()
    )));
    assert!(text.contains(&format!("Would remove      : {} (size= 3 bytes)", dup.display())));
    assert!(text.contains("Would remove 1 files, total size = 3 bytes"));
}

#[test]
fn test_text_report_for_file_spec_scenario() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "A/a.txt", b"hello");
    write(&root, "A/sub/b.txt", b"hello");
    write(&root, "A/c.txt", b"world");
    write(&root, "A/d.log", b"hello");

    let a = root.join("A");
    let cli = Cli::try_parse_from(["symdupe", "-d", a.to_str().unwrap(), "-f", "*.txt"]).unwrap();
    let reporter = Arc::new(TextReporter::new(Vec::new(), false));
    let config = Config::default().apply_cli(&cli);
    let code = symdupe::execute(&cli, &config, reporter.clone()).unwrap();

    let text = match Arc::try_unwrap(reporter) {
        Ok(r) => String::from_utf8(r.into_inner()).unwrap(),
        Err(_) => panic!("reporter still shared after run"),
    };
    let dup = root.join("A/sub/b.txt");
    let canon = root.join("A/a.txt");

    assert_eq!(code, ExitCode::Success);
    assert!(text.contains(
        "Potentially 2 duplicate files with total size before hash check: 10 bytes"
    ));
    assert!(text.contains(&format!(
        "DRY RUN - symlink : {} --> {}",
        dup.display(),
        canon.display()
    )));
    assert!(text.contains(&format!("Would remove      : {} (size= 5 bytes)", dup.display())));
    assert_eq!(text.matches("DRY RUN - symlink").count(), 1);
    assert!(!text.contains("c.txt"));
    assert!(!text.contains("d.log"));
    assert!(text.contains("Would remove 1 files, total size = 5 bytes"));
}

#[test]
fn test_json_report_lines_parse() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    write(&root, "x/1.bin", b"0000");
    write(&root, "y/2.bin", b"0000");

    let cli = Cli::try_parse_from(["symdupe", "-d", root.to_str().unwrap(), "--md5"]).unwrap();
    let reporter = Arc::new(JsonlReporter::new(Vec::new()));
    symdupe::execute(&cli, &Config::default().apply_cli(&cli), reporter.clone()).unwrap();

    let out = match Arc::try_unwrap(reporter) {
        Ok(r) => String::from_utf8(r.into_inner()).unwrap(),
        Err(_) => panic!("reporter still shared after run"),
    };
    let kinds: Vec<String> = out
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["event"].as_str().unwrap().to_string()
        })
        .filter(|k| k != "directory_progress")
        .collect();

    assert_eq!(
        kinds,
        vec![
            "scan_started",
            "size_grouped",
            "hash_started",
            "duplicate_group",
            "replacement",
            "link_summary"
        ]
    );
    let group: serde_json::Value = out
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .find(|v| v["event"] == "duplicate_group")
        .unwrap();
    assert_eq!(group["digest"].as_str().unwrap().len(), 32);
}
