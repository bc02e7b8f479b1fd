//! Command-line interface definitions for symdupe.
//!
//! This module defines all CLI arguments using the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Preview which JPEGs under two trees would become symlinks
//! symdupe -d ~/Pictures -d /mnt/backup/Pictures -f '*.JPG' -f '*.jpg'
//!
//! # Actually replace duplicates, verifying with MD5
//! symdupe -d ~/Pictures --remove --md5
//!
//! # Line-delimited JSON for scripting
//! symdupe -d ~/Pictures --output json
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::duplicates::CanonicalOrder;

/// Find duplicate files and replace them with symbolic links.
///
/// Files are grouped by size first; only files sharing a size are hashed
/// (CRC-32 by default, MD5 with --md5). Every copy after the first in each
/// group is reported, or with --remove replaced by a symlink to the first.
#[derive(Debug, Parser)]
#[command(name = "symdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to search for duplicates (repeat for several)
    #[arg(short = 'd', long = "dir", value_name = "DIRECTORY")]
    pub dirs: Vec<PathBuf>,

    /// File spec to match, e.g. '*.JPG' (repeat for several; default: all files)
    #[arg(short = 'f', long = "file", value_name = "FILE SPEC")]
    pub file_specs: Vec<String>,

    /// Remove duplicates and replace them with symbolic links
    #[arg(short = 'r', long = "remove")]
    pub remove: bool,

    /// Verify content with MD5 instead of CRC-32
    #[arg(long)]
    pub md5: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MiB). Default: 1 byte
    #[arg(long, value_parser = parse_size, value_name = "SIZE")]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1GB)
    #[arg(long, value_parser = parse_size, value_name = "SIZE")]
    pub max_size: Option<u64>,

    /// Gitignore-style pattern to exclude (repeat for several)
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Directory name to skip entirely, in addition to @eaDir (repeat for several)
    #[arg(long = "exclude-dir", value_name = "NAME")]
    pub exclude_dirs: Vec<String>,

    /// How to pick the copy that is kept in each group
    #[arg(long, value_enum)]
    pub canonical: Option<CanonicalOrder>,

    /// Number of I/O threads for hashing. Default: 4
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars and per-directory lines; log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports the following formats:
/// - Plain numbers: "1024" → 1024 bytes
/// - SI suffixes: "1KB" → 1,000, "1MB" → 1,000,000
/// - Binary suffixes: "1KiB" → 1,024, "1MiB" → 1,048,576
///
/// Suffixes are case-insensitive.
///
/// # Errors
///
/// Returns an error message if the string cannot be parsed.
///
/// # Examples
///
/// ```
/// use symdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1_000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1_024);
/// assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
/// ```
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
