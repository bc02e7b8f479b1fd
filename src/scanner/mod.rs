//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Directory walking using jwalk, with metadata-folder exclusion
//! - File spec matching (right-anchored glob patterns)
//! - Content digests (CRC-32 or MD5) computed in fixed-size blocks
//! - Inode identity checks for hardlink detection
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate discovery
//! - [`filespec`]: Path-match predicate for `--file` patterns
//! - [`hasher`]: Streaming digest computation
//! - [`hardlink`]: Device/inode identity
//!
//! # Example
//!
//! ```no_run
//! use symdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: 1024, // Skip files under 1KB
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod filespec;
pub mod hardlink;
pub mod hasher;
pub mod walker;

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

// Re-export main types
pub use filespec::{FileSpecs, SpecError};
pub use hasher::{Digest, DigestAlgorithm, Hasher, BLOCK_SIZE};
pub use walker::{normalize_roots, Walker};

/// Name of the Synology thumbnail/metadata folder excluded by default.
pub const SYNOLOGY_METADATA_DIR: &str = "@eaDir";

/// A regular file discovered by the walker that passed every filter.
///
/// Candidates are immutable once produced. The `seq` field records the
/// discovery position and is stamped by
/// [`group_by_size`](crate::duplicates::group_by_size); it is what keeps
/// canonical selection independent of hashing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Discovery sequence number within the run
    pub seq: usize,
}

impl Candidate {
    /// Create a new candidate with sequence number 0.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size, seq: 0 }
    }
}

/// Configuration for directory walking.
///
/// Controls size limits, path matching and subtree exclusion.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Minimum file size to include (in bytes). Files smaller than this are
    /// never candidates.
    pub min_size: u64,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// File specs a path must match. Empty matches every file.
    pub file_specs: FileSpecs,

    /// Directory names whose whole subtree is skipped.
    pub excluded_dir_names: Vec<String>,

    /// Extra gitignore-style patterns, relative to each root.
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: None,
            file_specs: FileSpecs::default(),
            excluded_dir_names: vec![SYNOLOGY_METADATA_DIR.to_string()],
            ignore_patterns: Vec::new(),
        }
    }
}

impl WalkerConfig {
    /// Set the minimum size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the maximum size.
    #[must_use]
    pub fn with_max_size(mut self, max_size: Option<u64>) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the file specs.
    #[must_use]
    pub fn with_file_specs(mut self, specs: FileSpecs) -> Self {
        self.file_specs = specs;
        self
    }

    /// Add directory names to exclude (in addition to the defaults).
    #[must_use]
    pub fn with_excluded_dir_names(mut self, names: Vec<String>) -> Self {
        for name in names {
            if !self.excluded_dir_names.contains(&name) {
                self.excluded_dir_names.push(name);
            }
        }
        self
    }

    /// Set gitignore-style ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Check whether a directory with this name is an excluded subtree.
    #[must_use]
    pub fn is_excluded_dir(&self, name: &OsStr) -> bool {
        self.excluded_dir_names
            .iter()
            .any(|excluded| OsStr::new(excluded) == name)
    }

    /// Check whether any directory component of `path` is an excluded name.
    ///
    /// Names match whole components, so `@eaDir` does not exclude `x@eaDir`.
    #[must_use]
    pub fn is_inside_excluded_dir(&self, path: &Path) -> bool {
        path.components().any(|c| match c {
            Component::Normal(name) => self.is_excluded_dir(name),
            _ => false,
        })
    }

    /// Check if a file size passes the size filters.
    #[must_use]
    pub fn passes_size_filter(&self, size: u64) -> bool {
        size >= self.min_size && self.max_size.map_or(true, |max| size <= max)
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for the given path.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Interrupted(p)
            | Self::Io { path: p, .. } => p,
        }
    }
}
