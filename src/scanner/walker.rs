//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and yielding every regular file that qualifies as a duplicate
//! [`Candidate`]. It uses [`jwalk`] for parallel directory reads while
//! keeping the output order deterministic: the children of each directory
//! are sorted by file name before they are yielded.
//!
//! # Filters
//!
//! A file is yielded when it:
//! - is a regular file and not a symbolic link (links are never followed)
//! - is not inside an excluded subtree (`@eaDir` by default, plus any
//!   gitignore-style ignore pattern); a root that itself lies under an
//!   excluded directory yields nothing
//! - matches at least one file spec
//! - has a size within `[min_size, max_size]`
//!
//! Unreadable directories and entries are yielded as [`ScanError`] values;
//! traversal carries on with their siblings.
//!
//! # Example
//!
//! ```no_run
//! use symdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Pictures"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{Candidate, ScanError, WalkerConfig};
use crate::duplicates::FinderError;
use crate::progress::ProgressCallback;

/// Directory walker for candidate discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback, told about each directory entered
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops iteration as soon
    /// as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the matcher for the configured ignore patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Walk the directory tree, yielding candidates in discovery order.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. The iterator is finite and cannot be restarted; call
    /// `walk` again for a fresh traversal.
    pub fn walk(&self) -> impl Iterator<Item = Result<Candidate, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let excluded = self.config.clone();
        let root = self.root.clone();
        let root_excluded = self.config.is_inside_excluded_dir(&self.root);
        if root_excluded {
            log::debug!("Root is inside an excluded directory: {}", self.root.display());
        }

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                if root_excluded {
                    children.clear();
                    return;
                }

                // Prune excluded subtrees before jwalk descends into them
                children.retain(|child| match child {
                    Ok(entry) => {
                        let is_dir = entry.file_type().is_dir();
                        if is_dir && excluded.is_excluded_dir(&entry.file_name) {
                            log::trace!("Excluding directory: {}", entry.path().display());
                            return false;
                        }
                        if let Some(ref gi) = gitignore {
                            let path = entry.path();
                            let relative = path.strip_prefix(&root).unwrap_or(&path);
                            if gi.matched(relative, is_dir).is_ignore() {
                                log::trace!("Ignoring: {}", path.display());
                                return false;
                            }
                        }
                        true
                    }
                    Err(_) => true,
                });

                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        let mut directories_seen = 0usize;

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(mut entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        directories_seen += 1;
                        if let Some(ref callback) = self.progress_callback {
                            callback.on_progress(directories_seen, &path.to_string_lossy());
                        }
                        // jwalk attaches a failed read_dir to the directory entry
                        return entry
                            .read_children_error
                            .take()
                            .map(|e| Err(self.handle_jwalk_error(path, e)));
                    }

                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    if !self.config.file_specs.matches(&path) {
                        log::trace!("Skipping file not matching any spec: {}", path.display());
                        return None;
                    }

                    let metadata = match std::fs::symlink_metadata(&path) {
                        Ok(m) => m,
                        Err(e) => return Some(Err(self.handle_io_error(path, e))),
                    };

                    if !metadata.is_file() {
                        return None;
                    }

                    let size = metadata.len();
                    if !self.config.passes_size_filter(size) {
                        log::trace!(
                            "Skipping file due to size filter ({}): {}",
                            size,
                            path.display()
                        );
                        return None;
                    }

                    Some(Ok(Candidate::new(path, size)))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(self.handle_jwalk_error(path, e)))
                }
            }
        })
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: PathBuf, error: std::io::Error) -> ScanError {
        match error.kind() {
            std::io::ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => log::warn!("Cannot read metadata for {}: {}", path.display(), error),
        }
        ScanError::from_io(path, error)
    }

    /// Handle jwalk errors, keeping the underlying I/O error when present.
    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> ScanError {
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.into_io_error() {
            Some(io_error) => ScanError::from_io(path, io_error),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("directory loop or traversal error"),
            },
        }
    }
}

/// Validate and normalize scan roots.
///
/// Each root is canonicalized to an absolute path. Duplicate roots and
/// roots nested inside an earlier root are dropped so no file is
/// discovered twice. Order is otherwise preserved.
///
/// # Errors
///
/// Returns [`FinderError::PathNotFound`] or [`FinderError::NotADirectory`]
/// for the first invalid root.
pub fn normalize_roots(paths: &[PathBuf]) -> Result<Vec<PathBuf>, FinderError> {
    let mut roots: Vec<PathBuf> = Vec::with_capacity(paths.len());

    for path in paths {
        let canonical = std::fs::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FinderError::PathNotFound(path.clone()),
            _ => FinderError::IoWithPath {
                path: path.clone(),
                source: e,
            },
        })?;

        if !canonical.is_dir() {
            return Err(FinderError::NotADirectory(path.clone()));
        }

        if roots.iter().any(|existing| canonical.starts_with(existing)) {
            log::info!(
                "Skipping {}: already covered by another root",
                canonical.display()
            );
            continue;
        }

        // A later root may contain earlier ones
        roots.retain(|existing| {
            let nested = existing.starts_with(&canonical);
            if nested {
                log::info!(
                    "Skipping {}: already covered by {}",
                    existing.display(),
                    canonical.display()
                );
            }
            !nested
        });
        roots.push(canonical);
    }

    Ok(roots)
}
