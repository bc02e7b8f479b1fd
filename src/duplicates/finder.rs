//! Duplicate finder implementation.
//!
//! # Overview
//!
//! This module orchestrates the detection pipeline:
//! 1. **Walk**: collect candidates from every root (see [`crate::scanner::walker`])
//! 2. **Size grouping**: bucket by exact size (see [`crate::duplicates::groups`])
//! 3. **Digest verification**: hash every member of a multi-member size
//!    bucket and regroup by `(size, digest)`
//!
//! # Example
//!
//! ```no_run
//! use symdupe::scanner::{Candidate, DigestAlgorithm, Hasher, Walker, WalkerConfig};
//! use symdupe::duplicates::{group_by_size, verify_by_digest, HashConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let files: Vec<Candidate> = walker.walk().filter_map(Result::ok).collect();
//! let (size_buckets, _) = group_by_size(files);
//!
//! let hasher = Arc::new(Hasher::new(DigestAlgorithm::Crc32));
//! let (groups, stats) = verify_by_digest(size_buckets, hasher, HashConfig::default());
//!
//! println!("{} groups, {} bytes reclaimable", groups.len(), stats.wasted_space);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::groups::{group_by_digest, group_by_size, HashBucket, SizeBuckets};
use crate::events::{Event, EventSink};
use crate::progress::ProgressCallback;
use crate::scanner::{
    normalize_roots, Candidate, Digest, DigestAlgorithm, HashError, Hasher, ScanError, Walker,
    WalkerConfig,
};

/// Files above this size get a debug line when hashing starts.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// How the canonical member of each duplicate group is chosen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalOrder {
    /// First file in walk order (children sorted by name, roots in order given)
    #[default]
    Discovery,
    /// Lexicographically smallest path
    Path,
}

impl fmt::Display for CanonicalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Path => write!(f, "path"),
        }
    }
}

/// Configuration for the digest verification phase.
#[derive(Clone)]
pub struct HashConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Optional event sink for per-file errors.
    pub event_sink: Option<Arc<dyn EventSink>>,
}

impl fmt::Debug for HashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("event_sink", &self.event_sink.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
            event_sink: None,
        }
    }
}

impl HashConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
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

    /// Set the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from the digest verification phase.
#[derive(Debug, Default)]
pub struct HashStats {
    /// Files that entered the phase
    pub input_files: usize,
    /// Files successfully hashed
    pub hashed_files: usize,
    /// Files that could not be hashed
    pub failed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Per-file errors, in discovery order
    pub errors: Vec<HashError>,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files (excluding canonicals)
    pub duplicate_files: usize,
    /// Bytes held by duplicate files
    pub wasted_space: u64,
    /// Whether shutdown cut the phase short
    pub interrupted: bool,
}

/// Hash every member of `buckets` and regroup by `(size, digest)`.
///
/// Hashing runs on a dedicated pool of `io_threads` workers. Results are
/// put back in discovery order (`Candidate::seq`) before grouping, so the
/// canonical member of each group never depends on which worker finished
/// first. Files that fail to hash are left out of their group and reported
/// in [`HashStats::errors`].
#[must_use]
pub fn verify_by_digest(
    buckets: SizeBuckets,
    hasher: Arc<Hasher>,
    config: HashConfig,
) -> (Vec<HashBucket>, HashStats) {
    let files: Vec<Candidate> = buckets.into_iter().flat_map(|b| b.files).collect();
    let mut stats = HashStats {
        input_files: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        log::debug!("Hashing: no files to process");
        return (Vec::new(), stats);
    }

    if let Some(ref sink) = config.event_sink {
        sink.emit(&Event::HashStarted {
            algorithm: hasher.algorithm(),
            files: files.len(),
        });
    }
    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("hashing", files.len());
    }

    log::info!(
        "Hashing {} files with {} on {} thread(s)",
        files.len(),
        hasher.algorithm(),
        config.io_threads
    );

    let completed = AtomicUsize::new(0);
    let hash_one = |file: Candidate| -> Option<(Candidate, Result<Digest, HashError>)> {
        if config.is_shutdown_requested() {
            return None;
        }

        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({} MB): {}",
                file.size / (1024 * 1024),
                file.path.display()
            );
        }

        let result = hasher.digest_file(&file.path);

        if let Some(ref callback) = config.progress_callback {
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            callback.on_progress(done, &file.path.to_string_lossy());
            if result.is_ok() {
                callback.on_item_completed(file.size);
            }
        }

        Some((file, result))
    };

    let mut results: Vec<(Candidate, Result<Digest, HashError>)> =
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.io_threads.max(1))
            .build()
        {
            Ok(pool) => pool.install(|| files.into_par_iter().filter_map(hash_one).collect()),
            Err(e) => {
                log::warn!(
                    "Failed to create hashing thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                files.into_par_iter().filter_map(hash_one).collect()
            }
        };

    // Completion order is arbitrary; canonical selection needs walk order
    results.sort_by_key(|(file, _)| file.seq);

    if config.is_shutdown_requested() {
        stats.interrupted = true;
        log::info!("Hashing: interrupted by shutdown signal");
    }

    let mut hashed = Vec::with_capacity(results.len());
    for (file, result) in results {
        match result {
            Ok(digest) => {
                stats.hashed_files += 1;
                stats.bytes_hashed += file.size;
                hashed.push((file, digest));
            }
            Err(HashError::Interrupted(_)) => {
                stats.interrupted = true;
            }
            Err(e) => {
                log::warn!("Failed to hash {}: {}", file.path.display(), e);
                if let Some(ref sink) = config.event_sink {
                    sink.emit(&Event::HashError {
                        path: file.path.clone(),
                        message: e.to_string(),
                    });
                }
                stats.failed_files += 1;
                stats.errors.push(e);
            }
        }
    }

    let groups = group_by_digest(hashed);

    stats.duplicate_groups = groups.len();
    stats.duplicate_files = groups.iter().map(HashBucket::duplicate_count).sum();
    stats.wasted_space = groups.iter().map(HashBucket::wasted_space).sum();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("hashing");
    }

    log::info!(
        "Hashing complete: {} groups, {} duplicates, {} bytes reclaimable",
        stats.duplicate_groups,
        stats.duplicate_files,
        stats.wasted_space
    );

    (groups, stats)
}

// ============================================================================
// DuplicateFinder - Pipeline Orchestrator
// ============================================================================

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    pub io_threads: usize,
    /// Walker configuration for filtering.
    pub walker_config: WalkerConfig,
    /// Digest algorithm for the run.
    pub algorithm: DigestAlgorithm,
    /// Canonical member selection.
    pub canonical_order: CanonicalOrder,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Optional event sink.
    pub event_sink: Option<Arc<dyn EventSink>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("algorithm", &self.algorithm)
            .field("canonical_order", &self.canonical_order)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("event_sink", &self.event_sink.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            walker_config: WalkerConfig::default(),
            algorithm: DigestAlgorithm::default(),
            canonical_order: CanonicalOrder::default(),
            shutdown_flag: None,
            progress_callback: None,
            event_sink: None,
        }
    }
}

impl FinderConfig {
    /// Set the I/O thread count (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set how canonical members are chosen.
    #[must_use]
    pub fn with_canonical_order(mut self, order: CanonicalOrder) -> Self {
        self.canonical_order = order;
        self
    }

    /// Set the shutdown flag for graceful termination.
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

    /// Set the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn emit(&self, event: Event) {
        if let Some(ref sink) = self.event_sink {
            sink.emit(&event);
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Normalized roots that were walked
    pub roots: Vec<PathBuf>,
    /// Candidates discovered by the walker
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Candidates eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Files hashed
    pub hashed_files: usize,
    /// Files that could not be hashed
    pub hash_failures: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files (excluding canonicals)
    pub duplicate_files: usize,
    /// Bytes that replacing every duplicate would reclaim
    pub reclaimable_space: u64,
    /// Duration of the scan
    pub scan_duration: std::time::Duration,
    /// Non-fatal walk errors
    pub scan_errors: Vec<ScanError>,
    /// Non-fatal hash errors
    pub hash_errors: Vec<HashError>,
}

impl ScanSummary {
    /// Number of non-fatal errors of either kind.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.scan_errors.len() + self.hash_errors.len()
    }

    /// Percentage of scanned bytes held by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while preparing a root.
    #[error("I/O error for {path}: {source}")]
    IoWithPath {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Duplicate finder that runs walk, size grouping and digest verification.
///
/// # Example
///
/// ```no_run
/// use symdupe::duplicates::{DuplicateFinder, FinderConfig};
/// use symdupe::scanner::DigestAlgorithm;
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_algorithm(DigestAlgorithm::Md5);
/// let finder = DuplicateFinder::new(config);
///
/// let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate groups", groups.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new(config.algorithm);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find duplicates under a single root.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_duplicates_in_paths`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<HashBucket>, ScanSummary), FinderError> {
        self.find_duplicates_in_paths(&[path.to_path_buf()])
    }

    /// Find duplicates across several roots.
    ///
    /// Roots are normalized first (see [`normalize_roots`]) and walked in
    /// the order given. Unreadable entries and files that fail to hash are
    /// recorded in the summary and do not stop the scan.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - A root does not exist or is not a directory
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates_in_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(Vec<HashBucket>, ScanSummary), FinderError> {
        let start_time = std::time::Instant::now();
        let mut summary = ScanSummary::default();

        let roots = normalize_roots(paths)?;
        if roots.is_empty() {
            log::warn!("No paths provided for scanning");
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Scanning {} directory root(s): {:?}",
            roots.len(),
            roots.iter().map(|p| p.display()).collect::<Vec<_>>()
        );
        self.config.emit(Event::ScanStarted {
            roots: roots.clone(),
            algorithm: self.config.algorithm,
        });

        let files = self.walk_roots(&roots, &mut summary);

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        summary.total_files = files.len();
        summary.total_size = files.iter().map(|f| f.size).sum();
        summary.roots = roots;

        log::info!(
            "Found {} files ({}) across all directories",
            summary.total_files,
            bytesize::ByteSize::b(summary.total_size)
        );

        let (size_buckets, size_stats) = group_by_size(files);
        summary.eliminated_by_size = size_stats.eliminated_unique;

        self.config.emit(Event::SizeGrouped {
            candidates: size_stats.total_files,
            potential_duplicates: size_stats.potential_duplicates,
            redundant_files: size_stats.potential_duplicates - size_stats.duplicate_buckets,
            potential_bytes: size_stats.potential_savings,
        });

        log::info!(
            "Size grouping complete: {} → {} files ({:.1}% eliminated)",
            size_stats.total_files,
            size_stats.potential_duplicates,
            size_stats.elimination_rate()
        );

        if size_buckets.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        let hash_config = HashConfig {
            io_threads: self.config.io_threads,
            shutdown_flag: self.config.shutdown_flag.clone(),
            progress_callback: self.config.progress_callback.clone(),
            event_sink: self.config.event_sink.clone(),
        };

        let (mut groups, hash_stats) =
            verify_by_digest(size_buckets, self.hasher.clone(), hash_config);

        if hash_stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if self.config.canonical_order == CanonicalOrder::Path {
            for group in &mut groups {
                group.sort_by_path();
            }
        }

        for group in &groups {
            if let Some(canonical) = group.canonical() {
                self.config.emit(Event::DuplicateGroup {
                    size: group.size(),
                    digest: group.digest().to_hex(),
                    canonical: canonical.path.clone(),
                    duplicates: group.duplicates().iter().map(|f| f.path.clone()).collect(),
                });
            }
        }

        summary.hashed_files = hash_stats.hashed_files;
        summary.hash_failures = hash_stats.failed_files;
        summary.hash_errors = hash_stats.errors;
        summary.duplicate_groups = hash_stats.duplicate_groups;
        summary.duplicate_files = hash_stats.duplicate_files;
        summary.reclaimable_space = hash_stats.wasted_space;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable in {:?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.scan_duration
        );

        Ok((groups, summary))
    }

    /// Walk every root in order, reporting per-directory progress.
    fn walk_roots(&self, roots: &[PathBuf], summary: &mut ScanSummary) -> Vec<Candidate> {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let mut files = Vec::new();
        let mut seen_sizes: HashSet<u64> = HashSet::new();
        let mut potential_files = 0usize;
        let mut potential_bytes = 0u64;
        let mut current_dir: Option<PathBuf> = None;

        for root in roots {
            let mut walker = Walker::new(root, self.config.walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }
            if let Some(ref callback) = self.config.progress_callback {
                walker = walker.with_progress_callback(callback.clone());
            }

            for result in walker.walk() {
                match result {
                    Ok(file) => {
                        let parent = file.path.parent().map(Path::to_path_buf);
                        if parent.is_some() && parent != current_dir {
                            current_dir = parent;
                            if let Some(ref dir) = current_dir {
                                self.config.emit(Event::DirectoryProgress {
                                    directory: dir.clone(),
                                    files_seen: files.len(),
                                    potential_files,
                                    potential_bytes,
                                });
                            }
                        }

                        if !seen_sizes.insert(file.size) {
                            potential_files += 1;
                            potential_bytes += file.size;
                        }
                        files.push(file);
                    }
                    Err(e) => {
                        self.config.emit(Event::ScanError {
                            path: e.path().to_path_buf(),
                            message: e.to_string(),
                        });
                        summary.scan_errors.push(e);
                    }
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        files
    }
}
