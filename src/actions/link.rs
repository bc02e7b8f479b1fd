//! Replacing duplicates with symbolic links.
//!
//! # Overview
//!
//! For every confirmed duplicate group the first member is canonical and
//! is never touched. Every other member yields one [`ReplacementPlan`].
//! Plans are then applied in one of two modes:
//!
//! - [`LinkMode::DryRun`] (default): nothing on disk changes; each plan is
//!   reported as it would be carried out.
//! - [`LinkMode::Real`]: each duplicate is swapped for a symlink pointing at
//!   the canonical path.
//!
//! # Safety
//!
//! A real replacement first re-checks the duplicate and the canonical
//! against the scan (both still regular files, duplicate still the scanned
//! size, not the same path). The symlink is then created under a temporary
//! sibling name and renamed over the duplicate, so the duplicate path is
//! never missing: it names either the old file or the new link. Duplicates
//! that already share an inode with the canonical are skipped.
//!
//! # Example
//!
//! ```no_run
//! use symdupe::actions::link::{apply_plans, plan_replacements, LinkConfig};
//! use symdupe::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let (groups, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("/photos"))
//!     .unwrap();
//! let report = apply_plans(&plan_replacements(&groups), &LinkConfig::default());
//! println!("{}", report.summary());
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::HashBucket;
use crate::events::{Event, EventSink, ReplacementStatus};
use crate::scanner::hardlink::is_same_file;

/// Whether replacements touch the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Report only
    #[default]
    DryRun,
    /// Remove duplicates and create symlinks
    Real,
}

impl LinkMode {
    /// Whether this mode mutates the filesystem.
    #[must_use]
    pub fn is_real(self) -> bool {
        self == Self::Real
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Real => write!(f, "real-run"),
        }
    }
}

/// Error type for replacement operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when touching the file or its directory.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The duplicate changed since it was scanned.
    #[error("file modified since scan: {path} ({reason})")]
    Modified {
        /// Duplicate path
        path: PathBuf,
        /// What changed
        reason: String,
    },

    /// The canonical copy is gone or no longer a regular file.
    #[error("canonical file unavailable: {0}")]
    CanonicalUnavailable(PathBuf),

    /// Duplicate and canonical are the same path.
    #[error("duplicate and canonical are the same path: {0}")]
    SamePath(PathBuf),

    /// Symbolic links are not available on this platform.
    #[error("symbolic links are not supported on this platform")]
    Unsupported,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified { path: p, .. }
            | Self::CanonicalUnavailable(p)
            | Self::SamePath(p)
            | Self::Io { path: p, .. } => Some(p),
            Self::Unsupported => None,
        }
    }
}

/// One duplicate to be replaced by a link to its canonical copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementPlan {
    /// Retained copy; the link target
    pub canonical: PathBuf,
    /// Copy to be replaced
    pub duplicate: PathBuf,
    /// Size in bytes at scan time
    pub size: u64,
}

/// Why a duplicate was deliberately left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Duplicate and canonical are already the same inode
    AlreadyHardlinked,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyHardlinked => write!(f, "already hardlinked to canonical"),
        }
    }
}

/// What happened to one plan.
#[derive(Debug)]
pub enum ReplacementOutcome {
    /// Dry-run: would be replaced
    Planned,
    /// Replaced by a symlink
    Replaced,
    /// Left alone on purpose
    Skipped(SkipReason),
    /// Replacement failed; the duplicate is left as it was
    Failed(LinkError),
}

impl ReplacementOutcome {
    fn status(&self) -> ReplacementStatus {
        match self {
            Self::Planned => ReplacementStatus::Planned,
            Self::Replaced => ReplacementStatus::Replaced,
            Self::Skipped(_) => ReplacementStatus::Skipped,
            Self::Failed(_) => ReplacementStatus::Failed,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::Skipped(reason) => Some(reason.to_string()),
            Self::Failed(e) => Some(e.to_string()),
            Self::Planned | Self::Replaced => None,
        }
    }
}

/// Configuration for applying plans.
#[derive(Clone, Default)]
pub struct LinkConfig {
    /// Dry-run or real-run.
    pub mode: LinkMode,
    /// Optional shutdown flag; checked before each plan.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional event sink.
    pub event_sink: Option<Arc<dyn EventSink>>,
}

impl fmt::Debug for LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkConfig")
            .field("mode", &self.mode)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("event_sink", &self.event_sink.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

impl LinkConfig {
    /// Config for a dry run.
    #[must_use]
    pub fn dry_run() -> Self {
        Self::default()
    }

    /// Config for a real run.
    #[must_use]
    pub fn real() -> Self {
        Self {
            mode: LinkMode::Real,
            ..Self::default()
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
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

/// Totals from applying a batch of plans.
#[derive(Debug, Default)]
pub struct LinkReport {
    /// Mode the batch ran in.
    pub mode: LinkMode,
    /// Plans carried out (planned in dry-run, replaced in real-run).
    pub completed: usize,
    /// Bytes planned or reclaimed.
    pub bytes: u64,
    /// Duplicates left alone, with the reason.
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Failed replacements with their errors.
    pub failures: Vec<(PathBuf, LinkError)>,
    /// Whether shutdown stopped the batch early.
    pub interrupted: bool,
}

impl LinkReport {
    /// Number of failed replacements.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every plan went through or was skipped on purpose.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the batch.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = match self.mode {
            LinkMode::DryRun => "Would replace",
            LinkMode::Real => "Replaced",
        };
        let mut text = format!(
            "{} {} file(s), total size = {} bytes",
            verb, self.completed, self.bytes
        );
        if !self.skipped.is_empty() {
            text.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        if !self.failures.is_empty() {
            text.push_str(&format!(", {} failed", self.failures.len()));
        }
        if self.interrupted {
            text.push_str(" (interrupted)");
        }
        text
    }
}

/// Build one plan per non-canonical member of each group.
///
/// Group order and member order are preserved.
#[must_use]
pub fn plan_replacements(groups: &[HashBucket]) -> Vec<ReplacementPlan> {
    groups
        .iter()
        .filter_map(|group| {
            let canonical = group.canonical()?;
            Some(group.duplicates().iter().map(move |dup| ReplacementPlan {
                canonical: canonical.path.clone(),
                duplicate: dup.path.clone(),
                size: group.size(),
            }))
        })
        .flatten()
        .collect()
}

/// Whether the duplicate is already the canonical's inode.
fn shares_inode(plan: &ReplacementPlan) -> bool {
    is_same_file(&plan.duplicate, &plan.canonical).unwrap_or(false)
}

/// Re-check both files against the scan before mutating anything.
fn preflight(plan: &ReplacementPlan) -> Result<Option<SkipReason>, LinkError> {
    if plan.duplicate == plan.canonical {
        return Err(LinkError::SamePath(plan.duplicate.clone()));
    }

    let dup_meta = fs::symlink_metadata(&plan.duplicate)
        .map_err(|e| LinkError::from_io(&plan.duplicate, e))?;
    if !dup_meta.is_file() {
        return Err(LinkError::Modified {
            path: plan.duplicate.clone(),
            reason: "no longer a regular file".to_string(),
        });
    }
    if dup_meta.len() != plan.size {
        log::warn!(
            "File modified since scan: {} (size changed from {} to {})",
            plan.duplicate.display(),
            plan.size,
            dup_meta.len()
        );
        return Err(LinkError::Modified {
            path: plan.duplicate.clone(),
            reason: format!("size changed from {} to {}", plan.size, dup_meta.len()),
        });
    }

    match fs::symlink_metadata(&plan.canonical) {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(LinkError::CanonicalUnavailable(plan.canonical.clone())),
    }

    if shares_inode(plan) {
        return Ok(Some(SkipReason::AlreadyHardlinked));
    }

    Ok(None)
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn make_symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::from(io::ErrorKind::Unsupported))
}

/// Temporary sibling name for the link before it is renamed into place.
///
/// The name does not embed the duplicate's own name, so it stays well under
/// `NAME_MAX` whatever the duplicate is called.
fn temp_link_path(duplicate: &Path) -> Result<PathBuf, LinkError> {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    if duplicate.file_name().is_none() {
        return Err(LinkError::NotFound(duplicate.to_path_buf()));
    }
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_name = format!(".symdupe-{}-{}", std::process::id(), n);
    Ok(duplicate.with_file_name(temp_name))
}

/// Atomically put a symlink to `target` at `path`.
///
/// On failure the temporary link is removed and `path` is left as it was.
fn swap_in_symlink(target: &Path, path: &Path) -> Result<(), LinkError> {
    let temp = temp_link_path(path)?;

    make_symlink(target, &temp).map_err(|e| match e.kind() {
        io::ErrorKind::Unsupported => LinkError::Unsupported,
        _ => LinkError::from_io(&temp, e),
    })?;

    if let Err(e) = fs::rename(&temp, path) {
        if let Err(cleanup) = fs::remove_file(&temp) {
            log::warn!(
                "Failed to remove temporary link {}: {}",
                temp.display(),
                cleanup
            );
        }
        return Err(LinkError::from_io(path, e));
    }

    Ok(())
}

/// Replace one duplicate with a symlink to its canonical copy.
///
/// # Errors
///
/// Returns [`LinkError`] if a pre-flight check fails or the swap cannot be
/// completed. The duplicate is untouched in every error case.
pub fn replace_with_symlink(plan: &ReplacementPlan) -> Result<ReplacementOutcome, LinkError> {
    if let Some(reason) = preflight(plan)? {
        log::debug!("Skipping {}: {}", plan.duplicate.display(), reason);
        return Ok(ReplacementOutcome::Skipped(reason));
    }

    swap_in_symlink(&plan.canonical, &plan.duplicate)?;

    log::debug!(
        "Replaced {} with symlink to {}",
        plan.duplicate.display(),
        plan.canonical.display()
    );
    Ok(ReplacementOutcome::Replaced)
}

/// Apply one plan in the given mode.
#[must_use]
pub fn apply_plan(plan: &ReplacementPlan, mode: LinkMode) -> ReplacementOutcome {
    match mode {
        LinkMode::DryRun => {
            if shares_inode(plan) {
                ReplacementOutcome::Skipped(SkipReason::AlreadyHardlinked)
            } else {
                ReplacementOutcome::Planned
            }
        }
        LinkMode::Real => match replace_with_symlink(plan) {
            Ok(outcome) => outcome,
            Err(e) => ReplacementOutcome::Failed(e),
        },
    }
}

/// Apply a batch of plans in order.
///
/// A failed plan is recorded and the batch carries on. When the shutdown
/// flag is set the batch stops before the next plan.
#[must_use]
pub fn apply_plans(plans: &[ReplacementPlan], config: &LinkConfig) -> LinkReport {
    let mut report = LinkReport {
        mode: config.mode,
        ..Default::default()
    };

    log::info!("Applying {} replacement(s) in {} mode", plans.len(), config.mode);

    for plan in plans {
        if config.is_shutdown_requested() {
            log::info!("Replacement interrupted by shutdown signal");
            report.interrupted = true;
            break;
        }

        let outcome = apply_plan(plan, config.mode);

        if let Some(ref sink) = config.event_sink {
            sink.emit(&Event::Replacement {
                mode: config.mode,
                duplicate: plan.duplicate.clone(),
                canonical: plan.canonical.clone(),
                size: plan.size,
                status: outcome.status(),
                detail: outcome.detail(),
            });
        }

        match outcome {
            ReplacementOutcome::Planned | ReplacementOutcome::Replaced => {
                report.completed += 1;
                report.bytes += plan.size;
            }
            ReplacementOutcome::Skipped(reason) => {
                report.skipped.push((plan.duplicate.clone(), reason));
            }
            ReplacementOutcome::Failed(e) => {
                log::warn!("Failed to replace {}: {}", plan.duplicate.display(), e);
                report.failures.push((plan.duplicate.clone(), e));
            }
        }
    }

    if let Some(ref sink) = config.event_sink {
        sink.emit(&Event::LinkSummary {
            mode: report.mode,
            completed: report.completed,
            bytes: report.bytes,
            skipped: report.skipped.len(),
            failed: report.failures.len(),
            interrupted: report.interrupted,
        });
    }

    log::info!("{}", report.summary());

    report
}
