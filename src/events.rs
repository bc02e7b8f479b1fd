//! Pipeline events and the sink they are delivered to.
//!
//! The finder and the link replacer never print. Everything a user might
//! want to see is delivered as an [`Event`] to an [`EventSink`]; console
//! and JSON rendering live in [`crate::output`].

use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;

use crate::actions::LinkMode;
use crate::scanner::DigestAlgorithm;

/// Something observable happened during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Scanning is about to start.
    ScanStarted {
        /// Normalized roots, in walk order
        roots: Vec<PathBuf>,
        /// Digest algorithm for the run
        algorithm: DigestAlgorithm,
    },

    /// The walker moved into a directory containing candidates.
    DirectoryProgress {
        /// Directory just entered
        directory: PathBuf,
        /// Candidates seen so far
        files_seen: usize,
        /// Candidates so far whose size was already seen
        potential_files: usize,
        /// Bytes held by those candidates
        potential_bytes: u64,
    },

    /// An entry could not be read while walking.
    ScanError {
        /// Offending path
        path: PathBuf,
        /// Error text
        message: String,
    },

    /// Size grouping finished.
    SizeGrouped {
        /// Candidates walked
        candidates: usize,
        /// Candidates in multi-member size buckets
        potential_duplicates: usize,
        /// Of those, candidates after the first in each bucket
        redundant_files: usize,
        /// Upper bound on reclaimable bytes before hashing
        potential_bytes: u64,
    },

    /// Content hashing is about to start.
    HashStarted {
        /// Digest algorithm
        algorithm: DigestAlgorithm,
        /// Files to hash
        files: usize,
    },

    /// A file could not be hashed and was dropped from its group.
    HashError {
        /// Offending path
        path: PathBuf,
        /// Error text
        message: String,
    },

    /// A confirmed duplicate group.
    DuplicateGroup {
        /// Shared size in bytes
        size: u64,
        /// Shared digest, lowercase hex
        digest: String,
        /// Retained copy
        canonical: PathBuf,
        /// Copies to be replaced
        duplicates: Vec<PathBuf>,
    },

    /// Result of handling one duplicate.
    Replacement {
        /// Dry-run or real-run
        mode: LinkMode,
        /// Duplicate path
        duplicate: PathBuf,
        /// Canonical path the link points at
        canonical: PathBuf,
        /// File size in bytes
        size: u64,
        /// What happened
        status: ReplacementStatus,
        /// Reason for a skip or failure
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    /// Final totals of the link phase.
    LinkSummary {
        /// Dry-run or real-run
        mode: LinkMode,
        /// Duplicates handled (planned or replaced)
        completed: usize,
        /// Bytes planned or reclaimed
        bytes: u64,
        /// Duplicates skipped
        skipped: usize,
        /// Duplicates that failed
        failed: usize,
        /// Whether the batch stopped early
        interrupted: bool,
    },
}

/// Short status of a replacement, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementStatus {
    /// Dry-run: would be replaced
    Planned,
    /// Replaced by a symlink
    Replaced,
    /// Left alone on purpose
    Skipped,
    /// Replacement attempted and failed
    Failed,
}

/// Receiver of pipeline events.
///
/// Sinks are shared across worker threads, so `emit` takes `&self`.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: &Event);
}

/// Sink that records events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
