//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based candidate grouping
//! - Content digest verification
//! - Pipeline orchestration across several roots

pub mod finder;
pub mod groups;

pub use finder::{
    verify_by_digest, CanonicalOrder, DuplicateFinder, FinderConfig, FinderError, HashConfig,
    HashStats, ScanSummary,
};
pub use groups::{
    group_by_digest, group_by_size, GroupingStats, HashBucket, HashKey, SizeBucket, SizeBuckets,
};
