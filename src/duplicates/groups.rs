//! Size and digest grouping.
//!
//! # Overview
//!
//! Two typed groupings carry candidates through the pipeline:
//!
//! - [`SizeBuckets`]: candidates keyed by exact byte size, in first-seen
//!   order. Files with a unique size are pruned here and are never hashed.
//! - [`HashBucket`]: candidates sharing a [`HashKey`] (size and digest), in
//!   discovery order. The first member is the canonical copy.
//!
//! # Example
//!
//! ```
//! use symdupe::scanner::Candidate;
//! use symdupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     Candidate::new(PathBuf::from("/file1.txt"), 1024),
//!     Candidate::new(PathBuf::from("/file2.txt"), 1024),
//!     Candidate::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::{Candidate, Digest};

/// Candidates that share one exact size, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// File size in bytes (shared by all members)
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<Candidate>,
}

impl SizeBucket {
    /// Number of files in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Potential space savings (all copies minus one).
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.size * (self.files.len().saturating_sub(1) as u64)
    }
}

/// Multi-member size buckets in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeBuckets {
    buckets: Vec<SizeBucket>,
}

impl SizeBuckets {
    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if there are no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterate buckets in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, SizeBucket> {
        self.buckets.iter()
    }

    /// Look up the bucket for a size.
    #[must_use]
    pub fn get(&self, size: u64) -> Option<&SizeBucket> {
        self.buckets.iter().find(|b| b.size == size)
    }

    /// Total number of candidates across all buckets.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.buckets.iter().map(SizeBucket::len).sum()
    }

    /// Upper bound on reclaimable bytes before content is compared.
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.buckets.iter().map(SizeBucket::potential_savings).sum()
    }
}

impl IntoIterator for SizeBuckets {
    type Item = SizeBucket;
    type IntoIter = std::vec::IntoIter<SizeBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.into_iter()
    }
}

impl<'a> IntoIterator for &'a SizeBuckets {
    type Item = &'a SizeBucket;
    type IntoIter = std::slice::Iter<'a, SizeBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_buckets: usize,
    /// Bytes held by every member after the first in each bucket
    pub potential_savings: u64,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group candidates by exact size.
///
/// Every candidate is stamped with its position in `files` as its `seq`,
/// so the input must already be in discovery order. Only buckets with two
/// or more members are returned, in the order their size was first seen.
///
/// No file I/O is performed.
///
/// # Example
///
/// ```
/// use symdupe::scanner::Candidate;
/// use symdupe::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     Candidate::new(PathBuf::from("/a.txt"), 100),
///     Candidate::new(PathBuf::from("/b.txt"), 200),
///     Candidate::new(PathBuf::from("/c.txt"), 100),
/// ];
///
/// let (buckets, stats) = group_by_size(files);
///
/// let bucket = buckets.get(100).unwrap();
/// assert_eq!(bucket.files[0].seq, 0);
/// assert_eq!(bucket.files[1].seq, 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = Candidate>) -> (SizeBuckets, GroupingStats) {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut all: Vec<SizeBucket> = Vec::new();
    let mut stats = GroupingStats::default();

    for (seq, mut file) in files.into_iter().enumerate() {
        stats.total_files += 1;
        stats.total_size += file.size;
        file.seq = seq;

        let slot = *index.entry(file.size).or_insert_with(|| {
            all.push(SizeBucket {
                size: file.size,
                files: Vec::new(),
            });
            all.len() - 1
        });
        all[slot].files.push(file);
    }

    stats.unique_sizes = all.len();

    let buckets: Vec<SizeBucket> = all
        .into_iter()
        .filter(|bucket| {
            if bucket.files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    bucket.size,
                    bucket.files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += bucket.files.len();
                stats.duplicate_buckets += 1;
                stats.potential_savings += bucket.potential_savings();
                log::debug!(
                    "Size bucket {} bytes: {} potential duplicates",
                    bucket.size,
                    bucket.files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping: {} files, {} unique sizes, {} potential duplicates in {} buckets",
        stats.total_files,
        stats.unique_sizes,
        stats.potential_duplicates,
        stats.duplicate_buckets
    );

    (SizeBuckets { buckets }, stats)
}

/// Grouping key after content verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    /// File size in bytes
    pub size: u64,
    /// Content digest
    pub digest: Digest,
}

/// Confirmed duplicate set: files sharing size and digest.
///
/// Members are kept in discovery order unless re-sorted with
/// [`HashBucket::sort_by_path`]. The first member is canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashBucket {
    /// Shared size and digest
    pub key: HashKey,
    /// Members, canonical first
    pub files: Vec<Candidate>,
}

impl HashBucket {
    /// Shared file size.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.key.size
    }

    /// Shared digest.
    #[must_use]
    pub fn digest(&self) -> Digest {
        self.key.digest
    }

    /// Number of files in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The retained copy, if any member exists.
    #[must_use]
    pub fn canonical(&self) -> Option<&Candidate> {
        self.files.first()
    }

    /// Every member after the canonical one.
    #[must_use]
    pub fn duplicates(&self) -> &[Candidate] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Number of duplicate copies (total - 1 canonical).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.key.size * self.duplicate_count() as u64
    }

    /// Paths of all members, canonical first.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Whether `path` is a member of this bucket.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    /// Reorder members lexicographically by path.
    pub fn sort_by_path(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Discovery sequence of the earliest member.
    #[must_use]
    pub fn first_seq(&self) -> usize {
        self.files.iter().map(|f| f.seq).min().unwrap_or(usize::MAX)
    }
}

/// Group digested candidates into confirmed duplicate buckets.
///
/// `hashed` must already be in discovery order (ascending `seq`); that
/// order is carried into each bucket. Buckets with fewer than two members
/// are dropped. The result is ordered by the `seq` of each bucket's first
/// member.
#[must_use]
pub fn group_by_digest(hashed: impl IntoIterator<Item = (Candidate, Digest)>) -> Vec<HashBucket> {
    let mut index: HashMap<HashKey, usize> = HashMap::new();
    let mut all: Vec<HashBucket> = Vec::new();

    for (file, digest) in hashed {
        let key = HashKey {
            size: file.size,
            digest,
        };
        let slot = *index.entry(key).or_insert_with(|| {
            all.push(HashBucket {
                key,
                files: Vec::new(),
            });
            all.len() - 1
        });
        all[slot].files.push(file);
    }

    let mut buckets: Vec<HashBucket> = all.into_iter().filter(|b| b.files.len() > 1).collect();
    buckets.sort_by_key(HashBucket::first_seq);

    for bucket in &buckets {
        log::debug!(
            "Duplicate group {}: {} files, {} bytes each",
            bucket.key.digest,
            bucket.len(),
            bucket.key.size
        );
    }

    buckets
}
