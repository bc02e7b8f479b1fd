//! Inode identity for hardlink detection.
//!
//! # Overview
//!
//! Hardlinks are multiple directory entries pointing to the same inode on
//! disk. Two such paths hash identically, yet replacing one with a symlink
//! reclaims nothing. The link replacer uses [`FileId`] to recognise this
//! case and skip it.
//!
//! # Platform Support
//!
//! - **Unix**: Uses (device_id, inode) pairs from file metadata
//! - **Other**: Identity unavailable; every path is treated as distinct
//!
//! # Example
//!
//! ```no_run
//! use symdupe::scanner::hardlink::is_same_file;
//! use std::path::Path;
//!
//! if is_same_file(Path::new("a.jpg"), Path::new("b.jpg")).unwrap_or(false) {
//!     println!("already hardlinked");
//! }
//! ```

use std::fs::Metadata;
use std::io;
use std::path::Path;

/// Platform-specific file identity.
///
/// On Unix, this is (device_id, inode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    _phantom: (),
}

impl FileId {
    /// Create a file identity from metadata.
    ///
    /// Returns `None` if the platform doesn't expose inode information.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Identity of the entry at `path`, without following symlinks.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from `symlink_metadata`.
    pub fn of(path: &Path) -> io::Result<Option<Self>> {
        Ok(Self::from_metadata(&std::fs::symlink_metadata(path)?))
    }

    /// Check if identity detection is supported on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

/// Whether two paths name the same inode.
///
/// Returns `false` on platforms without identity support.
///
/// # Errors
///
/// Returns the I/O error if either path cannot be inspected.
pub fn is_same_file(a: &Path, b: &Path) -> io::Result<bool> {
    match (FileId::of(a)?, FileId::of(b)?) {
        (Some(x), Some(y)) => Ok(x == y),
        _ => Ok(false),
    }
}
