//! Streaming content digests.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing a content
//! digest of a file by reading it in [`BLOCK_SIZE`] blocks and folding each
//! block into a running state. Two algorithms are available:
//!
//! - [`DigestAlgorithm::Crc32`]: 32-bit CRC (zlib polynomial). Fast, default.
//! - [`DigestAlgorithm::Md5`]: 128-bit MD5. Slower, far lower collision odds.
//!
//! The digest is a pure function of the file's bytes; timestamps and
//! permissions never contribute.
//!
//! # Example
//!
//! ```no_run
//! use symdupe::scanner::{DigestAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(DigestAlgorithm::Md5);
//! let digest = hasher.digest_file(Path::new("photo.jpg")).unwrap();
//! println!("{}", digest);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use md5::Digest as _;
use serde::{Deserialize, Serialize};

use super::HashError;

/// Read block size used when streaming file content.
pub const BLOCK_SIZE: usize = 4096;

/// Digest algorithm, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// CRC-32 checksum
    #[default]
    Crc32,
    /// MD5 message digest
    Md5,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc32 => write!(f, "crc32"),
            Self::Md5 => write!(f, "md5"),
        }
    }
}

/// A computed content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    /// CRC-32 value
    Crc32(u32),
    /// MD5 value
    Md5([u8; 16]),
}

impl Digest {
    /// The algorithm that produced this digest.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::Crc32(_) => DigestAlgorithm::Crc32,
            Self::Md5(_) => DigestAlgorithm::Md5,
        }
    }

    /// Lowercase hexadecimal representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        match self {
            Self::Crc32(v) => format!("{v:08x}"),
            Self::Md5(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

enum DigestState {
    Crc32(crc32fast::Hasher),
    Md5(md5::Md5),
}

impl DigestState {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
            DigestAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
        }
    }

    fn update(&mut self, block: &[u8]) {
        match self {
            Self::Crc32(h) => h.update(block),
            Self::Md5(h) => h.update(block),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Crc32(h) => Digest::Crc32(h.finalize()),
            Self::Md5(h) => {
                let mut out = [0u8; 16];
                out.copy_from_slice(&h.finalize());
                Digest::Md5(out)
            }
        }
    }
}

/// Streaming file hasher.
///
/// Each call owns its own digest state, so one `Hasher` can be shared
/// across worker threads.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: DigestAlgorithm,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag; hashing stops between blocks once it is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Returns the first non-`Interrupted` I/O error, or an
    /// `ErrorKind::Interrupted` error if shutdown was requested.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut state = DigestState::new(self.algorithm);
        let mut block = [0u8; BLOCK_SIZE];

        loop {
            if self.is_shutdown_requested() {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "shutdown"));
            }
            match reader.read(&mut block) {
                Ok(0) => break,
                Ok(n) => state.update(&block[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(state.finalize())
    }

    /// Digest a file's content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if
    /// shutdown was requested mid-file.
    pub fn digest_file(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        self.digest_reader(file).map_err(|e| {
            if e.kind() == io::ErrorKind::Interrupted {
                HashError::Interrupted(path.to_path_buf())
            } else {
                HashError::from_io(path.to_path_buf(), e)
            }
        })
    }
}
