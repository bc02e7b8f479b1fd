//! File spec matching for candidate selection.
//!
//! A file spec is a glob pattern matched against a full path from the right:
//! a relative pattern made of N components must match the last N components
//! of the path, and an absolute pattern must match the whole path. `*` never
//! crosses a path separator.
//!
//! | Pattern      | Matches                          | Does not match        |
//! |--------------|----------------------------------|-----------------------|
//! | `*.JPG`      | `/photos/2019/a.JPG`             | `/photos/a.jpg`       |
//! | `raw/*.cr2`  | `/photos/raw/a.cr2`              | `/photos/raw/x/a.cr2` |
//! | `/srv/*/*.mp4` | `/srv/tv/ep1.mp4`              | `/srv/tv/s1/ep1.mp4`  |
//!
//! An empty spec set matches every file.
//!
//! # Example
//!
//! ```
//! use symdupe::scanner::FileSpecs;
//! use std::path::Path;
//!
//! let specs = FileSpecs::new(["*.txt"]).unwrap();
//! assert!(specs.matches(Path::new("/a/b/notes.txt")));
//! assert!(!specs.matches(Path::new("/a/b/notes.md")));
//! ```

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

/// Errors raised while compiling file specs.
#[derive(thiserror::Error, Debug)]
pub enum SpecError {
    /// The pattern was empty.
    #[error("file spec cannot be empty")]
    Empty,

    /// The pattern is not a valid glob.
    #[error("invalid file spec '{pattern}': {source}")]
    InvalidGlob {
        /// The offending pattern
        pattern: String,
        /// Underlying glob error
        #[source]
        source: globset::Error,
    },
}

#[derive(Debug, Clone)]
struct FileSpec {
    pattern: String,
    matcher: GlobMatcher,
    components: usize,
    absolute: bool,
}

impl FileSpec {
    fn parse(pattern: &str) -> Result<Self, SpecError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(SpecError::Empty);
        }

        let as_path = Path::new(trimmed);
        let absolute = as_path.has_root();
        let components = as_path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count();

        let matcher = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|source| SpecError::InvalidGlob {
                pattern: trimmed.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(Self {
            pattern: trimmed.to_string(),
            matcher,
            components,
            absolute,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        if self.absolute {
            return self.matcher.is_match(path);
        }

        let normal: Vec<_> = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        if self.components == 0 || normal.len() < self.components {
            return false;
        }

        let tail: PathBuf = normal[normal.len() - self.components..].iter().collect();
        self.matcher.is_match(&tail)
    }
}

/// A compiled set of file specs.
///
/// The default value is the empty set, which matches everything.
#[derive(Debug, Clone, Default)]
pub struct FileSpecs {
    specs: Vec<FileSpec>,
}

impl FileSpecs {
    /// Compile a list of patterns.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] for the first empty or malformed pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let specs = patterns
            .into_iter()
            .map(|p| FileSpec::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { specs })
    }

    /// Whether no specs were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The source patterns, in the order given.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.pattern.as_str()).collect()
    }

    /// Check whether a path matches at least one spec.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.specs.is_empty() || self.specs.iter().any(|s| s.matches(path))
    }
}
