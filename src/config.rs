//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <PATH>`, or `config.toml` in the platform config
//!    directory if it exists
//! 3. Environment variables prefixed `SYMDUPE_` (e.g. `SYMDUPE_IO_THREADS=8`)
//! 4. Command-line flags (applied by the caller)
//!
//! # Example file
//!
//! ```toml
//! min_size = 4096
//! io_threads = 2
//! md5 = true
//! exclude_dir_names = [".thumbnails"]
//! ignore_patterns = ["*.part"]
//! canonical = "path"
//! output = "text"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::CanonicalOrder;

/// Environment variable prefix for configuration keys.
pub const ENV_PREFIX: &str = "SYMDUPE_";

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or had a bad value.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum candidate size in bytes.
    pub min_size: u64,
    /// Maximum candidate size in bytes.
    pub max_size: Option<u64>,
    /// Hashing threads.
    pub io_threads: usize,
    /// Use MD5 instead of CRC-32.
    pub md5: bool,
    /// Extra directory names to skip, added to `@eaDir`.
    pub exclude_dir_names: Vec<String>,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Canonical member selection.
    pub canonical: CanonicalOrder,
    /// Output format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: None,
            io_threads: 4,
            md5: false,
            exclude_dir_names: Vec::new(),
            ignore_patterns: Vec::new(),
            canonical: CanonicalOrder::default(),
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Default platform-specific config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "symdupe", "symdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    ///
    /// An explicit `path` is always merged; otherwise the default path is
    /// merged only when it exists.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(p) => figment = figment.merge(Toml::file(p)),
            None => {
                if let Some(p) = Self::default_path().filter(|p| p.exists()) {
                    log::debug!("Loading config from {}", p.display());
                    figment = figment.merge(Toml::file(p));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `path` is given and missing, or
    /// [`ConfigError::Invalid`] if any layer fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = path {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.to_path_buf()));
            }
        }

        let config: Self = Self::figment(path).extract().map_err(Box::new)?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Overlay command-line flags. Flags given on the command line win;
    /// list-valued flags extend the configured lists.
    #[must_use]
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(min) = cli.min_size {
            self.min_size = min;
        }
        if cli.max_size.is_some() {
            self.max_size = cli.max_size;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        self.md5 |= cli.md5;
        extend_unique(&mut self.exclude_dir_names, &cli.exclude_dirs);
        extend_unique(&mut self.ignore_patterns, &cli.exclude);
        if let Some(order) = cli.canonical {
            self.canonical = order;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        self
    }
}

fn extend_unique(target: &mut Vec<String>, extra: &[String]) {
    for item in extra {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
