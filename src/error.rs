//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::FinderError;
use crate::scanner::SpecError;

/// Exit codes for the symdupe application.
///
/// - 0: Success (including the "no directory given" case)
/// - 1: General error (unexpected failure)
/// - 2: Usage error (bad file spec, bad root, bad config)
/// - 3: Partial success (non-fatal scan, hash or replacement errors)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed without errors.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Usage error: invalid arguments or roots.
    UsageError = 2,
    /// Partial success: completed, but some files were skipped or failed.
    PartialSuccess = 3,
    /// Interrupted: the run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SD000",
            Self::GeneralError => "SD001",
            Self::UsageError => "SD002",
            Self::PartialSuccess => "SD003",
            Self::Interrupted => "SD130",
        }
    }

    /// Classify a top-level error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if let Some(finder) = err.downcast_ref::<FinderError>() {
            return match finder {
                FinderError::Interrupted => Self::Interrupted,
                FinderError::PathNotFound(_) | FinderError::NotADirectory(_) => Self::UsageError,
                FinderError::IoWithPath { .. } => Self::GeneralError,
            };
        }
        if err.downcast_ref::<SpecError>().is_some()
            || err.downcast_ref::<crate::config::ConfigError>().is_some()
        {
            return Self::UsageError;
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "SD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
