//! Ctrl+C handling.
//!
//! A single `AtomicBool` is shared with the walker, the hashing pool and the
//! link replacer. Each polls it between units of work: the walker between
//! entries, the hasher between 4 KiB blocks, the replacer between plans.
//! A replacement already in flight always finishes its rename.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was received or [`Self::request_shutdown`] called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for `with_shutdown_flag` builders.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// ctrlc refused the handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook, or reuse the one already installed.
///
/// ctrlc allows a single hook per process, so repeat calls (several
/// `run_app` invocations in one test binary) get the existing handler with
/// its flag cleared.
///
/// # Errors
///
/// Returns [`SignalError`] only when the hook cannot be registered and no
/// handler exists yet to fall back on.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(existing) = GLOBAL_HANDLER.get() {
        existing.reset();
        return Ok(existing.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing current file...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone()),
        Err(ctrlc::Error::MultipleHandlers) => {
            Ok(GLOBAL_HANDLER.get_or_init(unhooked_handler).clone())
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}

/// Handler used when another component already owns the Ctrl+C hook.
///
/// Its flag is only ever set through [`ShutdownHandler::request_shutdown`].
fn unhooked_handler() -> ShutdownHandler {
    log::warn!("Another Ctrl+C handler is registered; interruption will not be detected");
    ShutdownHandler::new()
}
