//! Progress reporting using indicatif.
//!
//! [`ProgressCallback`] is the hook the walker and the hashing pool call
//! into. [`Progress`] renders it as a spinner while walking and a bar while
//! hashing, drawn on stderr so the report on stdout stays clean.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress callback for the pipeline phases.
///
/// Phases are named `"walking"` and `"hashing"`.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 when unknown.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called per unit of work: a directory while walking, a file while hashing.
    fn on_progress(&self, current: usize, path: &str);

    /// Called after a file has been hashed, with its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Terminal progress reporter.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl Progress {
    /// Create a reporter. A `hidden` reporter draws nothing.
    #[must_use]
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            hidden,
        }
    }

    fn walking_bar(&self) -> ProgressBar {
        let bar = self.new_bar(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} Walking [{elapsed_precise}] {pos} dirs {wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    fn hashing_bar(&self, total: usize) -> ProgressBar {
        let bar = self.new_bar(ProgressBar::new(total as u64));
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} Hashing [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar
    }

    fn new_bar(&self, bar: ProgressBar) -> ProgressBar {
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            bar.set_draw_target(ProgressDrawTarget::stderr());
        }
        bar
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let bar = match phase {
            "hashing" => self.hashing_bar(total),
            _ => self.walking_bar(),
        };
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(previous) = guard.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        self.with_bar(|bar| {
            bar.set_position(current as u64);
            bar.set_message(path.to_string());
        });
    }

    fn on_phase_end(&self, _phase: &str) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}
