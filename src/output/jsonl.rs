//! Line-delimited JSON report.
//!
//! Every [`Event`] becomes one compact object tagged by `"event"`:
//!
//! ```json
//! {"event":"duplicate_group","size":3,"digest":"352441c2","canonical":"/A/a.txt","duplicates":["/A/sub/b.txt"]}
//! {"event":"replacement","mode":"dry_run","duplicate":"/A/sub/b.txt","canonical":"/A/a.txt","size":3,"status":"planned"}
//! ```

use std::io::Write;
use std::sync::Mutex;

use crate::events::{Event, EventSink};

/// Writes one JSON object per event.
pub struct JsonlReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonlReporter<std::io::Stdout> {
    /// Reporter on stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonlReporter<W> {
    /// Reporter on an arbitrary writer.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for JsonlReporter<W> {
    fn emit(&self, event: &Event) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to serialize event: {}", e);
                return;
            }
        };
        if let Ok(mut out) = self.out.lock() {
            if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                log::warn!("Failed to write event: {}", e);
            }
        }
    }
}
