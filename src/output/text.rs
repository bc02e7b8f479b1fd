//! Human-readable console report.
//!
//! ```text
//! Potentially saved so far: 3 bytes | 1 files | /data/A/sub
//! ==============================================================================================================
//! Potentially 2 duplicate files with total size before hash check: 6 bytes
//! Calculating CRC32 checksums...
//! ==============================================================================================================
//! DRY RUN - symlink : /data/A/sub/b.txt --> /data/A/a.txt
//! Would remove      : /data/A/sub/b.txt (size= 3 bytes)
//! =======================================================
//! Would remove 1 files, total size = 3 bytes (3 B)
//! ```

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use bytesize::ByteSize;
use yansi::{Color, Paint};

use super::group_digits;
use crate::events::{Event, EventSink, ReplacementStatus};
use crate::scanner::DigestAlgorithm;

const WIDE_RULE: &str =
    "==============================================================================================================";
const NARROW_RULE: &str = "=======================================================";

/// Writes events as console lines.
pub struct TextReporter<W: Write + Send> {
    out: Mutex<W>,
    color: bool,
    directory_progress: bool,
}

impl TextReporter<std::io::Stdout> {
    /// Reporter on stdout.
    #[must_use]
    pub fn stdout(color: bool) -> Self {
        Self::new(std::io::stdout(), color)
    }
}

impl<W: Write + Send> TextReporter<W> {
    /// Reporter on an arbitrary writer.
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            color,
            directory_progress: true,
        }
    }

    /// Toggle the per-directory "Potentially saved so far" lines.
    #[must_use]
    pub fn with_directory_progress(mut self, enabled: bool) -> Self {
        self.directory_progress = enabled;
        self
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.paint(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn render(&self, event: &Event) -> Vec<String> {
        match event {
            Event::ScanStarted { roots, algorithm } => {
                let mut lines: Vec<String> = roots
                    .iter()
                    .enumerate()
                    .map(|(i, root)| format!("Directory {}:    {}", i + 1, root.display()))
                    .collect();
                lines.push(format!("Checksum:       {}", algorithm_label(*algorithm)));
                lines
            }
            Event::DirectoryProgress {
                directory,
                potential_files,
                potential_bytes,
                ..
            } if self.directory_progress => vec![format!(
                "Potentially saved so far: {} bytes | {} files | {}",
                group_digits(*potential_bytes),
                group_digits(*potential_files as u64),
                directory.display()
            )],
            Event::DirectoryProgress { .. } => Vec::new(),
            Event::ScanError { path, message } | Event::HashError { path, message } => {
                let line = format!("Error             : {} ({message})", path.display());
                vec![self.paint(&line, Color::Red)]
            }
            Event::SizeGrouped {
                redundant_files,
                potential_bytes,
                ..
            } => vec![
                WIDE_RULE.to_string(),
                format!(
                    "Potentially {} duplicate files with total size before hash check: {} bytes",
                    group_digits(*redundant_files as u64),
                    group_digits(*potential_bytes)
                ),
            ],
            Event::HashStarted { algorithm, .. } => vec![
                format!("Calculating {} checksums...", algorithm_label(*algorithm)),
                WIDE_RULE.to_string(),
            ],
            Event::DuplicateGroup { .. } => Vec::new(),
            Event::Replacement {
                duplicate,
                canonical,
                size,
                status,
                detail,
                ..
            } => self.render_replacement(duplicate, canonical, *size, *status, detail.as_deref()),
            Event::LinkSummary {
                mode,
                completed,
                bytes,
                skipped,
                failed,
                interrupted,
            } => {
                let verb = if mode.is_real() { "Removed" } else { "Would remove" };
                let mut lines = vec![self.paint(
                    &format!(
                        "{verb} {} files, total size = {} bytes ({})",
                        group_digits(*completed as u64),
                        group_digits(*bytes),
                        ByteSize::b(*bytes)
                    ),
                    Color::Green,
                )];
                if *skipped > 0 {
                    lines.push(format!(
                        "Skipped {} files already linked to their canonical copy",
                        group_digits(*skipped as u64)
                    ));
                }
                if *failed > 0 {
                    let line = format!("Failed to replace {} files", group_digits(*failed as u64));
                    lines.push(self.paint(&line, Color::Red));
                }
                if *interrupted {
                    lines.push(self.paint(
                        "Interrupted before all duplicates were handled",
                        Color::Yellow,
                    ));
                }
                lines
            }
        }
    }

    fn render_replacement(
        &self,
        duplicate: &Path,
        canonical: &Path,
        size: u64,
        status: ReplacementStatus,
        detail: Option<&str>,
    ) -> Vec<String> {
        let dup = duplicate.display();
        let canon = canonical.display();
        match status {
            ReplacementStatus::Planned => vec![
                format!("DRY RUN - symlink : {dup} --> {canon}"),
                format!("Would remove      : {dup} (size= {} bytes)", group_digits(size)),
                NARROW_RULE.to_string(),
            ],
            ReplacementStatus::Replaced => vec![
                format!("Removed           : {dup}"),
                format!("symlink           : {dup} --> {canon}"),
                NARROW_RULE.to_string(),
            ],
            ReplacementStatus::Skipped => vec![self.paint(
                &format!("Skipped           : {dup} ({})", detail.unwrap_or("skipped")),
                Color::Yellow,
            )],
            ReplacementStatus::Failed => vec![self.paint(
                &format!("Failed            : {dup} ({})", detail.unwrap_or("failed")),
                Color::Red,
            )],
        }
    }
}

fn algorithm_label(algorithm: DigestAlgorithm) -> &'static str {
    match algorithm {
        DigestAlgorithm::Crc32 => "CRC32",
        DigestAlgorithm::Md5 => "MD5",
    }
}

impl<W: Write + Send> EventSink for TextReporter<W> {
    fn emit(&self, event: &Event) {
        let lines = self.render(event);
        if lines.is_empty() {
            return;
        }
        if let Ok(mut out) = self.out.lock() {
            for line in lines {
                if let Err(e) = writeln!(out, "{line}") {
                    log::warn!("Failed to write report line: {}", e);
                    return;
                }
            }
            let _ = out.flush();
        }
    }
}
