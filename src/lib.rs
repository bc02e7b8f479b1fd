//! symdupe - duplicate file finder that replaces copies with symlinks
//!
//! A run walks one or more directory trees, groups candidate files by exact
//! size, confirms duplicates by streaming CRC-32 (or MD5) digests, and then
//! either previews (default) or performs the replacement of every
//! non-canonical copy with a symbolic link to the canonical one.
//!
//! # Pipeline
//!
//! 1. [`scanner::Walker`]: lazy, name-sorted traversal with size, spec and
//!    excluded-directory gates
//! 2. [`duplicates::group_by_size`]: drop every file with a unique size
//! 3. [`duplicates::verify_by_digest`]: parallel digests, stitched back into
//!    discovery order
//! 4. [`actions::apply_plans`]: dry-run or atomic symlink swap
//!
//! Everything observable is delivered as an [`events::Event`] to an
//! [`events::EventSink`]; [`output`] renders those as text or JSON lines.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod events;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{apply_plans, plan_replacements, LinkConfig};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::events::EventSink;
use crate::output::{JsonlReporter, TextReporter};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{DigestAlgorithm, FileSpecs, WalkerConfig};

/// Run the application for parsed command-line arguments.
///
/// Loads configuration, picks the reporter for the output format and hands
/// off to [`execute`].
///
/// # Errors
///
/// Returns an error for bad configuration, invalid file specs, missing or
/// non-directory roots, and interruption during the scan. Use
/// [`ExitCode::for_error`] to map it to an exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    if cli.dirs.is_empty() {
        eprintln!("At least one directory was not given. Exiting...");
        return Ok(ExitCode::Success);
    }

    let config = Config::load(cli.config.as_deref())?.apply_cli(&cli);

    let sink: Arc<dyn EventSink> = match config.output {
        OutputFormat::Json => Arc::new(JsonlReporter::stdout()),
        OutputFormat::Text => {
            let color = !cli.no_color && std::io::stdout().is_terminal();
            Arc::new(TextReporter::stdout(color).with_directory_progress(!cli.quiet))
        }
    };

    execute(&cli, &config, sink)
}

/// Output format after merging configuration files, environment and flags.
///
/// Falls back to the command-line flag (or text) when the configuration
/// cannot be loaded, so fatal config errors still honour `--output`.
#[must_use]
pub fn output_format(cli: &Cli) -> OutputFormat {
    match Config::load(cli.config.as_deref()) {
        Ok(config) => config.apply_cli(cli).output,
        Err(_) => cli.output.unwrap_or_default(),
    }
}

/// Run the pipeline with an already-resolved configuration.
///
/// Events go to `sink`; nothing is written to stdout directly.
///
/// # Errors
///
/// Same as [`run_app`], minus configuration loading.
pub fn execute(cli: &Cli, config: &Config, sink: Arc<dyn EventSink>) -> anyhow::Result<ExitCode> {
    if cli.dirs.is_empty() {
        return Ok(ExitCode::Success);
    }

    let file_specs = FileSpecs::new(&cli.file_specs)?;
    if !file_specs.is_empty() {
        log::debug!("Matching file specs: {}", file_specs.patterns().join(", "));
    }
    let walker_config = WalkerConfig::default()
        .with_min_size(config.min_size)
        .with_max_size(config.max_size)
        .with_file_specs(file_specs)
        .with_excluded_dir_names(config.exclude_dir_names.clone())
        .with_ignore_patterns(config.ignore_patterns.clone());

    let algorithm = if config.md5 {
        DigestAlgorithm::Md5
    } else {
        DigestAlgorithm::Crc32
    };

    let shutdown = signal::install_handler().context("installing Ctrl+C handler")?;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(
        cli.quiet || config.output == OutputFormat::Json,
    ));

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_io_threads(config.io_threads)
            .with_walker_config(walker_config)
            .with_algorithm(algorithm)
            .with_canonical_order(config.canonical)
            .with_shutdown_flag(shutdown.get_flag())
            .with_progress_callback(progress)
            .with_event_sink(Arc::clone(&sink)),
    );

    let (groups, summary) = finder.find_duplicates_in_paths(&cli.dirs)?;
    log::info!(
        "Scan complete in {:.2?}: {} files, {} duplicate groups, {} reclaimable ({:.1}%)",
        summary.scan_duration,
        summary.total_files,
        summary.duplicate_groups,
        summary.reclaimable_display(),
        summary.wasted_percentage()
    );

    let plans = plan_replacements(&groups);
    let link_config = if cli.remove {
        LinkConfig::real()
    } else {
        LinkConfig::dry_run()
    }
    .with_shutdown_flag(shutdown.get_flag())
    .with_event_sink(sink);

    let report = apply_plans(&plans, &link_config);

    let code = if report.interrupted {
        ExitCode::Interrupted
    } else if summary.error_count() > 0 || !report.all_succeeded() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };
    Ok(code)
}
