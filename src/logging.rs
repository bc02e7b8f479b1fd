//! Diagnostic logging via `log` and `env_logger`.
//!
//! Logs go to stderr so they never mix with the report on stdout. The level
//! comes from `RUST_LOG` when set, otherwise from `-q` / `-v` / `-vv`
//! (error / debug / trace, info by default).

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize the logger from CLI verbosity flags.
///
/// Safe to call more than once; later calls are ignored, so tests that go
/// through [`crate::run_app`] repeatedly do not panic.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();
    let from_env = env::var("RUST_LOG").is_ok();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    // Debug builds add a timestamp and, from -v up, the module path.
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let stamp = if cfg!(debug_assertions) {
            format!("{} ", buf.timestamp_seconds())
        } else {
            String::new()
        };
        if cfg!(debug_assertions) && verbose >= 1 {
            writeln!(
                buf,
                "{stamp}{style}{:<5}{style:#} [{}] {}",
                record.level(),
                record.module_path().unwrap_or("symdupe"),
                record.args()
            )
        } else {
            writeln!(buf, "{stamp}{style}{:<5}{style:#} {}", record.level(), record.args())
        }
    });

    if builder.try_init().is_ok() {
        log::debug!(
            "Logging initialized ({})",
            if from_env { "RUST_LOG" } else { "cli flags" }
        );
    }
}

/// Map CLI flags to a level filter. Quiet wins over verbose.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
