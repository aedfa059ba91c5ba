//! Logging infrastructure for iddedup.
//!
//! Structured logging through the `log` facade with an `env_logger` backend.
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Every line carries a timestamp, the level and the name of the emitting
//! thread, so output from the worker pool can be told apart:
//!
//! ```text
//! [2024-01-02 10:11:12,345][WARNING][iddedup-worker-3] permission denied: /mnt/share/locked
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use iddedup::logging::init_logging;
//!
//! // Initialize with default (info) level
//! init_logging(0, false);
//! ```

use std::env;
use std::io::Write;
use std::thread;

use chrono::Local;
use env_logger::Builder;
use log::{Level, LevelFilter};

/// Timestamp layout for log lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Call once at startup, before any logging calls are made.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
///
/// # Panics
///
/// Panics if called more than once, as `env_logger` can only be
/// initialized once per process.
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(|buf, record| {
        let current = thread::current();
        let line = format_line(
            &Local::now().format(TIMESTAMP_FORMAT).to_string(),
            record.level(),
            &thread_label(&current),
            &record.args().to_string(),
        );
        writeln!(buf, "{line}")
    });

    builder.init();

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet)
        );
    }
}

/// Determine the log level from CLI flags.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Level names as they appear in log lines.
fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Thread name, or its id for unnamed threads.
fn thread_label(thread: &thread::Thread) -> String {
    thread
        .name()
        .map_or_else(|| format!("{:?}", thread.id()), str::to_string)
}

fn format_line(timestamp: &str, level: Level, thread: &str, message: &str) -> String {
    format!("[{timestamp}][{}][{thread}] {message}", level_label(level))
}
