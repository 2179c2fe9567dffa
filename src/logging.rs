//! Logging infrastructure for codealarm.
//!
//! This module provides structured logging using the `log` facade and `env_logger` backend.
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! While the TUI owns the terminal, records go to a log file instead of stderr so they
//! never draw over the interface.
//!
//! # Formatting
//!
//! - **Log files and debug builds**: timestamp, level, message
//! - **Release builds on stderr**: level and message only
//! - `-v` and above add the module path
//!
//! # Example
//!
//! ```rust,no_run
//! use codealarm::logging::{init_logging, LogTarget};
//!
//! // Default (info) level on stderr
//! init_logging(0, false, LogTarget::Stderr);
//!
//! // Debug level into a file, as the TUI does
//! init_logging(1, false, LogTarget::File("/tmp/codealarm.log".into()));
//! ```

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to this file, creating it and its directory if needed.
    File(PathBuf),
}

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// This function should be called once at the start of the application,
/// before any logging calls are made.
///
/// # Priority
///
/// 1. If `RUST_LOG` environment variable is set, it takes precedence
/// 2. If `quiet` is true: Error level only
/// 3. If `verbose >= 2`: Trace level
/// 4. If `verbose == 1`: Debug level
/// 5. Default: Info level
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
/// * `target` - stderr or a log file; falls back to stderr if the file cannot be opened
///
/// Calling this more than once is harmless: later calls are ignored.
///
/// # Example
///
/// ```rust,no_run
/// use codealarm::logging::{init_logging, LogTarget};
///
/// init_logging(0, false, LogTarget::Stderr);
///
/// log::info!("Application started");
/// log::debug!("Debug info here");
/// ```
pub fn init_logging(verbose: u8, quiet: bool, target: LogTarget) {
    // Check if RUST_LOG is set - if so, use env_logger's default behavior
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();

    if use_env {
        // Use RUST_LOG environment variable
        builder.parse_default_env();
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        // Determine level from CLI flags
        let level = determine_level(verbose, quiet);
        builder.filter_level(level);
    }

    configure_format(&mut builder, verbose, matches!(target, LogTarget::File(_)));

    if let LogTarget::File(path) = &target {
        match open_log_file(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
                builder.write_style(env_logger::WriteStyle::Never);
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", path.display(), e),
        }
    }

    // Initialize the logger
    if builder.try_init().is_err() {
        return;
    }

    // Log initialization message (only if not using RUST_LOG, as we already logged above)
    if !use_env {
        let level = determine_level(verbose, quiet);
        log::debug!("Logging initialized at level: {:?}", level);
    }
}

fn open_log_file(path: &std::path::Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Determine the log level from CLI flags.
///
/// # Arguments
///
/// * `verbose` - Verbosity count (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, use error level
///
/// # Returns
///
/// The appropriate `LevelFilter` based on the flags.
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

/// Configure the log format.
///
/// Timestamps are always written to log files and, in debug builds, to
/// stderr as well. From `-v` up, records carry their module path.
fn configure_format(builder: &mut Builder, verbose: u8, to_file: bool) {
    let timestamps = to_file || cfg!(debug_assertions);
    let module_paths = verbose >= 1;

    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);

        if timestamps {
            write!(buf, "{} ", buf.timestamp_seconds())?;
        }
        write!(buf, "{level_style}{:<5}{level_style:#} ", level)?;
        if module_paths {
            write!(buf, "[{}] ", record.module_path().unwrap_or("unknown"))?;
        }
        writeln!(buf, "{}", record.args())
    });
}
