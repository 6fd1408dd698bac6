//! Logging and console output
//!
//! Diagnostics go through `tracing`; test results go to stdout as
//! colour-coded lines so a run can be followed at a glance.

use colored::Colorize;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name of the per-run trace log
pub const RUN_LOG_NAME: &str = "run.log";

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
/// When `log_dir` is given, a full trace of the run is also written to
/// `<log_dir>/run.log`; keep the returned guard alive until exit so the
/// file writer gets flushed.
pub fn init_cli(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cec_conformance=info,warn"));

    let mut guard = None;
    let file_layer = log_dir.and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: Could not create log directory: {}", e);
            return None;
        }
        let appender = tracing_appender::rolling::never(dir, RUN_LOG_NAME);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .with(file_layer)
        .init();

    guard
}

/// Print an informational result line
pub fn info(message: &str) {
    println!("{}", format!("INFO: {message}").cyan());
}

/// Print a warning result line
pub fn warning(message: &str) {
    println!("{}", format!("LOGGER: {message}").yellow());
}

/// Print an error result line
pub fn error(message: &str) {
    println!("{}", format!("ERROR: {message}").red());
}

/// Print a highlighted result line
pub fn highlight(message: &str) {
    println!("{}", format!("HIGHLIGHT: {message}").green());
}
