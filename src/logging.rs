//! `tracing` subscriber setup.
//!
//! Diagnostics always go to stderr so they never mix with command output on
//! stdout. With `[logging] file = true` a JSON copy of every event is also
//! written to `logs/leadscout.log.YYYY-MM-DD`. `RUST_LOG` overrides the
//! configured level in both modes.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "leadscout.log";

/// Keeps the background log writer alive. Dropping it flushes the file.
pub struct LoggingGuard {
    _writer: WorkerGuard,
}

impl std::fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LoggingGuard")
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Log to stderr and to a daily-rolling JSON file under `logs_dir`.
///
/// # Errors
///
/// Fails when `logs_dir` cannot be created or a subscriber is already
/// installed in this process.
pub fn init_with_file(logs_dir: &Path, level: &str) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("cannot create log directory {}", logs_dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX));

    tracing_subscriber::registry()
        .with(level_filter(level))
        .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("a log subscriber is already installed")?;

    Ok(LoggingGuard { _writer: guard })
}

/// Log to stderr only. Later calls leave the first subscriber in place.
pub fn init_cli(level: &str) {
    let installed = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(level_filter(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::trace!("log subscriber already installed");
    }
}
