//! Logging init: append-only file, or stderr when the file can't be opened.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,yt2mp3_core=debug,yt2mp3_server=debug,yt2mp3_cli=debug";

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install a line-per-event subscriber that appends to `log_path`.
///
/// Events inside a `request` span carry its `id` field, which is what ties a
/// log line to a request. Returns `Err` if the file (or its directory) can't
/// be created so the caller can fall back to [`init_stderr_logging`].
pub fn init_file_logging(log_path: &Path, default_filter: &str) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(log_file))
        .with_env_filter(env_filter(default_filter))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("logging to {}", log_path.display());
    Ok(())
}

/// Log to stderr only. Used when the log file is unavailable.
pub fn init_stderr_logging(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(default_filter))
        .with_ansi(false)
        .try_init();
}

/// File logging with stderr fallback; never fails.
pub fn init_logging(log_path: &Path, default_filter: &str) {
    if let Err(e) = init_file_logging(log_path, default_filter) {
        eprintln!(
            "could not open log file {}: {}; logging to stderr",
            log_path.display(),
            e
        );
        init_stderr_logging(default_filter);
    }
}
