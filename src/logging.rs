use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default log directory (~/.local/share/pswp/logs on Linux)
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pswp")
        .join("logs")
}

/// Installs a file logger rolling daily under `log_dir`.
///
/// The terminal belongs to the UI, so nothing is written to stderr. `RUST_LOG`
/// overrides the default `info` filter. Keep the guard alive until exit or buffered
/// lines are lost. Fails if `log_dir` cannot be created or opened.
pub fn init_logging(log_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Files are named like pswp.log.2026-10-15
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("pswp.log")
        .build(log_dir)
        .map_err(io::Error::other)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    // A subscriber may already be installed (tests, embedding); keep it
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    Ok(guard)
}
