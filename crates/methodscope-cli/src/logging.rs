//! Log-file setup for a run.
//!
//! Entries are appended to a single, never-rotated file with timestamp,
//! level and message. `RUST_LOG` overrides the default `info` filter.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVE: &str = "info";

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;
    let directory = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .map_err(|e| anyhow::anyhow!("cannot open log file {}: {}", path.display(), e))
}

/// Install the global subscriber writing to `path`.
///
/// Called once at process start, before any document is processed. The
/// returned guard flushes buffered entries when dropped, so the caller keeps
/// it alive for the whole run.
pub fn init_file_logging(path: &Path) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(build_filter())
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialized: {}", e))?;
    Ok(guard)
}
