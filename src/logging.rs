//! Tracing setup: stdout plus one log file per launch.
//!
//! Files are named `trendcast_<local time>.log` inside the app folder's
//! `logs/`. The timestamp format sorts lexicographically, so pruning keeps the
//! newest [`MAX_LOG_FILES`] by name without touching file metadata.

use std::path::{Path, PathBuf};

use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing::{info, warn};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app_dirs::{AppDirError, AppDirs};

/// Log files kept after startup, including the current one.
pub const MAX_LOG_FILES: usize = 10;
const LOG_PREFIX: &str = "trendcast_";
const LOG_EXTENSION: &str = ".log";
const DEFAULT_FILTER: &str = "info";

type Timestamp = &'static [BorrowedFormatItem<'static>];

const FILE_NAME_TIME: Timestamp =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_TIME: Timestamp = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    #[error("Failed to format log file name: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("Failed to install the tracing subscriber: {0}")]
    SetGlobal(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// The returned guard flushes the file writer when dropped; hold it for the
/// life of the process.
pub fn init(dirs: &AppDirs) -> Result<WorkerGuard, LoggingError> {
    dirs.ensure()?;
    let logs = dirs.logs_dir();
    let name = log_file_name(now_local())?;
    let (writer, worker) = tracing_appender::non_blocking(rolling::never(&logs, &name));

    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(offset, LINE_TIME);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(timer.clone()))
        .with(fmt::layer().with_ansi(false).with_timer(timer).with_writer(writer))
        .try_init()?;

    info!("Logging to {}", logs.join(&name).display());
    match prune_logs(&logs, MAX_LOG_FILES) {
        Ok(removed) if !removed.is_empty() => {
            info!("Removed {} old log file(s)", removed.len())
        }
        Ok(_) => {}
        Err(err) => warn!("Could not list {} for pruning: {err}", logs.display()),
    }
    Ok(worker)
}

fn log_file_name(at: OffsetDateTime) -> Result<String, time::error::Format> {
    Ok(format!("{LOG_PREFIX}{}{LOG_EXTENSION}", at.format(FILE_NAME_TIME)?))
}

fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Delete all but the `keep` newest trendcast logs in `dir`.
///
/// Files that fail to delete are skipped with a warning; other files in the
/// folder are never touched.
fn prune_logs(dir: &Path, keep: usize) -> std::io::Result<Vec<PathBuf>> {
    let mut logs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| {
                        name.starts_with(LOG_PREFIX) && name.ends_with(LOG_EXTENSION)
                    })
        })
        .collect();
    logs.sort_unstable_by(|a, b| b.cmp(a));

    let mut removed = Vec::new();
    for path in logs.into_iter().skip(keep) {
        match std::fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(err) => warn!("Could not remove old log {}: {err}", path.display()),
        }
    }
    Ok(removed)
}
