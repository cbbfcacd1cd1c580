use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::LauncherConfig;

const LOG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Keeps the file writer alive; dropping it flushes pending lines.
pub struct LoggingRuntime {
    _guard: WorkerGuard,
    pub log_file: PathBuf,
}

/// Installs console and file logging for one launcher run.
///
/// `RUST_LOG` overrides the configured level. The console layer is compact and
/// untargeted; the file layer keeps targets and drops ANSI.
pub fn init_logging(config: &LauncherConfig) -> Result<LoggingRuntime> {
    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log dir: {}", config.log_dir.display()))?;

    let today = Local::now().date_naive();
    let expired = expired_log_files(&config.log_dir, config.log_retention_days, today)?;
    let removed = remove_log_files(&expired)?;

    let (file_writer, guard, log_file) = daily_file_writer(&config.log_dir, today);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    if removed > 0 {
        tracing::info!(
            removed,
            dir = %config.log_dir.display(),
            retention_days = config.log_retention_days,
            "removed expired launcher logs"
        );
    }

    Ok(LoggingRuntime {
        _guard: guard,
        log_file,
    })
}

/// Dated `YYYY-MM-DD.log` files older than the retention window, oldest first.
/// Today always counts as one retained day.
pub fn expired_log_files(
    log_dir: &Path,
    retention_days: u16,
    today: NaiveDate,
) -> Result<Vec<PathBuf>> {
    if !log_dir.is_dir() {
        return Ok(Vec::new());
    }
    let keep = u64::from(retention_days.max(1)) - 1;
    let cutoff = today.checked_sub_days(Days::new(keep)).unwrap_or(NaiveDate::MIN);

    let mut expired = Vec::new();
    for entry in fs::read_dir(log_dir)
        .with_context(|| format!("failed to read log dir: {}", log_dir.display()))?
    {
        let path = entry
            .with_context(|| format!("failed to list log dir: {}", log_dir.display()))?
            .path();
        match log_file_date(&path) {
            Some(date) if date < cutoff && path.is_file() => expired.push((date, path)),
            _ => {}
        }
    }
    expired.sort();
    Ok(expired.into_iter().map(|(_, path)| path).collect())
}

fn remove_log_files(paths: &[PathBuf]) -> Result<usize> {
    for path in paths {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove old log file: {}", path.display()))?;
    }
    Ok(paths.len())
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("{}.log", date.format(LOG_DATE_FORMAT))
}

fn log_file_date(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    NaiveDate::parse_from_str(name.strip_suffix(".log")?, LOG_DATE_FORMAT).ok()
}

fn daily_file_writer(log_dir: &Path, today: NaiveDate) -> (NonBlocking, WorkerGuard, PathBuf) {
    let name = log_file_name(today);
    let appender = tracing_appender::rolling::never(log_dir, &name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    (writer, guard, log_dir.join(name))
}
