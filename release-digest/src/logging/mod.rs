//! Logging setup with a reloadable filter.
//!
//! Console output is always on. When a log directory is given, a daily
//! rotating file is written too and files older than the retention period
//! are removed by a background task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
};

use crate::config::ConfigService;
use crate::utils::fs;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "release_digest=info,reqwest=warn";

/// Prefix of rotated log files.
const LOG_FILE_NAME: &str = "release-digest.log";

/// Log retention period in days.
const LOG_RETENTION_DAYS: i64 = 7;

/// Formats timestamps in the host's local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Type alias for the reload handle.
pub type FilterHandle = Handle<EnvFilter, tracing_subscriber::Registry>;

/// Options for [`init_logging`].
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Filter directive; `RUST_LOG` then [`DEFAULT_LOG_FILTER`] when unset.
    pub filter: Option<String>,
    /// Directory for rotating log files. Console only when unset.
    pub log_dir: Option<PathBuf>,
}

/// Handle to the installed subscriber.
pub struct LoggingHandle {
    handle: FilterHandle,
    log_dir: Option<PathBuf>,
}

impl LoggingHandle {
    /// Get the current filter directive string.
    pub fn get_filter(&self) -> String {
        self.handle
            .with_current(|filter| filter.to_string())
            .unwrap_or_default()
    }

    /// Set a new filter directive, e.g. `"release_digest=debug"`.
    pub fn set_filter(&self, directive: &str) -> crate::Result<()> {
        let new_filter = EnvFilter::try_new(directive)
            .map_err(|e| crate::Error::Other(format!("Invalid filter directive: {}", e)))?;

        self.handle
            .reload(new_filter)
            .map_err(|e| crate::Error::Other(format!("Failed to reload filter: {}", e)))?;

        info!(directive = %directive, "Log filter updated");
        Ok(())
    }

    /// Apply the filter stored in the logging config.
    ///
    /// A blank stored filter keeps the current one.
    pub async fn apply_persisted_filter(&self, config_service: &ConfigService) -> crate::Result<()> {
        let config = config_service.get_logging_config().await?;
        let directive = config.filter.trim();
        if directive.is_empty() {
            return Ok(());
        }
        self.set_filter(directive)
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Start the daily log retention cleanup task. No-op without a log directory.
    pub fn start_retention_cleanup(self: &Arc<Self>, cancel_token: CancellationToken) {
        let Some(log_dir) = self.log_dir.clone() else {
            return;
        };

        tokio::spawn(async move {
            let cleanup_interval = Duration::from_secs(24 * 60 * 60);

            loop {
                if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS).await {
                    warn!(error = %e, "Failed to cleanup old logs");
                }

                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        debug!("Log retention cleanup task shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(cleanup_interval) => {}
                }
            }
        });
    }
}

/// Date of a rotated log file, from its `release-digest.log.YYYY-MM-DD` name.
fn rotated_file_date(file_name: &str) -> Option<NaiveDate> {
    let date_str = file_name.strip_prefix(LOG_FILE_NAME)?.strip_prefix('.')?;
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
}

/// Delete rotated log files older than `retention_days`.
async fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> std::io::Result<()> {
    let cutoff = (Utc::now() - chrono::Duration::days(retention_days)).date_naive();

    let mut entries = tokio::fs::read_dir(log_dir).await?;
    let mut deleted_count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(file_date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(rotated_file_date)
        else {
            continue;
        };

        if file_date < cutoff {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to delete old log file");
            } else {
                deleted_count += 1;
                debug!(path = %path.display(), "Deleted old log file");
            }
        }
    }

    if deleted_count > 0 {
        info!(count = deleted_count, "Cleaned up old log files");
    }

    Ok(())
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the process, otherwise
/// buffered file output is lost.
pub fn init_logging(
    options: LoggingOptions,
) -> crate::Result<(Arc<LoggingHandle>, Option<WorkerGuard>)> {
    let initial_filter = match options.filter.as_deref() {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| crate::Error::config(format!("Invalid log filter: {}", e)))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let (filter_layer, filter_handle) = reload::Layer::new(initial_filter);

    let (file_layer, guard) = match options.log_dir.as_deref() {
        Some(log_dir) => {
            fs::ensure_dir_all_sync_with_op("creating log directory", log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    let handle = Arc::new(LoggingHandle {
        handle: filter_handle,
        log_dir: options.log_dir,
    });

    Ok((handle, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, MemoryConfigStore};
    use tracing_subscriber::Registry;

    /// A handle whose layer is not installed globally. Keep the layer alive.
    fn detached(directive: &str) -> (reload::Layer<EnvFilter, Registry>, LoggingHandle) {
        let (layer, handle) = reload::Layer::new(EnvFilter::new(directive));
        (
            layer,
            LoggingHandle {
                handle,
                log_dir: None,
            },
        )
    }

    #[test]
    fn test_set_filter() {
        let (_layer, logging) = detached("release_digest=info");
        assert_eq!(logging.get_filter(), "release_digest=info");

        logging.set_filter("release_digest=debug").unwrap();
        assert_eq!(logging.get_filter(), "release_digest=debug");

        assert!(logging.set_filter("release_digest=loud").is_err());
        assert_eq!(logging.get_filter(), "release_digest=debug");
    }

    #[tokio::test]
    async fn test_apply_persisted_filter() {
        let (_layer, logging) = detached("release_digest=info");
        let config_service = ConfigService::new(Arc::new(MemoryConfigStore::new()));

        logging.apply_persisted_filter(&config_service).await.unwrap();
        assert_eq!(logging.get_filter(), "release_digest=info");

        config_service
            .update_logging_config(&LoggingConfig {
                filter: "release_digest=trace".to_string(),
            })
            .await
            .unwrap();
        logging.apply_persisted_filter(&config_service).await.unwrap();
        assert_eq!(logging.get_filter(), "release_digest=trace");
    }

    #[test]
    fn test_default_filter() {
        assert!(DEFAULT_LOG_FILTER.contains("release_digest=info"));
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_rotated_file_date() {
        assert_eq!(
            rotated_file_date("release-digest.log.2024-05-01"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(rotated_file_date("release-digest.log"), None);
        assert_eq!(rotated_file_date("other.log.2024-05-01"), None);
        assert_eq!(rotated_file_date("release-digest.log.garbage"), None);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("release-digest.log.2000-01-01");
        let today = dir
            .path()
            .join(format!("release-digest.log.{}", Utc::now().format("%Y-%m-%d")));
        let unrelated = dir.path().join("notes.txt");
        for path in [&old, &today, &unrelated] {
            tokio::fs::write(path, "x").await.unwrap();
        }

        cleanup_old_logs(dir.path(), LOG_RETENTION_DAYS).await.unwrap();

        assert!(!old.exists());
        assert!(today.exists());
        assert!(unrelated.exists());
    }
}
