//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events. Binaries call [`init_logging`]
//! once at startup; it installs a formatting subscriber on stderr and,
//! optionally, a non-blocking file sink.
//!
//! The filter defaults to [`DEFAULT_DIRECTIVE`] and is overridden by
//! `RUST_LOG` when that is set.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "ugcmount=info";

/// Errors from [`init_logging`].
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Log file path has no file name: {0}")]
    InvalidLogFile(PathBuf),

    #[error("Failed to create log directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub directive: String,
    /// Also write to this file, without ANSI colours.
    pub log_file: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directive: DEFAULT_DIRECTIVE.to_string(),
            log_file: None,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Config using `ugcmount=<level>` as its directive.
    pub fn with_level(level: &str) -> Self {
        Self {
            directive: format!("ugcmount={level}"),
            ..Self::default()
        }
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// `RUST_LOG` if set, otherwise the configured directive.
    pub fn filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.directive).map_err(|e| LoggingError::InvalidFilter {
            directive: self.directive.clone(),
            reason: e.to_string(),
        })
    }
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when a log file is configured. Keep it
/// alive until exit; dropping it flushes and stops the writer.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = config.filter()?;
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(config.ansi)
        .with_target(false);

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidLogFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDirFailed {
        path: dir.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.directive, "ugcmount=info");
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_with_level_builds_directive() {
        let config = LoggingConfig::with_level("trace").with_ansi(false);
        assert_eq!(config.directive, "ugcmount=trace");
        assert!(!config.ansi);
    }

    #[test]
    fn test_invalid_directive_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            directive: "ugcmount=notalevel".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(config.filter(), Err(LoggingError::InvalidFilter { .. })));
    }

    #[test]
    fn test_file_writer_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs").join("ugcmount.log");

        let (_writer, guard) = file_writer(&path).unwrap();
        drop(guard);

        assert!(temp.path().join("logs").is_dir());
    }

    #[test]
    fn test_file_writer_rejects_bare_root() {
        assert!(matches!(
            file_writer(Path::new("/")),
            Err(LoggingError::InvalidLogFile(_))
        ));
    }
}
