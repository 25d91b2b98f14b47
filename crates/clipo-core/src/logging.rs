//! Logging setup
//!
//! Daily-rotated file output via `tracing-appender`, optionally mirrored to
//! stderr when running in the foreground.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Log file name inside the log directory
pub const DEFAULT_LOG_FILE: &str = "clipo.log";

/// Errors that can occur during logger initialization
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to create log directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("Failed to initialize logger: {0}")]
    InitializationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimum level written to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Configuration for the Clipo logger
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Log level filter
    pub level: LogLevel,
    /// Whether to also log to stderr
    pub log_to_stderr: bool,
}

impl LoggerConfig {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            log_dir,
            level: LogLevel::Info,
            log_to_stderr: false,
        }
    }

    /// Logs under `<data_dir>/logs`
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("logs"))
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_stderr(mut self, enabled: bool) -> Self {
        self.log_to_stderr = enabled;
        self
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Base path of the log file; the appender adds a date suffix
    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(DEFAULT_LOG_FILE)
    }
}

/// Keeps the background log writer alive; flushes on drop
pub struct LoggerGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Installs the global tracing subscriber
///
/// The returned guard must be held for the lifetime of the program.
/// `RUST_LOG` overrides the configured level when set.
///
/// # Errors
/// Returns `LoggerError` if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logger(config: LoggerConfig) -> Result<LoggerGuard, LoggerError> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    if !config.log_dir.exists() {
        std::fs::create_dir_all(&config.log_dir).map_err(|e| {
            LoggerError::DirectoryCreationFailed(format!("{}: {}", config.log_dir.display(), e))
        })?;
    }

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, DEFAULT_LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clipo={}", config.level)));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let stderr_layer = config.log_to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggerError::InitializationFailed(e.to_string()))?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        level = %config.level,
        "Clipo logger initialized"
    );

    Ok(LoggerGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_round_trips_through_string() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_log_level_from_str_is_lenient() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" Debug ".parse::<LogLevel>().unwrap(), LogLevel::Debug);
    }

    #[test]
    fn test_log_level_from_str_invalid() {
        let result = "loud".parse::<LogLevel>();
        assert!(result.unwrap_err().contains("Unknown log level"));
    }

    #[test]
    fn test_log_level_to_filter() {
        assert_eq!(LogLevel::Error.to_level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Trace.to_level_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn test_logger_config_for_data_dir() {
        let config = LoggerConfig::for_data_dir(Path::new("/tmp/clipo"));
        assert_eq!(config.log_dir(), Path::new("/tmp/clipo/logs"));
        assert_eq!(
            config.log_file_path(),
            PathBuf::from("/tmp/clipo/logs/clipo.log")
        );
        assert_eq!(config.level, LogLevel::Info);
        assert!(!config.log_to_stderr);
    }

    #[test]
    fn test_logger_config_builder_pattern() {
        let config = LoggerConfig::new(PathBuf::from("/tmp/logs"))
            .with_level(LogLevel::Debug)
            .with_stderr(true);

        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.log_to_stderr);
    }

    #[test]
    fn test_logger_error_display() {
        let err = LoggerError::DirectoryCreationFailed("/tmp/test".to_string());
        assert!(err.to_string().contains("/tmp/test"));
    }
}
