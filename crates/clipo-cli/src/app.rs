//! Application initialization and lifecycle management
//!
//! Provides the initialization sequence, the composition root that wires
//! the history service to its adapters, and fatal error handling.

use anyhow::{Context, Result};
use clipo_adapters::{FsBlobStore, SqliteHistoryStore};
use clipo_core::{
    get_default_config_path, init_logger, load_config_from_path, Config, DirectoryManager,
    HistoryService, LogLevel, LoggerConfig, LoggerGuard,
};
use std::panic;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// History service wired to the production adapters
pub type History = HistoryService<SqliteHistoryStore, FsBlobStore>;

/// Application context holding initialized components
pub struct AppContext {
    pub config: Arc<Config>,
    pub directories: DirectoryManager,
    _logger_guard: Option<LoggerGuard>,
}

impl AppContext {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens the persisted history
    pub async fn open_history(&self) -> Result<Arc<History>> {
        open_history(&self.directories).await
    }
}

/// Application initialization options
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Whether to initialize the logger
    pub init_logger: bool,
    /// Whether to mirror log output to stderr
    pub log_to_stderr: bool,
    /// Log level override; the configured level otherwise
    pub log_level: Option<LogLevel>,
}

impl InitOptions {
    /// Long-running watcher: file logging mirrored to stderr
    pub fn watcher() -> Self {
        Self {
            init_logger: true,
            log_to_stderr: true,
            log_level: None,
        }
    }

    /// One-shot command: no logger
    pub fn command() -> Self {
        Self::default()
    }
}

/// Initializes the application
///
/// 1. Load configuration (`~/.clipo/config.toml` unless overridden)
/// 2. Create the data directory layout
/// 3. Initialize logging (if requested)
/// 4. Install the panic hook
pub fn initialize(options: InitOptions, config_path: Option<&Path>) -> Result<AppContext> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_default_config_path);
    let config = load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    let config = Arc::new(config);

    let directories = DirectoryManager::new(config.storage.data_dir.clone());
    directories
        .initialize()
        .context("Failed to create directory structure")?;

    let logger_guard = if options.init_logger {
        let level = options
            .log_level
            .unwrap_or_else(|| config.logging.log_level());
        let logger_config = LoggerConfig::new(directories.logs_dir())
            .with_level(level)
            .with_stderr(options.log_to_stderr);

        Some(init_logger(logger_config).context("Failed to initialize logger")?)
    } else {
        None
    };

    setup_panic_hook(directories.clone());

    Ok(AppContext {
        config,
        directories,
        _logger_guard: logger_guard,
    })
}

/// Opens the SQLite history and image store under the data directory
pub async fn open_history(directories: &DirectoryManager) -> Result<Arc<History>> {
    let persistence = SqliteHistoryStore::open(&directories.database_path())
        .await
        .context("Failed to open history database")?;
    let blobs = FsBlobStore::new(directories.images_dir());

    let history = HistoryService::load(Arc::new(persistence), Arc::new(blobs)).await;
    Ok(Arc::new(history))
}

/// Logs the panic, removes the PID file and prints where to find the log
fn setup_panic_hook(directories: DirectoryManager) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        error!("FATAL ERROR at {}: {}", location, message);
        remove_pid_file(&directories);

        eprintln!();
        eprintln!("Clipo encountered a fatal error and must exit.");
        eprintln!("Location: {}", location);
        eprintln!("Error: {}", message);
        eprintln!("Logs: {}", directories.logs_dir().display());
        eprintln!();

        default_hook(panic_info);
    }));
}

fn remove_pid_file(directories: &DirectoryManager) {
    let pid_file = directories.pid_file_path();
    if pid_file.exists() {
        match std::fs::remove_file(&pid_file) {
            Ok(()) => info!("Cleaned up PID file"),
            Err(e) => error!("Failed to clean up PID file: {}", e),
        }
    }
}

/// Cleans up after the watcher; returns the process exit code
pub fn graceful_shutdown(reason: &str, directories: &DirectoryManager) -> i32 {
    info!("Initiating graceful shutdown: {}", reason);
    remove_pid_file(directories);
    info!("Shutdown complete");

    if reason.contains("error") || reason.contains("fatal") {
        1
    } else {
        0
    }
}
