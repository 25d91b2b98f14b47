//! Common error types for Clipo
//!
//! Domain-specific errors live next to the port or component that raises
//! them and are re-exported here. [`ClipoError`] wraps them all so callers
//! can propagate with `?`.

use thiserror::Error;

pub use crate::daemon::DaemonError;
pub use crate::history::CopyError;
pub use crate::logging::LoggerError;
pub use crate::poller::PollerError;
pub use crate::ports::blob::BlobError;
pub use crate::ports::clipboard::ClipboardError;
pub use crate::ports::persistence::PersistenceError;

/// Top-level error type for Clipo operations
#[derive(Debug, Error)]
pub enum ClipoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    #[error("Poller error: {0}")]
    Poller(#[from] PollerError),

    #[error("Daemon error: {0}")]
    Daemon(#[from] DaemonError),

    #[error("Logger error: {0}")]
    Logger(#[from] LoggerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
