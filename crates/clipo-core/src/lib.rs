//! Clipo Core - Domain logic for the Clipo clipboard history engine
//!
//! Contains the item model, classifier, in-memory store, history service,
//! poller, retention sweep and the port traits implemented by
//! `clipo-adapters`, following the Hexagonal Architecture pattern.

pub mod classifier;
pub mod config;
pub mod daemon;
pub mod directory;
pub mod error;
pub mod history;
pub mod item;
pub mod logging;
pub mod poller;
pub mod ports;
pub mod retention;
pub mod store;

pub use classifier::{classify, classify_with, preview_for, RawPayload, PREVIEW_CHAR_LIMIT};
pub use config::{
    get_default_config_path, get_default_data_dir, load_config, load_config_from_path, Config,
    LoggingConfig, MonitorConfig, NotificationConfig, StorageConfig,
};
pub use daemon::{DaemonController, DaemonError, PidManager, WatcherRegistration};
pub use directory::DirectoryManager;
pub use error::{ClipoError, ConfigError};
pub use history::{CopyError, HistoryEvent, HistoryService, MANUAL_SOURCE};
pub use item::{ClipboardItem, ItemContent, ItemId, ItemKind, DEFAULT_CATEGORY};
pub use logging::{init_logger, LogLevel, LoggerConfig, LoggerError, LoggerGuard};
pub use poller::{
    ClipboardPoller, MonitorSwitch, PollerError, PollerState, TickOutcome, DEFAULT_POLL_INTERVAL,
};
pub use ports::{
    BlobError, BlobStorePort, ClipboardError, ClipboardPort, HistoryPersistencePort, ImageFormat,
    ImagePayload, PersistenceError, CATEGORIES_SLOT, ITEMS_SLOT,
};
pub use retention::{cutoff_for, SweepSummary, DEFAULT_RETENTION_DAYS};
pub use store::{
    CategoryRemoval, ClipboardStore, IdLookup, Selection, ALL_CATEGORY, FAVORITES_CATEGORY,
};
