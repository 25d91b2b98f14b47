//! Persistence port definition

use crate::item::ClipboardItem;
use async_trait::async_trait;
use thiserror::Error;

/// Key of the slot holding the serialized item array
pub const ITEMS_SLOT: &str = "clipboardItems";

/// Key of the slot holding the user-defined category list
pub const CATEGORIES_SLOT: &str = "userCategories";

/// Errors that can occur during persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Connection to database failed
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Port for the durable history slots
///
/// Each `save_*` call replaces the whole slot. `load_*` returns an empty
/// collection when nothing has been stored yet.
#[async_trait]
pub trait HistoryPersistencePort: Send + Sync {
    /// Loads the item collection, newest first
    async fn load_items(&self) -> Result<Vec<ClipboardItem>, PersistenceError>;

    /// Replaces the stored item collection
    async fn save_items(&self, items: &[ClipboardItem]) -> Result<(), PersistenceError>;

    /// Loads the user-defined category list
    async fn load_categories(&self) -> Result<Vec<String>, PersistenceError>;

    /// Replaces the stored user-defined category list
    async fn save_categories(&self, categories: &[String]) -> Result<(), PersistenceError>;
}
