//! SQLite-backed history persistence
//!
//! History is kept in a single key-value table. Each slot holds one JSON
//! document that is replaced wholesale on save:
//!
//! - `clipboardItems`: array of item records, newest first
//! - `userCategories`: array of category names

use async_trait::async_trait;
use clipo_core::item::ClipboardItem;
use clipo_core::ports::persistence::{
    HistoryPersistencePort, PersistenceError, CATEGORIES_SLOT, ITEMS_SLOT,
};
use rusqlite::OptionalExtension;
use serde_json::Value;
use std::path::Path;
use tokio_rusqlite::Connection;

const CREATE_SLOTS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

const UPSERT_SLOT_SQL: &str = r#"
INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;

/// SQLite adapter implementing [`HistoryPersistencePort`]
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    /// Opens (or creates) the database and initializes the schema
    ///
    /// # Errors
    /// Returns `PersistenceError::ConnectionError` if the database cannot be opened
    pub async fn open(db_path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(db_path.to_path_buf())
            .await
            .map_err(|e| PersistenceError::ConnectionError(e.to_string()))?;

        Self::initialize_schema(&conn, true).await?;

        tracing::debug!("SQLite history store opened at {:?}", db_path);
        Ok(Self { conn })
    }

    /// Creates an in-memory store
    pub async fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| PersistenceError::ConnectionError(e.to_string()))?;

        Self::initialize_schema(&conn, false).await?;
        Ok(Self { conn })
    }

    async fn initialize_schema(conn: &Connection, wal: bool) -> Result<(), PersistenceError> {
        conn.call(move |conn| {
            if wal {
                conn.execute_batch("PRAGMA journal_mode=WAL;")?;
            }
            conn.execute(CREATE_SLOTS_TABLE_SQL, [])?;
            Ok(())
        })
        .await
        .map_err(|e| PersistenceError::DatabaseError(e.to_string()))
    }

    async fn read_slot(&self, key: &'static str) -> Result<Option<String>, PersistenceError> {
        self.conn
            .call(move |conn| {
                let value = conn
                    .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                        row.get::<_, String>(0)
                    })
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))
    }

    async fn write_slot(&self, key: &'static str, value: String) -> Result<(), PersistenceError> {
        let now = chrono::Utc::now().timestamp();
        self.conn
            .call(move |conn| {
                conn.execute(UPSERT_SLOT_SQL, rusqlite::params![key, value, now])?;
                Ok(())
            })
            .await
            .map_err(|e| PersistenceError::DatabaseError(e.to_string()))
    }
}

/// Decodes the item array, skipping records that fail to decode
///
/// A document that is not an array at all is an error.
fn decode_items(document: &str) -> Result<Vec<ClipboardItem>, PersistenceError> {
    let records: Vec<Value> = serde_json::from_str(document)?;
    let total = records.len();

    let items: Vec<ClipboardItem> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping undecodable history record: {}", e);
                None
            }
        })
        .collect();

    if items.len() < total {
        tracing::warn!("Loaded {} of {} history records", items.len(), total);
    }
    Ok(items)
}

#[async_trait]
impl HistoryPersistencePort for SqliteHistoryStore {
    async fn load_items(&self) -> Result<Vec<ClipboardItem>, PersistenceError> {
        match self.read_slot(ITEMS_SLOT).await? {
            Some(document) => decode_items(&document),
            None => Ok(Vec::new()),
        }
    }

    async fn save_items(&self, items: &[ClipboardItem]) -> Result<(), PersistenceError> {
        let document = serde_json::to_string(items)?;
        self.write_slot(ITEMS_SLOT, document).await?;
        tracing::trace!("Saved {} history items", items.len());
        Ok(())
    }

    async fn load_categories(&self) -> Result<Vec<String>, PersistenceError> {
        match self.read_slot(CATEGORIES_SLOT).await? {
            Some(document) => Ok(serde_json::from_str(&document)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_categories(&self, categories: &[String]) -> Result<(), PersistenceError> {
        let document = serde_json::to_string(categories)?;
        self.write_slot(CATEGORIES_SLOT, document).await
    }
}
