//! Clipo Adapters - Infrastructure implementations
//!
//! Concrete implementations of the ports defined in clipo-core: SQLite
//! history persistence, filesystem image blobs and the system clipboard,
//! plus the new-item notifier.

pub mod blob;
pub mod clipboard;
pub mod notifier;
pub mod persistence;

pub use blob::FsBlobStore;
pub use clipboard::SystemClipboard;
pub use notifier::ItemNotifier;
pub use persistence::SqliteHistoryStore;
