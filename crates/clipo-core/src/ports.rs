//! Port definitions for Hexagonal Architecture
//!
//! These traits define the boundaries between the core domain and external adapters.

pub mod blob;
pub mod clipboard;
pub mod persistence;

pub use blob::{BlobError, BlobStorePort};
pub use clipboard::{ClipboardError, ClipboardPort, ImageFormat, ImagePayload};
pub use persistence::{HistoryPersistencePort, PersistenceError, CATEGORIES_SLOT, ITEMS_SLOT};
