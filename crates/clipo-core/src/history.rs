//! Clipboard history service
//!
//! [`HistoryService`] is the single owner of the [`ClipboardStore`]. The poller
//! and every user-facing command go through it, so all mutations are
//! serialized behind one async mutex. Each mutation that changes persisted
//! state is saved before the lock is released.
//!
//! Saving is optimistic: a failed save is logged and the in-memory state
//! stays authoritative for the running session.

use crate::item::{ClipboardItem, ItemContent, ItemId};
use crate::ports::blob::{BlobError, BlobStorePort};
use crate::ports::clipboard::{ClipboardError, ClipboardPort};
use crate::ports::persistence::HistoryPersistencePort;
use crate::retention::{sweep_store, SweepSummary};
use crate::store::{CategoryRemoval, ClipboardStore, IdLookup, Selection};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Source label of items added by hand rather than copied
pub const MANUAL_SOURCE: &str = "Clipo";

/// Capacity of the history event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events published by the history service
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    /// A new item is now at the head of the history
    Ingested(ClipboardItem),
}

/// Errors from copying an item back to the clipboard
#[derive(Debug, Error)]
pub enum CopyError {
    /// Clipboard write failed
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Image blob could not be read
    #[error("Blob error: {0}")]
    Blob(#[from] BlobError),
}

/// Serialized owner of the clipboard history
pub struct HistoryService<P, B>
where
    P: HistoryPersistencePort + 'static,
    B: BlobStorePort + 'static,
{
    store: Mutex<ClipboardStore>,
    persistence: Arc<P>,
    blobs: Arc<B>,
    events: broadcast::Sender<HistoryEvent>,
}

impl<P, B> HistoryService<P, B>
where
    P: HistoryPersistencePort + 'static,
    B: BlobStorePort + 'static,
{
    /// Creates a service over an existing store
    pub fn new(store: ClipboardStore, persistence: Arc<P>, blobs: Arc<B>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store: Mutex::new(store),
            persistence,
            blobs,
            events,
        }
    }

    /// Loads persisted state and creates the service
    ///
    /// Unreadable state is treated as empty; it never fails startup.
    pub async fn load(persistence: Arc<P>, blobs: Arc<B>) -> Self {
        let items = match persistence.load_items().await {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to load clipboard history, starting empty: {}", e);
                Vec::new()
            }
        };
        let categories = match persistence.load_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                warn!("Failed to load user categories, starting empty: {}", e);
                Vec::new()
            }
        };

        info!(
            items = items.len(),
            categories = categories.len(),
            "Clipboard history loaded"
        );
        Self::new(ClipboardStore::from_parts(items, categories), persistence, blobs)
    }

    /// Subscribes to history events
    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    /// Blob store used for image payloads
    pub fn blobs(&self) -> &Arc<B> {
        &self.blobs
    }

    async fn save_items(&self, store: &ClipboardStore) {
        if let Err(e) = self.persistence.save_items(store.items()).await {
            warn!("Failed to persist clipboard history: {}", e);
        }
    }

    async fn save_categories(&self, store: &ClipboardStore) {
        if let Err(e) = self.persistence.save_categories(store.user_categories()).await {
            warn!("Failed to persist user categories: {}", e);
        }
    }

    /// Deletes blobs of removed image items that nothing references anymore
    async fn release_blobs(&self, store: &ClipboardStore, removed: &[ClipboardItem]) -> usize {
        let mut released = 0;
        for path in removed.iter().filter_map(|item| item.content().image_path()) {
            if store.references_blob(path) {
                continue;
            }
            match self.blobs.remove(path).await {
                Ok(true) => {
                    debug!("Removed image blob {:?}", path);
                    released += 1;
                }
                Ok(false) => debug!("Image blob already gone: {:?}", path),
                Err(e) => warn!("Failed to remove image blob {:?}: {}", path, e),
            }
        }
        released
    }

    /// Inserts an item at the head unless it repeats the current head
    ///
    /// Returns `true` if the item was inserted.
    pub async fn ingest(&self, item: ClipboardItem) -> bool {
        let mut store = self.store.lock().await;
        if !store.ingest(item.clone()) {
            debug!(kind = %item.kind(), "Suppressed duplicate of head item");
            return false;
        }
        self.save_items(&store).await;
        drop(store);

        debug!(id = %item.id(), kind = %item.kind(), "Ingested clipboard item");
        // no subscribers is fine
        let _ = self.events.send(HistoryEvent::Ingested(item));
        true
    }

    /// Adds a text item by hand under the given category
    pub async fn add_text_item(&self, text: &str, category: &str) -> Option<ItemId> {
        let item = ClipboardItem::new(
            ItemContent::Text(text.to_string()),
            Some(MANUAL_SOURCE.to_string()),
        )
        .with_category(category);
        let id = item.id();
        self.ingest(item).await.then_some(id)
    }

    pub async fn toggle_favorite(&self, id: ItemId) -> Option<bool> {
        let mut store = self.store.lock().await;
        let state = store.toggle_favorite(id)?;
        self.save_items(&store).await;
        Some(state)
    }

    pub async fn delete(&self, id: ItemId) -> bool {
        let mut store = self.store.lock().await;
        let Some(removed) = store.delete(id) else {
            return false;
        };
        self.save_items(&store).await;
        self.release_blobs(&store, std::slice::from_ref(&removed)).await;
        true
    }

    pub async fn recategorize(&self, id: ItemId, category: &str) -> bool {
        let mut store = self.store.lock().await;
        if !store.recategorize(id, category) {
            return false;
        }
        self.save_items(&store).await;
        true
    }

    /// Replaces an item's content
    ///
    /// Editing an image item repoints it at another blob; the previous blob
    /// is released once nothing references it.
    pub async fn edit(&self, id: ItemId, content: &str) -> bool {
        let mut store = self.store.lock().await;
        let Some(previous) = store.get(id).cloned() else {
            return false;
        };
        if !store.edit(id, content) {
            return false;
        }
        self.save_items(&store).await;
        self.release_blobs(&store, std::slice::from_ref(&previous)).await;
        true
    }

    /// Empties the history; returns the number of items removed
    pub async fn clear_all(&self) -> usize {
        let mut store = self.store.lock().await;
        let removed = store.clear_all();
        self.save_items(&store).await;
        self.release_blobs(&store, &removed).await;
        info!("Cleared {} clipboard items", removed.len());
        removed.len()
    }

    pub async fn add_category(&self, name: &str) -> bool {
        let mut store = self.store.lock().await;
        if !store.add_category(name) {
            return false;
        }
        self.save_categories(&store).await;
        true
    }

    pub async fn remove_category(&self, name: &str) -> CategoryRemoval {
        let mut store = self.store.lock().await;
        let removal = store.remove_category(name);
        if removal.unlisted {
            self.save_categories(&store).await;
        }
        if removal.reassigned > 0 {
            self.save_items(&store).await;
        }
        removal
    }

    /// Evicts non-favorite items older than `max_age_days`
    pub async fn sweep(&self, max_age_days: u32) -> SweepSummary {
        self.sweep_at(max_age_days, Utc::now()).await
    }

    /// [`Self::sweep`] against an explicit clock
    pub async fn sweep_at(&self, max_age_days: u32, now: DateTime<Utc>) -> SweepSummary {
        let mut store = self.store.lock().await;
        let (removed, favorites_kept) = sweep_store(&mut store, max_age_days, now);
        if removed.is_empty() {
            debug!("Retention sweep found nothing to remove");
            return SweepSummary {
                favorites_kept,
                ..SweepSummary::default()
            };
        }

        self.save_items(&store).await;
        let blobs_removed = self.release_blobs(&store, &removed).await;
        info!(
            removed = removed.len(),
            favorites_kept, blobs_removed, "Retention sweep completed"
        );
        SweepSummary {
            removed_count: removed.len(),
            favorites_kept,
            blobs_removed,
        }
    }

    /// Writes an item back to the clipboard
    ///
    /// Returns `Ok(false)` if the item does not exist.
    pub async fn copy_item<C>(&self, id: ItemId, clipboard: &C) -> Result<bool, CopyError>
    where
        C: ClipboardPort + ?Sized,
    {
        let Some(item) = self.get(id).await else {
            return Ok(false);
        };

        match item.content() {
            ItemContent::ImageRef(path) => {
                let image = self.blobs.read_image(path).await?;
                clipboard.write_image(&image).await?;
            }
            other => clipboard.write_text(&other.as_str()).await?,
        }
        debug!(id = %id, "Copied item back to clipboard");
        Ok(true)
    }

    pub async fn get(&self, id: ItemId) -> Option<ClipboardItem> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn resolve_id(&self, prefix: &str) -> IdLookup {
        self.store.lock().await.resolve_id(prefix)
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    /// Snapshot of all items, newest first
    pub async fn items(&self) -> Vec<ClipboardItem> {
        self.store.lock().await.items().to_vec()
    }

    pub async fn view(&self, category: &str, search: &str) -> Vec<ClipboardItem> {
        let store = self.store.lock().await;
        store.view(category, search).into_iter().cloned().collect()
    }

    pub async fn favorite_items(&self) -> Vec<ClipboardItem> {
        let store = self.store.lock().await;
        store.favorite_items().into_iter().cloned().collect()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.store.lock().await.categories()
    }

    pub async fn user_categories(&self) -> Vec<String> {
        self.store.lock().await.user_categories().to_vec()
    }

    pub async fn selection(&self) -> Selection {
        self.store.lock().await.selection().clone()
    }

    pub async fn set_category_filter(&self, category: &str) {
        self.store.lock().await.set_category_filter(category);
    }

    pub async fn set_search_text(&self, search: &str) {
        self.store.lock().await.set_search_text(search);
    }

    pub async fn filtered_items(&self) -> Vec<ClipboardItem> {
        let store = self.store.lock().await;
        store.filtered_items().into_iter().cloned().collect()
    }
}
