//! Age-based retention for the clipboard history
//!
//! A sweep evicts every non-favorite item created before the cutoff
//! (`now - max_age_days`). Favorites are never evicted by age. Sweeps run on
//! demand; nothing here owns a timer.

use crate::item::ClipboardItem;
use crate::store::ClipboardStore;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Summary of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Number of items evicted
    pub removed_count: usize,
    /// Number of favorites older than the cutoff that were kept
    pub favorites_kept: usize,
    /// Number of image blobs deleted from disk
    pub blobs_removed: usize,
}

/// Returns the instant before which items are considered expired
pub fn cutoff_for(max_age_days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(i64::from(max_age_days))
}

/// Removes expired non-favorite items from `store`
///
/// Returns the evicted items and how many expired favorites were kept.
pub fn sweep_store(
    store: &mut ClipboardStore,
    max_age_days: u32,
    now: DateTime<Utc>,
) -> (Vec<ClipboardItem>, usize) {
    let cutoff = cutoff_for(max_age_days, now);
    debug!("Running retention sweep with cutoff {}", cutoff);

    let favorites_kept = store
        .items()
        .iter()
        .filter(|item| item.is_favorite() && item.created_at() < cutoff)
        .count();

    let removed = store.remove_where(|item| !item.is_favorite() && item.created_at() < cutoff);
    (removed, favorites_kept)
}
