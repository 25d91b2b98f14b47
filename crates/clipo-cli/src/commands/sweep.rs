//! Sweep command
//!
//! Handles `clipo sweep` to evict expired items on demand.

use super::ensure_no_watcher;
use crate::app::AppContext;
use anyhow::{bail, Result};
use clipo_core::SweepSummary;

/// Evict non-favorite items older than `days` (configured retention by default)
pub async fn run(ctx: &AppContext, days: Option<u32>) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let days = days.unwrap_or(ctx.config().storage.retention_days);
    if days == 0 {
        bail!("Retention period must be at least one day");
    }

    let history = ctx.open_history().await?;
    let summary = history.sweep(days).await;
    println!("{}", describe(&summary, days));
    Ok(())
}

fn describe(summary: &SweepSummary, days: u32) -> String {
    if summary.removed_count == 0 {
        return format!("No items older than {} days", days);
    }
    let mut line = format!(
        "Removed {} items older than {} days",
        summary.removed_count, days
    );
    if summary.blobs_removed > 0 {
        line.push_str(&format!(" ({} images freed)", summary.blobs_removed));
    }
    if summary.favorites_kept > 0 {
        line.push_str(&format!(", kept {} favorites", summary.favorites_kept));
    }
    line
}
