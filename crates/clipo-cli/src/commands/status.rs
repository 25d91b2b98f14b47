//! Status command
//!
//! Handles `clipo status` to show watcher state and history statistics.

use crate::app::{AppContext, History};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clipo_core::{DaemonController, ItemKind};
use std::path::Path;

/// Show watcher status and history statistics
///
/// Displays:
/// - Watcher running state (Running/Stopped)
/// - Item counts per kind, favorites and categories
/// - Image storage usage
/// - Effective configuration
pub async fn run(ctx: &AppContext) -> Result<()> {
    let config = ctx.config();
    let controller = DaemonController::new(ctx.directories.pid_file_path());

    let watcher_status = match controller.running_pid()? {
        Some(pid) => format!("Running (PID: {})", pid),
        None => "Stopped".to_string(),
    };

    println!("Clipo Status");
    println!("============");
    println!();
    println!("Watcher: {}", watcher_status);
    println!();

    let history = ctx.open_history().await?;
    show_statistics(&history, &ctx.directories.images_dir()).await;

    println!();
    println!("Configuration");
    println!("-------------");
    println!(
        "  Data directory: {}",
        config.storage.data_dir.to_string_lossy()
    );
    println!(
        "  Monitoring: {}",
        if config.monitor.enabled { "enabled" } else { "disabled" }
    );
    println!("  Poll interval: {} ms", config.monitor.interval_ms);
    println!("  Retention period: {} days", config.storage.retention_days);

    Ok(())
}

async fn show_statistics(history: &History, images_dir: &Path) {
    let items = history.items().await;
    let count_of = |kind: ItemKind| items.iter().filter(|item| item.kind() == kind).count();

    println!("History");
    println!("-------");
    println!("  Total items: {}", items.len());
    println!(
        "  Text: {}  URLs: {}  Files: {}  Images: {}",
        count_of(ItemKind::Text),
        count_of(ItemKind::Url),
        count_of(ItemKind::File),
        count_of(ItemKind::Image)
    );
    println!(
        "  Favorites: {}",
        items.iter().filter(|item| item.is_favorite()).count()
    );
    println!(
        "  User categories: {}",
        history.user_categories().await.len()
    );

    let storage_size = calculate_directory_size(images_dir).unwrap_or(0);
    println!("  Image storage: {}", format_storage_size(storage_size));

    if let Some(newest) = items.first() {
        println!("  Latest item: {}", format_timestamp(newest.created_at()));
    }
    if let Some(oldest) = items.last() {
        println!("  Oldest item: {}", format_timestamp(oldest.created_at()));
    }
}

/// Calculate total size of files in a directory
fn calculate_directory_size(dir: &Path) -> std::io::Result<u64> {
    let mut total = 0;

    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let metadata = entry?.metadata()?;
            if metadata.is_file() {
                total += metadata.len();
            }
        }
    }

    Ok(total)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Format storage size in human-readable format
fn format_storage_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{} bytes", b),
    }
}
