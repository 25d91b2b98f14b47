//! History commands
//!
//! Handles `clipo list`, `add`, `copy`, `favorite`, `delete`, `edit`, `move`
//! and `clear`.

use super::{ensure_no_watcher, resolve_item, short_id};
use crate::app::AppContext;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clipo_adapters::SystemClipboard;
use clipo_core::{ClipboardItem, ALL_CATEGORY, DEFAULT_CATEGORY, FAVORITES_CATEGORY};

/// Characters of the title shown per listed item
const TITLE_WIDTH: usize = 50;

/// Options for `clipo list`
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub category: Option<String>,
    pub search: Option<String>,
    pub favorites: bool,
    pub limit: usize,
}

/// List clipboard items, most recent first
pub async fn list(ctx: &AppContext, options: ListOptions) -> Result<()> {
    let history = ctx.open_history().await?;

    let category = if options.favorites {
        FAVORITES_CATEGORY.to_string()
    } else {
        options.category.unwrap_or_else(|| ALL_CATEGORY.to_string())
    };
    let search = options.search.unwrap_or_default();
    let items = history.view(&category, &search).await;

    if items.is_empty() {
        println!("No clipboard items found.");
        return Ok(());
    }

    let now = Utc::now();
    for item in items.iter().take(options.limit) {
        println!("{}", format_item_line(item, now));
    }
    if items.len() > options.limit {
        println!();
        println!(
            "Showing {} of {} items (use --limit to see more)",
            options.limit,
            items.len()
        );
    }
    Ok(())
}

/// Formats one listing row: id, favorite marker, kind, category, age, title
fn format_item_line(item: &ClipboardItem, now: DateTime<Utc>) -> String {
    let star = if item.is_favorite() { '*' } else { ' ' };
    format!(
        "{} {} [{:<5}] {:<12} {:>8}  {}",
        short_id(item.id()),
        star,
        item.kind().as_str(),
        item.category(),
        item.time_ago(now),
        truncate(&item.display_title(), TITLE_WIDTH)
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars - 1).collect();
    truncated.push('…');
    truncated
}

/// Add a text item by hand
pub async fn add(ctx: &AppContext, text: &str, category: Option<&str>) -> Result<()> {
    ensure_no_watcher(ctx)?;
    if text.is_empty() {
        bail!("Refusing to add an empty item");
    }
    let history = ctx.open_history().await?;

    match history
        .add_text_item(text, category.unwrap_or(DEFAULT_CATEGORY))
        .await
    {
        Some(id) => println!("Added item {}", short_id(id)),
        None => println!("Item already at the top of the history"),
    }
    Ok(())
}

/// Write an item back to the system clipboard
pub async fn copy(ctx: &AppContext, id: &str) -> Result<()> {
    let history = ctx.open_history().await?;
    let id = resolve_item(&history, id).await?;

    let clipboard = SystemClipboard::new();
    let copied = history
        .copy_item(id, &clipboard)
        .await
        .context("Failed to copy item to clipboard")?;
    if !copied {
        bail!("Clipboard item {} no longer exists", short_id(id));
    }
    println!("Copied item {} to the clipboard", short_id(id));
    Ok(())
}

/// Toggle an item's favorite flag
pub async fn favorite(ctx: &AppContext, id: &str) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let history = ctx.open_history().await?;
    let id = resolve_item(&history, id).await?;

    match history.toggle_favorite(id).await {
        Some(true) => println!("Marked {} as favorite", short_id(id)),
        Some(false) => println!("Removed {} from favorites", short_id(id)),
        None => bail!("Clipboard item {} no longer exists", short_id(id)),
    }
    Ok(())
}

/// Delete an item
pub async fn delete(ctx: &AppContext, id: &str) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let history = ctx.open_history().await?;
    let id = resolve_item(&history, id).await?;

    if !history.delete(id).await {
        bail!("Clipboard item {} no longer exists", short_id(id));
    }
    println!("Deleted item {}", short_id(id));
    Ok(())
}

/// Replace an item's content
pub async fn edit(ctx: &AppContext, id: &str, content: &str) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let history = ctx.open_history().await?;
    let id = resolve_item(&history, id).await?;

    if !history.edit(id, content).await {
        bail!("Clipboard item {} no longer exists", short_id(id));
    }
    println!("Updated item {}", short_id(id));
    Ok(())
}

/// Move an item to another category
pub async fn move_to(ctx: &AppContext, id: &str, category: &str) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let history = ctx.open_history().await?;
    let id = resolve_item(&history, id).await?;

    if !history.recategorize(id, category).await {
        bail!("Clipboard item {} no longer exists", short_id(id));
    }
    let moved_to = history
        .get(id)
        .await
        .map(|item| item.category().to_string())
        .unwrap_or_else(|| category.to_string());
    println!("Moved item {} to {}", short_id(id), moved_to);
    Ok(())
}

/// Remove every item, favorites included
pub async fn clear(ctx: &AppContext) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let history = ctx.open_history().await?;

    let removed = history.clear_all().await;
    println!("Removed {} clipboard items", removed);
    Ok(())
}
