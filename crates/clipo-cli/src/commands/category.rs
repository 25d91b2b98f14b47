//! Category command
//!
//! Handles `clipo category` subcommands for managing user categories.

use super::ensure_no_watcher;
use crate::app::AppContext;
use anyhow::{bail, Result};
use clap::Subcommand;
use clipo_core::{ALL_CATEGORY, DEFAULT_CATEGORY, FAVORITES_CATEGORY};

/// Category subcommand actions
#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    /// List every category, built-in and user-defined
    List,
    /// Add a user category
    Add {
        /// Category name
        name: String,
    },
    /// Remove a user category; its items move to General
    Remove {
        /// Category name
        name: String,
    },
}

/// Run category subcommand
pub async fn run(ctx: &AppContext, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::List => list(ctx).await,
        CategoryAction::Add { name } => add(ctx, &name).await,
        CategoryAction::Remove { name } => remove(ctx, &name).await,
    }
}

async fn list(ctx: &AppContext) -> Result<()> {
    let history = ctx.open_history().await?;
    let items = history.items().await;

    println!("Categories");
    println!("----------");
    for category in history.categories().await {
        let count = match category.as_str() {
            ALL_CATEGORY => items.len(),
            FAVORITES_CATEGORY => items.iter().filter(|item| item.is_favorite()).count(),
            name => items.iter().filter(|item| item.category() == name).count(),
        };
        let marker = match category.as_str() {
            ALL_CATEGORY | FAVORITES_CATEGORY | DEFAULT_CATEGORY => " (built-in)",
            _ => "",
        };
        println!("  {:<16} {:>5}{}", category, count, marker);
    }
    Ok(())
}

async fn add(ctx: &AppContext, name: &str) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Category name cannot be empty");
    }
    let history = ctx.open_history().await?;

    if history.add_category(name).await {
        println!("Added category {}", name);
    } else {
        println!("Category {} already exists", name);
    }
    Ok(())
}

async fn remove(ctx: &AppContext, name: &str) -> Result<()> {
    ensure_no_watcher(ctx)?;
    let history = ctx.open_history().await?;

    let removal = history.remove_category(name).await;
    if !removal.unlisted && removal.reassigned == 0 {
        println!("Category {} not found", name);
        return Ok(());
    }
    println!("Removed category {}", name);
    if removal.reassigned > 0 {
        println!(
            "  Moved {} items to {}",
            removal.reassigned, DEFAULT_CATEGORY
        );
    }
    Ok(())
}
