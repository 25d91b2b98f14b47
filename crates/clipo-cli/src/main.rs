//! Clipo CLI - clipboard history engine
//!
//! Main entry point for the `clipo` binary.

mod app;
mod commands;

use anyhow::Result;
use app::{initialize, InitOptions};
use clap::{Parser, Subcommand};
use commands::category::CategoryAction;
use commands::history::ListOptions;
use std::path::PathBuf;

/// Clipboard history for the terminal
#[derive(Parser, Debug)]
#[command(name = "clipo", version, about)]
struct Cli {
    /// Path to the configuration file (default: ~/.clipo/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the clipboard watcher in the foreground
    Watch,
    /// Stop the running watcher
    Stop,
    /// Pause clipboard monitoring in the running watcher
    Pause,
    /// Resume clipboard monitoring in the running watcher
    Resume,
    /// Show watcher state and history statistics
    Status,
    /// List clipboard items, most recent first
    List {
        /// Only show items in this category
        #[arg(short = 'c', long)]
        category: Option<String>,

        /// Case-insensitive text to search for
        #[arg(short = 's', long)]
        search: Option<String>,

        /// Only show favorites
        #[arg(short = 'f', long, conflicts_with = "category")]
        favorites: bool,

        /// Number of items to show (default: 20)
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Add a text item by hand
    Add {
        /// Text to add
        text: String,

        /// Category for the new item (default: General)
        #[arg(short = 'c', long)]
        category: Option<String>,
    },
    /// Copy an item back to the system clipboard
    Copy {
        /// Item id or unique id prefix
        id: String,
    },
    /// Toggle an item's favorite flag
    Favorite {
        /// Item id or unique id prefix
        id: String,
    },
    /// Delete an item
    Delete {
        /// Item id or unique id prefix
        id: String,
    },
    /// Replace an item's content
    Edit {
        /// Item id or unique id prefix
        id: String,
        /// New content
        content: String,
    },
    /// Move an item to another category
    Move {
        /// Item id or unique id prefix
        id: String,
        /// Target category (blank moves it to General)
        category: String,
    },
    /// Manage user categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Remove every item, favorites included
    Clear,
    /// Remove non-favorite items older than the retention period
    Sweep {
        /// Maximum age in days (default: storage.retention_days)
        #[arg(short = 'd', long)]
        days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = match cli.command {
        Commands::Watch => InitOptions::watcher(),
        _ => InitOptions::command(),
    };
    let ctx = initialize(options, cli.config.as_deref())?;

    match cli.command {
        Commands::Watch => commands::watch::start(&ctx).await,
        Commands::Stop => commands::watch::stop(&ctx).await,
        Commands::Pause => commands::watch::set_monitoring(&ctx, false),
        Commands::Resume => commands::watch::set_monitoring(&ctx, true),
        Commands::Status => commands::status::run(&ctx).await,
        Commands::List {
            category,
            search,
            favorites,
            limit,
        } => {
            let options = ListOptions {
                category,
                search,
                favorites,
                limit,
            };
            commands::history::list(&ctx, options).await
        }
        Commands::Add { text, category } => {
            commands::history::add(&ctx, &text, category.as_deref()).await
        }
        Commands::Copy { id } => commands::history::copy(&ctx, &id).await,
        Commands::Favorite { id } => commands::history::favorite(&ctx, &id).await,
        Commands::Delete { id } => commands::history::delete(&ctx, &id).await,
        Commands::Edit { id, content } => commands::history::edit(&ctx, &id, &content).await,
        Commands::Move { id, category } => {
            commands::history::move_to(&ctx, &id, &category).await
        }
        Commands::Category { action } => commands::category::run(&ctx, action).await,
        Commands::Clear => commands::history::clear(&ctx).await,
        Commands::Sweep { days } => commands::sweep::run(&ctx, days).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_options() {
        let cli = Cli::parse_from(["clipo", "list", "-n", "5", "--search", "foo"]);
        match cli.command {
            Commands::List {
                limit,
                search,
                favorites,
                ..
            } => {
                assert_eq!(limit, 5);
                assert_eq!(search.as_deref(), Some("foo"));
                assert!(!favorites);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["clipo", "status", "--config", "/tmp/clipo.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/clipo.toml")));
    }

    #[test]
    fn test_category_subcommand() {
        let cli = Cli::parse_from(["clipo", "category", "add", "Work"]);
        assert!(matches!(
            cli.command,
            Commands::Category {
                action: CategoryAction::Add { ref name }
            } if name == "Work"
        ));
    }

    #[test]
    fn test_favorites_conflicts_with_category() {
        let result = Cli::try_parse_from(["clipo", "list", "--favorites", "--category", "Work"]);
        assert!(result.is_err());
    }
}
