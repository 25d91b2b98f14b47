//! CLI command implementations
//!
//! Each subcommand has its own module with the implementation logic.

pub mod category;
pub mod history;
pub mod status;
pub mod sweep;
pub mod watch;

use crate::app::{AppContext, History};
use anyhow::{bail, Result};
use clipo_core::{DaemonController, IdLookup, ItemId};

/// Refuses to continue while a watcher owns the history
///
/// The watcher keeps the history in memory and would overwrite any change
/// saved by another process.
pub(crate) fn ensure_no_watcher(ctx: &AppContext) -> Result<()> {
    let controller = DaemonController::new(ctx.directories.pid_file_path());
    if let Some(pid) = controller.running_pid()? {
        bail!(
            "Clipo watcher is running (PID: {}); stop it with 'clipo stop' before changing the history",
            pid
        );
    }
    Ok(())
}

/// Resolves a full item id or a unique prefix of one
pub(crate) async fn resolve_item(history: &History, id: &str) -> Result<ItemId> {
    match history.resolve_id(id).await {
        IdLookup::Found(id) => Ok(id),
        IdLookup::NotFound => bail!("No clipboard item matches '{}'", id),
        IdLookup::Ambiguous(count) => bail!(
            "'{}' matches {} items; use a longer id prefix",
            id,
            count
        ),
    }
}

/// Length of the id prefix shown in listings
pub(crate) const SHORT_ID_LEN: usize = 8;

pub(crate) fn short_id(id: ItemId) -> String {
    id.to_string()[..SHORT_ID_LEN].to_string()
}
