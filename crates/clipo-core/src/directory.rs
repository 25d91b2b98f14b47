//! Data directory layout
//!
//! ```text
//! <data_dir>/
//!   config.toml
//!   clipo.db
//!   daemon.pid
//!   images/     image blobs
//!   logs/       rotated log files
//! ```

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::config::get_default_data_dir;
use crate::error::ConfigError;

const IMAGES_DIR: &str = "images";
const LOGS_DIR: &str = "logs";

/// Owner-only access; clipboard history can hold secrets
#[cfg(unix)]
const DIR_PERMISSION_MODE: u32 = 0o700;

/// Resolves and creates the paths under the data directory
#[derive(Debug, Clone)]
pub struct DirectoryManager {
    data_dir: PathBuf,
}

impl DirectoryManager {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Uses `~/.clipo`
    pub fn with_default_dir() -> Self {
        Self::new(get_default_data_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join(IMAGES_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join(LOGS_DIR)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("clipo.db")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn pid_file_path(&self) -> PathBuf {
        self.data_dir.join("daemon.pid")
    }

    /// Creates the data directory and its subdirectories
    ///
    /// Idempotent. On Unix every directory ends up with mode 700, including
    /// ones that already existed.
    ///
    /// # Errors
    /// Returns `ConfigError::Io` if a directory cannot be created
    pub fn initialize(&self) -> Result<(), ConfigError> {
        for dir in [self.data_dir.clone(), self.images_dir(), self.logs_dir()] {
            ensure_private_dir(&dir)?;
        }

        tracing::debug!("Initialized Clipo data directory at {:?}", self.data_dir);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir.is_dir() && self.images_dir().is_dir() && self.logs_dir().is_dir()
    }
}

fn ensure_private_dir(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        tracing::debug!("Created directory: {:?}", path);
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(DIR_PERMISSION_MODE))?;

    Ok(())
}
