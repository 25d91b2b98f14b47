//! Background watcher process tracking
//!
//! The `clipo watch` process records its PID in `<data_dir>/daemon.pid` so a
//! second watcher refuses to start and `clipo stop` can find it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::watch;

/// Errors that can occur during daemon operations
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Failed to read PID file: {0}")]
    PidFileReadError(String),

    #[error("Failed to write PID file: {0}")]
    PidFileWriteError(String),

    #[error("Failed to delete PID file: {0}")]
    PidFileDeleteError(String),

    #[error("Invalid PID value: {0}")]
    InvalidPid(String),

    #[error("Watcher is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Watcher is not running")]
    NotRunning,

    #[error("Failed to send signal to process: {0}")]
    SignalError(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// PID file access
#[derive(Debug, Clone)]
pub struct PidManager {
    pid_file_path: PathBuf,
}

impl PidManager {
    pub fn new(pid_file_path: PathBuf) -> Self {
        Self { pid_file_path }
    }

    pub fn pid_file_path(&self) -> &Path {
        &self.pid_file_path
    }

    pub fn write_pid(&self, pid: u32) -> Result<(), DaemonError> {
        fs::write(&self.pid_file_path, pid.to_string()).map_err(|e| {
            DaemonError::PidFileWriteError(format!("{:?}: {}", self.pid_file_path, e))
        })?;
        tracing::debug!("Wrote PID {} to {:?}", pid, self.pid_file_path);
        Ok(())
    }

    /// Reads the recorded PID; `Ok(None)` if there is no PID file
    pub fn read_pid(&self) -> Result<Option<u32>, DaemonError> {
        let content = match fs::read_to_string(&self.pid_file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DaemonError::PidFileReadError(format!(
                    "{:?}: {}",
                    self.pid_file_path, e
                )))
            }
        };

        content
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| DaemonError::InvalidPid(format!("'{}': {}", content.trim(), e)))
    }

    /// Deletes the PID file; `Ok(false)` if it did not exist
    pub fn delete_pid(&self) -> Result<bool, DaemonError> {
        match fs::remove_file(&self.pid_file_path) {
            Ok(()) => {
                tracing::debug!("Deleted PID file {:?}", self.pid_file_path);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DaemonError::PidFileDeleteError(format!(
                "{:?}: {}",
                self.pid_file_path, e
            ))),
        }
    }

    /// Checks the process with signal 0
    #[cfg(unix)]
    pub fn is_process_running(&self, pid: u32) -> bool {
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[cfg(not(unix))]
    pub fn is_process_running(&self, _pid: u32) -> bool {
        true
    }

    /// PID of the live watcher, removing a stale PID file on the way
    pub fn running_pid(&self) -> Result<Option<u32>, DaemonError> {
        let Some(pid) = self.read_pid()? else {
            return Ok(None);
        };
        if self.is_process_running(pid) {
            return Ok(Some(pid));
        }

        tracing::info!("Removing stale PID file (process {} not running)", pid);
        self.delete_pid()?;
        Ok(None)
    }

    #[cfg(unix)]
    pub fn send_signal(&self, pid: u32, signal: i32) -> Result<(), DaemonError> {
        if unsafe { libc::kill(pid as libc::pid_t, signal) } == 0 {
            Ok(())
        } else {
            Err(DaemonError::SignalError(format!(
                "signal {} to process {}: {}",
                signal,
                pid,
                io::Error::last_os_error()
            )))
        }
    }

    #[cfg(not(unix))]
    pub fn send_signal(&self, _pid: u32, _signal: i32) -> Result<(), DaemonError> {
        Err(DaemonError::SignalError(
            "Signal sending not supported on this platform".to_string(),
        ))
    }
}

/// Registration of the current process as the watcher
#[derive(Debug)]
pub struct WatcherRegistration {
    pub pid: u32,
    /// Flips to `true` when an in-process shutdown is requested
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Watcher lifecycle: register, stop, unregister
#[derive(Debug)]
pub struct DaemonController {
    pid_manager: PidManager,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl DaemonController {
    pub fn new(pid_file_path: PathBuf) -> Self {
        Self {
            pid_manager: PidManager::new(pid_file_path),
            shutdown_tx: None,
        }
    }

    pub fn pid_manager(&self) -> &PidManager {
        &self.pid_manager
    }

    pub fn running_pid(&self) -> Result<Option<u32>, DaemonError> {
        self.pid_manager.running_pid()
    }

    /// Claims the PID file for the current process
    ///
    /// # Errors
    /// `DaemonError::AlreadyRunning` if another live watcher holds it
    pub fn register(&mut self) -> Result<WatcherRegistration, DaemonError> {
        if let Some(pid) = self.pid_manager.running_pid()? {
            return Err(DaemonError::AlreadyRunning(pid));
        }

        let pid = std::process::id();
        self.pid_manager.write_pid(pid)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown_tx = Some(shutdown_tx);

        tracing::info!("Watcher registered with PID {}", pid);
        Ok(WatcherRegistration { pid, shutdown_rx })
    }

    /// Asks the running watcher to exit
    ///
    /// Uses the in-process channel when this controller registered the
    /// watcher, SIGTERM otherwise. Returns the watcher's PID.
    pub fn stop(&mut self) -> Result<u32, DaemonError> {
        let pid = self
            .pid_manager
            .running_pid()?
            .ok_or(DaemonError::NotRunning)?;

        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
            tracing::info!("Requested in-process watcher shutdown (PID: {})", pid);
            return Ok(pid);
        }

        #[cfg(unix)]
        {
            self.pid_manager.send_signal(pid, libc::SIGTERM)?;
            tracing::info!("Sent SIGTERM to watcher (PID: {})", pid);
            Ok(pid)
        }
        #[cfg(not(unix))]
        {
            Err(DaemonError::SignalError(
                "Cannot stop an external watcher on this platform".to_string(),
            ))
        }
    }

    /// Releases the PID file
    pub fn unregister(&mut self) -> Result<(), DaemonError> {
        self.shutdown_tx = None;
        self.pid_manager.delete_pid()?;
        tracing::info!("Watcher unregistered");
        Ok(())
    }

    pub fn shutdown_receiver(&self) -> Option<watch::Receiver<bool>> {
        self.shutdown_tx.as_ref().map(|tx| tx.subscribe())
    }
}
