//! Watcher commands
//!
//! Handles `clipo watch`, `clipo stop`, `clipo pause` and `clipo resume`.

use crate::app::{graceful_shutdown, AppContext};
use anyhow::{Context, Result};
use clipo_adapters::{ItemNotifier, SystemClipboard};
use clipo_core::{ClipboardPoller, DaemonController, DaemonError, MonitorSwitch};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// How often the running watcher repeats the retention sweep
const SWEEP_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Runs the clipboard watcher in the foreground until stopped
pub async fn start(ctx: &AppContext) -> Result<()> {
    let config = ctx.config();
    let mut controller = DaemonController::new(ctx.directories.pid_file_path());
    let registration = controller
        .register()
        .context("Failed to register watcher")?;

    let history = ctx.open_history().await?;

    let switch = MonitorSwitch::new(config.monitor.enabled);
    let poller = ClipboardPoller::new(
        Arc::new(SystemClipboard::new()),
        Arc::clone(&history),
        switch.clone(),
        config.monitor.interval(),
    );

    let notifier = ItemNotifier::new(&config.notifications);
    let notifier_task = (!notifier.is_silent()).then(|| notifier.spawn(history.subscribe()));

    if let Err(e) = poller.start().await {
        controller.unregister()?;
        return Err(e).context("Failed to start clipboard poller");
    }

    println!("Clipo watcher started (PID: {})", registration.pid);
    println!("Poll interval: {} ms", config.monitor.interval_ms);
    println!("Data directory: {}", ctx.directories.data_dir().display());
    if !switch.is_enabled() {
        println!("Monitoring is disabled; run 'clipo resume' to enable it");
    }
    tracing::info!(
        pid = registration.pid,
        items = history.len().await,
        "Clipo watcher started"
    );

    let retention_days = config.storage.retention_days;
    let mut sweep_timer = tokio::time::interval(SWEEP_PERIOD);
    let mut shutdown_rx = registration.shutdown_rx;
    let mut terminate = SignalListener::terminate()?;
    let mut pause = SignalListener::pause()?;
    let mut resume = SignalListener::resume()?;

    let reason = loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("\nReceived Ctrl+C, shutting down...");
                break "interrupted";
            }
            _ = terminate.recv() => break "terminated",
            _ = shutdown_rx.changed() => break "shutdown requested",
            _ = pause.recv() => {
                switch.disable();
                tracing::info!("Clipboard monitoring paused");
            }
            _ = resume.recv() => {
                switch.enable();
                tracing::info!("Clipboard monitoring resumed");
            }
            // the first tick fires immediately, giving a startup sweep
            _ = sweep_timer.tick() => {
                let summary = history.sweep(retention_days).await;
                if summary.removed_count > 0 {
                    tracing::info!(
                        removed = summary.removed_count,
                        blobs = summary.blobs_removed,
                        "Expired clipboard items removed"
                    );
                }
            }
        }
    };

    tracing::info!("Stopping clipboard poller...");
    if let Err(e) = poller.stop().await {
        tracing::warn!("Error stopping poller: {}", e);
    }
    if let Some(task) = notifier_task {
        task.abort();
    }

    controller.unregister()?;
    graceful_shutdown(reason, &ctx.directories);
    println!("Clipo watcher stopped");
    Ok(())
}

/// Asks the running watcher to exit
pub async fn stop(ctx: &AppContext) -> Result<()> {
    let mut controller = DaemonController::new(ctx.directories.pid_file_path());

    match controller.stop() {
        Ok(pid) => {
            println!("Sent stop signal to Clipo watcher (PID: {})", pid);

            tokio::time::sleep(Duration::from_millis(500)).await;
            if controller.running_pid()?.is_none() {
                println!("Clipo watcher stopped successfully");
            } else {
                println!("Watcher may still be shutting down...");
            }
            Ok(())
        }
        Err(DaemonError::NotRunning) => {
            println!("Clipo watcher is not running");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to stop watcher"),
    }
}

/// Pauses (`false`) or resumes (`true`) monitoring in the running watcher
pub fn set_monitoring(ctx: &AppContext, enabled: bool) -> Result<()> {
    let controller = DaemonController::new(ctx.directories.pid_file_path());
    let Some(pid) = controller.running_pid()? else {
        println!("Clipo watcher is not running");
        return Ok(());
    };

    send_monitor_signal(&controller, pid, enabled)?;
    if enabled {
        println!("Resumed clipboard monitoring (PID: {})", pid);
    } else {
        println!("Paused clipboard monitoring (PID: {})", pid);
    }
    Ok(())
}

#[cfg(unix)]
fn send_monitor_signal(controller: &DaemonController, pid: u32, enabled: bool) -> Result<()> {
    let signal = if enabled { libc::SIGUSR2 } else { libc::SIGUSR1 };
    controller
        .pid_manager()
        .send_signal(pid, signal)
        .context("Failed to signal watcher")
}

#[cfg(not(unix))]
fn send_monitor_signal(_controller: &DaemonController, _pid: u32, _enabled: bool) -> Result<()> {
    anyhow::bail!("Pausing the watcher is only supported on Unix")
}

/// A process signal the watcher reacts to besides Ctrl+C
#[cfg(unix)]
struct SignalListener(signal::unix::Signal);

#[cfg(unix)]
impl SignalListener {
    fn listen(kind: signal::unix::SignalKind, name: &str) -> Result<Self> {
        let stream = signal::unix::signal(kind)
            .with_context(|| format!("Failed to listen for {}", name))?;
        Ok(Self(stream))
    }

    fn terminate() -> Result<Self> {
        Self::listen(signal::unix::SignalKind::terminate(), "SIGTERM")
    }

    fn pause() -> Result<Self> {
        Self::listen(signal::unix::SignalKind::user_defined1(), "SIGUSR1")
    }

    fn resume() -> Result<Self> {
        Self::listen(signal::unix::SignalKind::user_defined2(), "SIGUSR2")
    }

    async fn recv(&mut self) {
        self.0.recv().await;
    }
}

#[cfg(not(unix))]
struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    fn terminate() -> Result<Self> {
        Ok(Self)
    }

    fn pause() -> Result<Self> {
        Ok(Self)
    }

    fn resume() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await
    }
}
