//! Clipboard poller
//!
//! Samples the clipboard's change counter at a fixed interval using Tokio
//! timers. Detection is counter-based: content is only read once the counter
//! moved. The counter is baselined when polling starts and again whenever
//! monitoring resumes, so content that was already on the clipboard is never
//! ingested.

use crate::classifier::{classify, RawPayload};
use crate::history::HistoryService;
use crate::item::{ClipboardItem, ItemId};
use crate::ports::blob::BlobStorePort;
use crate::ports::clipboard::{ClipboardError, ClipboardPort};
use crate::ports::persistence::HistoryPersistencePort;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Default sampling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Errors that can occur during poller operations
#[derive(Debug, Error)]
pub enum PollerError {
    /// Sampling the clipboard failed
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Poller is already running
    #[error("Poller is already running")]
    AlreadyRunning,

    /// Poller is not running
    #[error("Poller is not running")]
    NotRunning,
}

/// Shared monitoring-enabled flag
///
/// Clones observe the same flag. The poller checks it before every tick.
#[derive(Debug, Clone)]
pub struct MonitorSwitch(Arc<AtomicBool>);

impl MonitorSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn enable(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PollerState {
        if self.is_enabled() {
            PollerState::Active
        } else {
            PollerState::Paused
        }
    }
}

impl Default for MonitorSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Poller state as driven by the [`MonitorSwitch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Active,
    Paused,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The counter was recorded as the new baseline
    Baselined,
    /// Counter did not move
    Unchanged,
    /// Monitoring is disabled
    Paused,
    /// A new item was ingested
    Ingested(ItemId),
    /// The payload repeated the head item
    Duplicate,
    /// The counter moved but no usable payload was present
    Dropped,
    /// The image blob could not be written
    Abandoned,
}

struct PollerShared<C, P, B>
where
    C: ClipboardPort + 'static,
    P: HistoryPersistencePort + 'static,
    B: BlobStorePort + 'static,
{
    clipboard: Arc<C>,
    history: Arc<HistoryService<P, B>>,
    switch: MonitorSwitch,
    /// Last observed change counter; `None` until baselined.
    /// Held for the whole tick so ticks never overlap.
    last_change_count: Mutex<Option<i64>>,
}

impl<C, P, B> PollerShared<C, P, B>
where
    C: ClipboardPort + 'static,
    P: HistoryPersistencePort + 'static,
    B: BlobStorePort + 'static,
{
    async fn tick(&self) -> Result<TickOutcome, PollerError> {
        let mut last = self.last_change_count.lock().await;

        if !self.switch.is_enabled() {
            // forces a rebaseline on resume
            *last = None;
            return Ok(TickOutcome::Paused);
        }

        let count = self.clipboard.change_count().await?;
        let Some(previous) = *last else {
            *last = Some(count);
            debug!("Baselined clipboard change count at {}", count);
            return Ok(TickOutcome::Baselined);
        };
        if previous == count {
            return Ok(TickOutcome::Unchanged);
        }
        *last = Some(count);
        debug!("Clipboard change count moved {} -> {}", previous, count);

        let payload = match self.read_payload().await {
            Some(Ok(payload)) => payload,
            Some(Err(outcome)) => return Ok(outcome),
            None => return Ok(TickOutcome::Dropped),
        };

        let Some(content) = classify(payload) else {
            return Ok(TickOutcome::Dropped);
        };

        let source = self.clipboard.frontmost_application().await;
        let item = ClipboardItem::new(content, source);
        let id = item.id();
        if self.history.ingest(item).await {
            Ok(TickOutcome::Ingested(id))
        } else {
            Ok(TickOutcome::Duplicate)
        }
    }

    /// Reads the first available representation: text, image, file URLs
    async fn read_payload(&self) -> Option<Result<RawPayload, TickOutcome>> {
        match self.clipboard.read_text().await {
            Ok(Some(text)) if !text.is_empty() => return Some(Ok(RawPayload::Text(text))),
            Ok(_) => {}
            Err(e) => warn!("Failed to read clipboard text: {}", e),
        }

        match self.clipboard.read_image().await {
            Ok(Some(image)) => {
                return match self.history.blobs().write_image(&image).await {
                    Ok(path) => Some(Ok(RawPayload::StoredImage(path))),
                    Err(e) => {
                        warn!("Failed to store clipboard image, skipping: {}", e);
                        Some(Err(TickOutcome::Abandoned))
                    }
                };
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read clipboard image: {}", e),
        }

        match self.clipboard.read_file_urls().await {
            Ok(Some(paths)) if !paths.is_empty() => Some(Ok(RawPayload::FileUrls(paths))),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read clipboard file URLs: {}", e);
                None
            }
        }
    }
}

/// Periodic clipboard poller feeding the history service
///
/// The poll loop runs in a background Tokio task. It supports graceful
/// shutdown and tracks consecutive sampling failures.
pub struct ClipboardPoller<C, P, B>
where
    C: ClipboardPort + 'static,
    P: HistoryPersistencePort + 'static,
    B: BlobStorePort + 'static,
{
    shared: Arc<PollerShared<C, P, B>>,
    interval: Duration,
    running: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    consecutive_failures: Arc<AtomicU64>,
    max_consecutive_failures: u64,
}

impl<C, P, B> ClipboardPoller<C, P, B>
where
    C: ClipboardPort + 'static,
    P: HistoryPersistencePort + 'static,
    B: BlobStorePort + 'static,
{
    /// Creates a new poller
    ///
    /// # Arguments
    /// * `clipboard` - The clipboard port implementation
    /// * `history` - History service that receives new items
    /// * `switch` - Monitoring-enabled flag
    /// * `interval` - Sampling interval
    pub fn new(
        clipboard: Arc<C>,
        history: Arc<HistoryService<P, B>>,
        switch: MonitorSwitch,
        interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(PollerShared {
                clipboard,
                history,
                switch,
                last_change_count: Mutex::new(None),
            }),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
            consecutive_failures: Arc::new(AtomicU64::new(0)),
            max_consecutive_failures: 5,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PollerState {
        self.shared.switch.state()
    }

    pub fn switch(&self) -> &MonitorSwitch {
        &self.shared.switch
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the number of consecutive sampling failures
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Records the current change counter without ingesting anything
    pub async fn baseline(&self) -> Result<(), PollerError> {
        let count = self.shared.clipboard.change_count().await?;
        *self.shared.last_change_count.lock().await = Some(count);
        debug!("Baselined clipboard change count at {}", count);
        Ok(())
    }

    /// Runs a single tick immediately
    ///
    /// Independent of the periodic loop; if no baseline exists yet this only
    /// records one.
    pub async fn check_now(&self) -> Result<TickOutcome, PollerError> {
        self.shared.tick().await
    }

    /// Starts the periodic poll loop
    ///
    /// Baselines the counter, then spawns a background task that ticks at
    /// the configured interval until `stop()` is called.
    ///
    /// # Errors
    /// Returns `PollerError::AlreadyRunning` if the poller is already active
    pub async fn start(&self) -> Result<(), PollerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PollerError::AlreadyRunning);
        }

        if self.shared.switch.is_enabled() {
            if let Err(e) = self.baseline().await {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let stop_signal = Arc::clone(&self.stop_signal);
        let consecutive_failures = Arc::clone(&self.consecutive_failures);
        let max_failures = self.max_consecutive_failures;
        let period = self.interval;

        tokio::spawn(async move {
            info!("Starting clipboard polling with interval: {:?}", period);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick of an interval completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = stop_signal.notified() => {
                        info!("Received stop signal, shutting down poller");
                        break;
                    }
                    _ = ticker.tick() => {
                        match shared.tick().await {
                            Ok(outcome) => {
                                consecutive_failures.store(0, Ordering::SeqCst);
                                if let TickOutcome::Ingested(id) = outcome {
                                    debug!("Tick ingested item {}", id);
                                }
                            }
                            Err(e) => {
                                let failures = consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                                error!("Clipboard poll failed: {}", e);

                                if failures >= max_failures {
                                    warn!(
                                        "Clipboard polling has failed {} consecutive times",
                                        failures
                                    );
                                }
                            }
                        }
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            info!("Poller stopped");
        });

        Ok(())
    }

    /// Stops the periodic poll loop and waits for the task to finish
    ///
    /// # Errors
    /// Returns `PollerError::NotRunning` if the poller is not active
    pub async fn stop(&self) -> Result<(), PollerError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(PollerError::NotRunning);
        }

        info!("Stopping poller...");
        self.stop_signal.notify_one();

        while self.running.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Ok(())
    }
}
