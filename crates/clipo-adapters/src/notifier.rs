//! New-item announcements
//!
//! Consumes [`HistoryEvent`]s and, depending on configuration, logs the new
//! item's preview and rings the terminal bell.

use clipo_core::config::NotificationConfig;
use clipo_core::history::HistoryEvent;
use std::io::Write;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Characters of the preview included in an announcement
const ANNOUNCE_CHARS: usize = 60;

const BELL: &[u8] = b"\x07";

/// Announces ingested items
#[derive(Debug, Clone)]
pub struct ItemNotifier {
    show: bool,
    play_sound: bool,
}

impl ItemNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            show: config.show,
            play_sound: config.play_sound,
        }
    }

    pub fn is_silent(&self) -> bool {
        !self.show && !self.play_sound
    }

    /// Builds the announcement line for an event, if one should be shown
    pub fn announcement(&self, event: &HistoryEvent) -> Option<String> {
        if !self.show {
            return None;
        }
        let HistoryEvent::Ingested(item) = event;
        let mut preview: String = item.preview().chars().take(ANNOUNCE_CHARS).collect();
        if item.preview().chars().count() > ANNOUNCE_CHARS {
            preview.push('…');
        }
        Some(format!("Copied {}: {}", item.kind(), preview.replace('\n', " ")))
    }

    fn notify(&self, event: &HistoryEvent) {
        if let Some(line) = self.announcement(event) {
            tracing::info!("{}", line);
        }
        if self.play_sound {
            let mut stderr = std::io::stderr();
            if let Err(e) = stderr.write_all(BELL).and_then(|_| stderr.flush()) {
                tracing::debug!("Failed to ring bell: {}", e);
            }
        }
    }

    /// Spawns a task that announces events until the channel closes
    pub fn spawn(self, mut events: broadcast::Receiver<HistoryEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.notify(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Notifier skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipo_core::item::{ClipboardItem, ItemContent};

    fn notifier(show: bool, play_sound: bool) -> ItemNotifier {
        ItemNotifier::new(&NotificationConfig { show, play_sound })
    }

    fn ingested(text: &str) -> HistoryEvent {
        HistoryEvent::Ingested(ClipboardItem::new(ItemContent::Text(text.to_string()), None))
    }

    #[test]
    fn test_announcement_contains_kind_and_preview() {
        let line = notifier(true, false)
            .announcement(&ingested("hello\nworld"))
            .unwrap();
        assert_eq!(line, "Copied text: hello world");
    }

    #[test]
    fn test_announcement_is_truncated() {
        let line = notifier(true, false)
            .announcement(&ingested(&"x".repeat(90)))
            .unwrap();
        let (prefix, preview) = line.split_once(": ").unwrap();
        assert_eq!(prefix, "Copied text");
        assert!(preview.ends_with('…'));
        assert_eq!(preview.chars().count(), ANNOUNCE_CHARS + 1);
        assert!(preview.chars().take(ANNOUNCE_CHARS).all(|c| c == 'x'));
    }

    #[test]
    fn test_announcement_at_limit_is_not_truncated() {
        let text = "y".repeat(ANNOUNCE_CHARS);
        let line = notifier(true, false).announcement(&ingested(&text)).unwrap();
        assert_eq!(line, format!("Copied text: {}", text));
    }

    #[test]
    fn test_no_announcement_when_hidden() {
        assert!(notifier(false, true).announcement(&ingested("a")).is_none());
        assert!(notifier(false, false).is_silent());
        assert!(!notifier(false, true).is_silent());
    }

    #[tokio::test]
    async fn test_task_ends_when_channel_closes() {
        let (tx, rx) = broadcast::channel(4);
        let handle = notifier(true, false).spawn(rx);

        tx.send(ingested("one")).unwrap();
        drop(tx);

        handle.await.unwrap();
    }
}
