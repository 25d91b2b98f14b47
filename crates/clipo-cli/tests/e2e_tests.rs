//! End-to-End Tests for Clipo
//!
//! These tests wire the real adapters together:
//! - Watcher PID lifecycle
//! - Configuration handling
//! - SQLite persistence across restarts
//! - Poller ingestion through a scripted clipboard
//! - Retention sweeps with image blob cleanup
//! - Data directory management
//!
//! The system clipboard itself is never touched; `ScriptedClipboard` stands
//! in for it.

use async_trait::async_trait;
use clipo_adapters::{FsBlobStore, SqliteHistoryStore};
use clipo_core::{
    ClipboardError, ClipboardPort, HistoryService, ImageFormat, ImagePayload,
};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

type History = HistoryService<SqliteHistoryStore, FsBlobStore>;

/// Test environment with an isolated data directory
struct TestEnv {
    _temp_dir: TempDir,
    data_dir: PathBuf,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".clipo");
        let config_path = data_dir.join("config.toml");

        fs::create_dir_all(data_dir.join("images")).expect("Failed to create images dir");
        fs::create_dir_all(data_dir.join("logs")).expect("Failed to create logs dir");

        Self {
            _temp_dir: temp_dir,
            data_dir,
            config_path,
        }
    }

    fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).expect("Failed to write config");
    }

    fn default_config(&self) -> String {
        format!(
            r#"[monitor]
enabled = true
interval_ms = 50

[notifications]
show = false
play_sound = false

[storage]
data_dir = "{}"
retention_days = 7
"#,
            self.data_dir.display()
        )
    }

    fn pid_file_path(&self) -> PathBuf {
        self.data_dir.join("daemon.pid")
    }

    fn db_path(&self) -> PathBuf {
        self.data_dir.join("clipo.db")
    }

    fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Opens the history the way the CLI does
    async fn open_history(&self) -> Arc<History> {
        let persistence = SqliteHistoryStore::open(&self.db_path())
            .await
            .expect("Failed to open database");
        let blobs = FsBlobStore::new(self.images_dir());
        Arc::new(HistoryService::load(Arc::new(persistence), Arc::new(blobs)).await)
    }

    fn image_blob_count(&self) -> usize {
        fs::read_dir(self.images_dir())
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct ClipboardState {
    change_count: i64,
    text: Option<String>,
    image: Option<ImagePayload>,
    files: Option<Vec<PathBuf>>,
    written_text: Vec<String>,
    written_images: Vec<ImagePayload>,
}

/// Clipboard whose contents are set by the test
#[derive(Default)]
struct ScriptedClipboard {
    state: Mutex<ClipboardState>,
}

impl ScriptedClipboard {
    fn copy_text(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        state.change_count += 1;
        state.text = Some(text.to_string());
        state.image = None;
        state.files = None;
    }

    fn copy_image(&self, bytes: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.change_count += 1;
        state.text = None;
        state.image = Some(ImagePayload::new(bytes.to_vec(), ImageFormat::Png));
        state.files = None;
    }

    fn written_text(&self) -> Vec<String> {
        self.state.lock().unwrap().written_text.clone()
    }

    fn written_images(&self) -> Vec<ImagePayload> {
        self.state.lock().unwrap().written_images.clone()
    }
}

#[async_trait]
impl ClipboardPort for ScriptedClipboard {
    async fn change_count(&self) -> Result<i64, ClipboardError> {
        Ok(self.state.lock().unwrap().change_count)
    }

    async fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        Ok(self.state.lock().unwrap().text.clone())
    }

    async fn read_image(&self) -> Result<Option<ImagePayload>, ClipboardError> {
        Ok(self.state.lock().unwrap().image.clone())
    }

    async fn read_file_urls(&self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        Ok(self.state.lock().unwrap().files.clone())
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.state.lock().unwrap().written_text.push(text.to_string());
        Ok(())
    }

    async fn write_image(&self, image: &ImagePayload) -> Result<(), ClipboardError> {
        self.state.lock().unwrap().written_images.push(image.clone());
        Ok(())
    }

    async fn frontmost_application(&self) -> Option<String> {
        Some("Terminal".to_string())
    }
}

mod daemon_lifecycle {
    use super::*;
    use clipo_core::{DaemonController, DaemonError};

    #[test]
    fn test_pid_file_created_on_register() {
        let env = TestEnv::new();
        let mut controller = DaemonController::new(env.pid_file_path());

        let registration = controller.register().unwrap();

        assert!(env.pid_file_path().exists());
        let pid_content = fs::read_to_string(env.pid_file_path()).unwrap();
        assert_eq!(pid_content.trim().parse::<u32>().unwrap(), registration.pid);
        assert_eq!(registration.pid, std::process::id());

        controller.unregister().unwrap();
        assert!(!env.pid_file_path().exists());
    }

    #[test]
    fn test_second_watcher_is_refused() {
        let env = TestEnv::new();
        let mut first = DaemonController::new(env.pid_file_path());
        first.register().unwrap();

        let mut second = DaemonController::new(env.pid_file_path());
        let result = second.register();
        assert!(matches!(result, Err(DaemonError::AlreadyRunning(pid)) if pid == std::process::id()));

        first.unregister().unwrap();
    }

    #[test]
    fn test_stale_pid_file_is_replaced() {
        let env = TestEnv::new();
        // far above any default pid_max
        fs::write(env.pid_file_path(), "999999999").unwrap();

        let mut controller = DaemonController::new(env.pid_file_path());
        assert!(controller.running_pid().unwrap().is_none());
        assert!(!env.pid_file_path().exists());

        assert!(controller.register().is_ok());
        controller.unregister().unwrap();
    }

    #[tokio::test]
    async fn test_in_process_stop_signals_watcher() {
        let env = TestEnv::new();
        let mut controller = DaemonController::new(env.pid_file_path());
        let mut registration = controller.register().unwrap();

        let pid = controller.stop().unwrap();
        assert_eq!(pid, registration.pid);

        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            registration.shutdown_rx.changed(),
        )
        .await
        .expect("shutdown signal not received")
        .unwrap();
        assert!(*registration.shutdown_rx.borrow());

        controller.unregister().unwrap();
    }

    #[test]
    fn test_stop_without_watcher() {
        let env = TestEnv::new();
        let mut controller = DaemonController::new(env.pid_file_path());
        assert!(matches!(controller.stop(), Err(DaemonError::NotRunning)));
    }
}

mod configuration {
    use super::*;
    use clipo_core::{load_config_from_path, Config, LogLevel, DEFAULT_RETENTION_DAYS};
    use std::time::Duration;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();
        assert!(config.monitor.enabled);
        assert_eq!(config.monitor.interval(), Duration::from_millis(500));
        assert!(config.notifications.show);
        assert!(!config.notifications.play_sound);
        assert_eq!(config.storage.retention_days, DEFAULT_RETENTION_DAYS);
        assert_eq!(config.logging.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_config_loads_from_file() {
        let env = TestEnv::new();
        env.write_config(&env.default_config());

        let config = load_config_from_path(&env.config_path).unwrap();
        assert_eq!(config.monitor.interval_ms, 50);
        assert_eq!(config.storage.retention_days, 7);
        assert_eq!(config.storage.data_dir, env.data_dir);
        assert!(!config.notifications.show);
    }

    #[test]
    fn test_missing_config_is_written_with_defaults() {
        let env = TestEnv::new();
        assert!(!env.config_path.exists());

        let config = load_config_from_path(&env.config_path).unwrap();
        assert!(env.config_path.exists());
        assert_eq!(config.monitor.interval_ms, 500);
    }

    #[test]
    fn test_invalid_config_uses_defaults() {
        let env = TestEnv::new();
        env.write_config("this is not [valid toml");

        let config = load_config_from_path(&env.config_path).unwrap();
        assert_eq!(config.storage.retention_days, DEFAULT_RETENTION_DAYS);
    }

    #[test]
    fn test_zero_interval_falls_back_to_defaults() {
        let env = TestEnv::new();
        env.write_config("[monitor]\ninterval_ms = 0\n");

        let config = load_config_from_path(&env.config_path).unwrap();
        assert_eq!(config.monitor.interval_ms, 500);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let env = TestEnv::new();
        env.write_config("[storage]\nretention_days = 3\n");

        let config = load_config_from_path(&env.config_path).unwrap();
        assert_eq!(config.storage.retention_days, 3);
        assert!(config.monitor.enabled);
        assert_eq!(config.logging.level, "info");
    }
}

mod persistence_integration {
    use super::*;
    use clipo_core::{ClipboardItem, ItemContent, ItemKind, DEFAULT_CATEGORY};

    #[tokio::test]
    async fn test_history_survives_restart() {
        let env = TestEnv::new();
        {
            let history = env.open_history().await;
            history.add_text_item("first", DEFAULT_CATEGORY).await.unwrap();
            history.add_text_item("second", DEFAULT_CATEGORY).await.unwrap();
            history.add_category("Work").await;
        }

        let history = env.open_history().await;
        let items = history.items().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content().as_str(), "second");
        assert_eq!(items[0].kind(), ItemKind::Text);
        assert_eq!(items[1].content().as_str(), "first");
        assert_eq!(history.user_categories().await, vec!["Work".to_string()]);
    }

    #[tokio::test]
    async fn test_only_adjacent_duplicates_are_suppressed() {
        let env = TestEnv::new();
        let history = env.open_history().await;

        history.add_text_item("a", DEFAULT_CATEGORY).await.unwrap();
        history.add_text_item("b", DEFAULT_CATEGORY).await.unwrap();
        // consecutive duplicate is ignored
        assert!(history.add_text_item("b", DEFAULT_CATEGORY).await.is_none());
        history.add_text_item("a", DEFAULT_CATEGORY).await.unwrap();
        drop(history);

        let history = env.open_history().await;
        let contents: Vec<String> = history
            .items()
            .await
            .iter()
            .map(|item| item.content().as_str().into_owned())
            .collect();
        assert_eq!(contents, vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn test_favorite_and_category_persist() {
        let env = TestEnv::new();
        let id = {
            let history = env.open_history().await;
            let id = history.add_text_item("keep me", DEFAULT_CATEGORY).await.unwrap();
            assert_eq!(history.toggle_favorite(id).await, Some(true));
            assert!(history.recategorize(id, "Snippets").await);
            id
        };

        let history = env.open_history().await;
        let item = history.get(id).await.unwrap();
        assert!(item.is_favorite());
        assert_eq!(item.category(), "Snippets");
        assert!(history.categories().await.contains(&"Snippets".to_string()));
    }

    #[tokio::test]
    async fn test_source_application_is_kept() {
        let env = TestEnv::new();
        let item = ClipboardItem::new(
            ItemContent::Text("from the editor".to_string()),
            Some("Editor".to_string()),
        );
        let id = item.id();
        {
            let history = env.open_history().await;
            assert!(history.ingest(item).await);
        }

        let history = env.open_history().await;
        let item = history.get(id).await.unwrap();
        assert_eq!(item.source_application(), Some("Editor"));
    }
}

mod poller_integration {
    use super::*;
    use clipo_core::{ClipboardPoller, ItemKind, MonitorSwitch, PollerState, TickOutcome};
    use std::time::Duration;

    fn poller(
        clipboard: &Arc<ScriptedClipboard>,
        history: &Arc<History>,
        interval: Duration,
    ) -> ClipboardPoller<ScriptedClipboard, SqliteHistoryStore, FsBlobStore> {
        ClipboardPoller::new(
            Arc::clone(clipboard),
            Arc::clone(history),
            MonitorSwitch::default(),
            interval,
        )
    }

    #[tokio::test]
    async fn test_copied_text_is_ingested_and_persisted() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        let clipboard = Arc::new(ScriptedClipboard::default());
        clipboard.copy_text("already there");

        let poller = poller(&clipboard, &history, Duration::from_millis(20));
        assert_eq!(poller.check_now().await.unwrap(), TickOutcome::Baselined);
        assert!(history.is_empty().await);

        clipboard.copy_text("hello world");
        let outcome = poller.check_now().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Ingested(_)));
        drop(poller);
        drop(history);

        let history = env.open_history().await;
        let items = history.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content().as_str(), "hello world");
        assert_eq!(items[0].source_application(), Some("Terminal"));
    }

    #[tokio::test]
    async fn test_copied_image_lands_in_blob_store() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        let clipboard = Arc::new(ScriptedClipboard::default());
        let poller = poller(&clipboard, &history, Duration::from_millis(20));
        poller.check_now().await.unwrap();

        clipboard.copy_image(b"\x89PNG fake image");
        let outcome = poller.check_now().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Ingested(_)));

        let item = history.items().await.remove(0);
        assert_eq!(item.kind(), ItemKind::Image);
        let path = item.content().image_path().unwrap().to_path_buf();
        assert!(path.starts_with(env.images_dir()));
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG fake image");
    }

    #[tokio::test]
    async fn test_periodic_loop_ingests_until_stopped() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        let clipboard = Arc::new(ScriptedClipboard::default());
        let poller = poller(&clipboard, &history, Duration::from_millis(20));

        poller.start().await.unwrap();
        assert!(poller.is_running());

        clipboard.copy_text("one");
        tokio::time::sleep(Duration::from_millis(100)).await;
        clipboard.copy_text("two");
        tokio::time::sleep(Duration::from_millis(100)).await;

        poller.stop().await.unwrap();
        assert!(!poller.is_running());

        let contents: Vec<String> = history
            .items()
            .await
            .iter()
            .map(|item| item.content().as_str().into_owned())
            .collect();
        assert_eq!(contents, vec!["two", "one"]);
    }

    #[tokio::test]
    async fn test_paused_poller_ignores_copies() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        let clipboard = Arc::new(ScriptedClipboard::default());
        let poller = poller(&clipboard, &history, Duration::from_millis(20));
        poller.check_now().await.unwrap();

        poller.switch().disable();
        assert_eq!(poller.state(), PollerState::Paused);
        clipboard.copy_text("secret");
        assert_eq!(poller.check_now().await.unwrap(), TickOutcome::Paused);

        poller.switch().enable();
        // resuming rebaselines, so the copy made while paused is skipped
        assert_eq!(poller.check_now().await.unwrap(), TickOutcome::Baselined);
        assert!(history.is_empty().await);
    }

    #[tokio::test]
    async fn test_copy_item_writes_back_to_clipboard() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        let clipboard = Arc::new(ScriptedClipboard::default());
        let poller = poller(&clipboard, &history, Duration::from_millis(20));
        poller.check_now().await.unwrap();

        clipboard.copy_text("round trip");
        poller.check_now().await.unwrap();
        clipboard.copy_image(b"\x89PNG pixels");
        poller.check_now().await.unwrap();

        let items = history.items().await;
        assert!(history.copy_item(items[1].id(), clipboard.as_ref()).await.unwrap());
        assert!(history.copy_item(items[0].id(), clipboard.as_ref()).await.unwrap());

        assert_eq!(clipboard.written_text(), vec!["round trip".to_string()]);
        let images = clipboard.written_images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].bytes, b"\x89PNG pixels");
        assert_eq!(images[0].format, ImageFormat::Png);
    }
}

mod retention_integration {
    use super::*;
    use chrono::{Duration, Utc};
    use clipo_core::{BlobStorePort, ClipboardItem, ItemContent};

    async fn image_item(history: &History, bytes: &[u8], age_days: i64) -> ClipboardItem {
        let path = history
            .blobs()
            .write_image(&ImagePayload::new(bytes.to_vec(), ImageFormat::Png))
            .await
            .unwrap();
        ClipboardItem::new(ItemContent::ImageRef(path), None)
            .with_created_at(Utc::now() - Duration::days(age_days))
    }

    fn text_item(text: &str, age_days: i64) -> ClipboardItem {
        ClipboardItem::new(ItemContent::Text(text.to_string()), None)
            .with_created_at(Utc::now() - Duration::days(age_days))
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_items_and_blobs() {
        let env = TestEnv::new();
        let history = env.open_history().await;

        history.ingest(image_item(&history, b"old image", 40).await).await;
        history.ingest(text_item("old text", 35)).await;
        history.ingest(text_item("fresh text", 1)).await;
        assert_eq!(env.image_blob_count(), 1);

        let summary = history.sweep(30).await;
        assert_eq!(summary.removed_count, 2);
        assert_eq!(summary.blobs_removed, 1);
        assert_eq!(env.image_blob_count(), 0);
        drop(history);

        let history = env.open_history().await;
        let items = history.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content().as_str(), "fresh text");
    }

    #[tokio::test]
    async fn test_sweep_keeps_favorites() {
        let env = TestEnv::new();
        let history = env.open_history().await;

        let favorite = text_item("ancient favorite", 400).with_favorite(true);
        let id = favorite.id();
        history.ingest(favorite).await;
        history.ingest(text_item("ancient", 400)).await;

        let summary = history.sweep(30).await;
        assert_eq!(summary.removed_count, 1);
        assert_eq!(summary.favorites_kept, 1);
        assert!(history.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_clear_releases_blobs() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        history.ingest(image_item(&history, b"img one", 0).await).await;
        history.ingest(image_item(&history, b"img two", 0).await).await;
        assert_eq!(env.image_blob_count(), 2);

        assert_eq!(history.clear_all().await, 2);
        assert_eq!(env.image_blob_count(), 0);
    }

    #[tokio::test]
    async fn test_nothing_expired_is_a_no_op() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        history.ingest(text_item("new", 0)).await;

        let summary = history.sweep(30).await;
        assert_eq!(summary.removed_count, 0);
        assert_eq!(history.len().await, 1);
    }
}

mod category_management {
    use super::*;
    use clipo_core::{ALL_CATEGORY, DEFAULT_CATEGORY, FAVORITES_CATEGORY};

    #[tokio::test]
    async fn test_removing_category_reassigns_items() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        history.add_category("Work").await;
        let id = history.add_text_item("meeting notes", "Work").await.unwrap();

        let removal = history.remove_category("Work").await;
        assert!(removal.unlisted);
        assert_eq!(removal.reassigned, 1);
        drop(history);

        let history = env.open_history().await;
        assert_eq!(history.get(id).await.unwrap().category(), DEFAULT_CATEGORY);
        assert!(history.user_categories().await.is_empty());
    }

    #[tokio::test]
    async fn test_view_filters_by_category_and_search() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        history.add_text_item("Rust book", "Reading").await.unwrap();
        history.add_text_item("rust snippet", "Code").await.unwrap();
        let fav = history.add_text_item("grocery list", DEFAULT_CATEGORY).await.unwrap();
        history.toggle_favorite(fav).await;

        assert_eq!(history.view(ALL_CATEGORY, "RUST").await.len(), 2);
        assert_eq!(history.view("Code", "rust").await.len(), 1);
        assert_eq!(history.view(FAVORITES_CATEGORY, "").await.len(), 1);
        assert!(history.view("Reading", "grocery").await.is_empty());
    }

    #[tokio::test]
    async fn test_categories_list_is_ordered() {
        let env = TestEnv::new();
        let history = env.open_history().await;
        history.add_category("Zeta").await;
        history.add_category("Alpha").await;

        let categories = history.categories().await;
        assert_eq!(categories[0], ALL_CATEGORY);
        assert_eq!(
            &categories[1..],
            &["Alpha", "Favorites", "General", "Zeta"].map(String::from)
        );
    }
}

mod directory_management {
    use super::*;
    use clipo_core::DirectoryManager;

    #[test]
    fn test_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("nested").join(".clipo");
        let directories = DirectoryManager::new(data_dir.clone());

        directories.initialize().unwrap();

        assert!(directories.is_initialized());
        assert!(data_dir.join("images").is_dir());
        assert!(data_dir.join("logs").is_dir());
        assert_eq!(directories.database_path(), data_dir.join("clipo.db"));
    }

    #[test]
    fn test_directory_creation_idempotent() {
        let env = TestEnv::new();
        let directories = DirectoryManager::new(env.data_dir.clone());
        fs::write(env.images_dir().join("keep.png"), b"x").unwrap();

        directories.initialize().unwrap();
        directories.initialize().unwrap();

        assert!(env.images_dir().join("keep.png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let directories = DirectoryManager::new(temp_dir.path().join(".clipo"));
        directories.initialize().unwrap();

        let mode = fs::metadata(directories.data_dir())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
