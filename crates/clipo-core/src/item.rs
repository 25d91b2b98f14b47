//! Clipboard history item model
//!
//! A [`ClipboardItem`] carries its payload as an [`ItemContent`] tagged union so
//! an image blob path can never be mistaken for copied text. The item kind is
//! derived from the variant and therefore fixed once the item exists.
//!
//! On the wire (and in the persisted history) an item flattens to a record of
//! `{id, content, kind, createdAt, isFavorite, category, preview,
//! sourceApplication}`.

use crate::classifier::preview_for;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Category assigned to every new item and to orphans of a removed category
pub const DEFAULT_CATEGORY: &str = "General";

/// Identifier of a history item
pub type ItemId = Uuid;

/// Kind of a clipboard item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Text,
    Image,
    File,
    Url,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Text => "text",
            ItemKind::Image => "image",
            ItemKind::File => "file",
            ItemKind::Url => "url",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ItemKind::Text),
            "image" => Ok(ItemKind::Image),
            "file" => Ok(ItemKind::File),
            "url" => Ok(ItemKind::Url),
            _ => Err(format!("Unknown item kind: {}", s)),
        }
    }
}

/// Payload of a clipboard item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemContent {
    /// Plain text
    Text(String),
    /// A string carrying a URL scheme
    Url(String),
    /// One or more file paths, newline separated
    FilePaths(String),
    /// Path of an image blob persisted outside the history
    ImageRef(PathBuf),
}

impl ItemContent {
    /// Rebuilds a content value from its flattened form
    pub fn from_parts(kind: ItemKind, content: String) -> Self {
        match kind {
            ItemKind::Text => ItemContent::Text(content),
            ItemKind::Url => ItemContent::Url(content),
            ItemKind::File => ItemContent::FilePaths(content),
            ItemKind::Image => ItemContent::ImageRef(PathBuf::from(content)),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemContent::Text(_) => ItemKind::Text,
            ItemContent::Url(_) => ItemKind::Url,
            ItemContent::FilePaths(_) => ItemKind::File,
            ItemContent::ImageRef(_) => ItemKind::Image,
        }
    }

    /// Canonical string form (the blob path for images)
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            ItemContent::Text(s) | ItemContent::Url(s) | ItemContent::FilePaths(s) => {
                Cow::Borrowed(s.as_str())
            }
            ItemContent::ImageRef(path) => path.to_string_lossy(),
        }
    }

    /// Blob path of an image item
    pub fn image_path(&self) -> Option<&Path> {
        match self {
            ItemContent::ImageRef(path) => Some(path),
            _ => None,
        }
    }

    /// Replacement content of the same kind
    pub fn replaced_with(&self, content: String) -> Self {
        Self::from_parts(self.kind(), content)
    }
}

/// A single entry of the clipboard history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ItemRecord", from = "ItemRecord")]
pub struct ClipboardItem {
    id: ItemId,
    content: ItemContent,
    created_at: DateTime<Utc>,
    is_favorite: bool,
    category: String,
    preview: String,
    source_application: Option<String>,
}

impl ClipboardItem {
    /// Creates a fresh item stamped with the current time
    pub fn new(content: ItemContent, source_application: Option<String>) -> Self {
        let preview = preview_for(&content, source_application.as_deref());
        Self {
            id: Uuid::new_v4(),
            content,
            created_at: Utc::now(),
            is_favorite: false,
            category: DEFAULT_CATEGORY.to_string(),
            preview,
            source_application,
        }
    }

    /// Overrides the creation time (used when importing or backdating items)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets the initial category
    pub fn with_category(mut self, category: &str) -> Self {
        self.set_category(category);
        self
    }

    /// Sets the initial favorite flag
    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    pub fn kind(&self) -> ItemKind {
        self.content.kind()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn source_application(&self) -> Option<&str> {
        self.source_application.as_deref()
    }

    /// Whether this item and `other` carry the same `(content, kind)` pair
    pub fn same_payload(&self, other: &ClipboardItem) -> bool {
        self.content == other.content
    }

    /// Short human readable title
    pub fn display_title(&self) -> String {
        match &self.content {
            ItemContent::Text(text) => {
                let first = text.lines().next().unwrap_or("").trim();
                if first.is_empty() {
                    "Empty".to_string()
                } else {
                    first.to_string()
                }
            }
            ItemContent::ImageRef(_) => "Image".to_string(),
            ItemContent::FilePaths(paths) => paths
                .lines()
                .last()
                .and_then(|line| Path::new(line.trim()).file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "File".to_string()),
            ItemContent::Url(url) => url_host(url).unwrap_or(url).to_string(),
        }
    }

    /// Abbreviated age relative to `now`, e.g. `"5m ago"`
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let secs = (now - self.created_at).num_seconds().max(0);
        match secs {
            s if s < 60 => format!("{}s ago", s),
            s if s < 3600 => format!("{}m ago", s / 60),
            s if s < 86400 => format!("{}h ago", s / 3600),
            s => format!("{}d ago", s / 86400),
        }
    }

    /// Case-insensitive match on content, preview and display title
    ///
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.content.as_str().to_lowercase().contains(needle)
            || self.preview.to_lowercase().contains(needle)
            || self.display_title().to_lowercase().contains(needle)
    }

    pub(crate) fn toggle_favorite(&mut self) -> bool {
        self.is_favorite = !self.is_favorite;
        self.is_favorite
    }

    pub(crate) fn set_category(&mut self, category: &str) {
        let trimmed = category.trim();
        self.category = if trimmed.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            trimmed.to_string()
        };
    }

    /// Replaces the payload, keeping the kind, and recomputes the preview
    pub(crate) fn update_content(&mut self, content: String) {
        self.content = self.content.replaced_with(content);
        self.preview = preview_for(&self.content, self.source_application.as_deref());
    }
}

/// Extracts the host part of a URL-like string
fn url_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = match host_port.strip_prefix('[') {
        Some(bracketed) => bracketed.split(']').next()?,
        None => host_port.split(':').next()?,
    };
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Persisted representation of a [`ClipboardItem`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    id: Uuid,
    content: String,
    kind: ItemKind,
    created_at: DateTime<Utc>,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default = "default_category")]
    category: String,
    preview: String,
    #[serde(default)]
    source_application: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl From<ClipboardItem> for ItemRecord {
    fn from(item: ClipboardItem) -> Self {
        Self {
            id: item.id,
            content: item.content.as_str().into_owned(),
            kind: item.content.kind(),
            created_at: item.created_at,
            is_favorite: item.is_favorite,
            category: item.category,
            preview: item.preview,
            source_application: item.source_application,
        }
    }
}

impl From<ItemRecord> for ClipboardItem {
    fn from(record: ItemRecord) -> Self {
        let category = if record.category.trim().is_empty() {
            default_category()
        } else {
            record.category
        };
        Self {
            id: record.id,
            content: ItemContent::from_parts(record.kind, record.content),
            created_at: record.created_at,
            is_favorite: record.is_favorite,
            category,
            preview: record.preview,
            source_application: record.source_application,
        }
    }
}
