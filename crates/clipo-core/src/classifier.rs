//! Payload classification and preview generation
//!
//! Turns what was read from the clipboard into an [`ItemContent`]. Rules are
//! applied in priority order: URL, existing file path, plain text. Image
//! payloads are classified only after their bytes were persisted as a blob,
//! so the classifier only ever sees the blob path.

use crate::item::ItemContent;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Number of characters kept in a text preview
pub const PREVIEW_CHAR_LIMIT: usize = 100;

/// Source label used in image previews when the origin is unknown
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Clipboard payload ready for classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    /// String representation
    Text(String),
    /// Image bytes already written to this blob path
    StoredImage(PathBuf),
    /// File URL list
    FileUrls(Vec<PathBuf>),
}

/// Classifies a payload, probing the filesystem with [`Path::exists`]
pub fn classify(payload: RawPayload) -> Option<ItemContent> {
    classify_with(payload, |path| path.exists())
}

/// Classifies a payload using a caller supplied existence check
///
/// Returns `None` for payloads that must not become history items (empty
/// strings, empty file lists).
pub fn classify_with<F>(payload: RawPayload, exists: F) -> Option<ItemContent>
where
    F: Fn(&Path) -> bool,
{
    match payload {
        RawPayload::Text(text) => classify_text(text, exists),
        RawPayload::StoredImage(path) => Some(ItemContent::ImageRef(path)),
        RawPayload::FileUrls(paths) => {
            if paths.is_empty() {
                return None;
            }
            let joined = paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("\n");
            Some(ItemContent::FilePaths(joined))
        }
    }
}

fn classify_text<F>(text: String, exists: F) -> Option<ItemContent>
where
    F: Fn(&Path) -> bool,
{
    if text.is_empty() {
        return None;
    }

    if is_url(&text) {
        Some(ItemContent::Url(text))
    } else if looks_like_path(&text) && exists(Path::new(&text)) {
        Some(ItemContent::FilePaths(text))
    } else {
        Some(ItemContent::Text(text))
    }
}

fn is_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://") || text.contains("://")
}

fn looks_like_path(text: &str) -> bool {
    text.contains('/') || text.contains(MAIN_SEPARATOR)
}

/// Derives the preview string for a content value
///
/// - text: first [`PREVIEW_CHAR_LIMIT`] characters
/// - image: `"Image copied from <source>"`
/// - file: last path segment
/// - url: the URL itself
pub fn preview_for(content: &ItemContent, source_application: Option<&str>) -> String {
    match content {
        ItemContent::Text(text) => text.chars().take(PREVIEW_CHAR_LIMIT).collect(),
        ItemContent::ImageRef(_) => format!(
            "Image copied from {}",
            source_application.unwrap_or(UNKNOWN_SOURCE)
        ),
        ItemContent::FilePaths(paths) => match paths.rsplit(['/', MAIN_SEPARATOR]).next() {
            Some(segment) if !segment.is_empty() => segment.to_string(),
            _ => "File".to_string(),
        },
        ItemContent::Url(url) => url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use tempfile::TempDir;

    fn never(_: &Path) -> bool {
        false
    }

    fn always(_: &Path) -> bool {
        true
    }

    #[test]
    fn test_http_and_https_are_urls() {
        let c = classify_with(RawPayload::Text("http://example.com".into()), never).unwrap();
        assert_eq!(c.kind(), ItemKind::Url);
        let c = classify_with(RawPayload::Text("https://example.com".into()), never).unwrap();
        assert_eq!(c.kind(), ItemKind::Url);
    }

    #[test]
    fn test_any_scheme_marker_is_url() {
        let c = classify_with(RawPayload::Text("ssh://host/repo".into()), always).unwrap();
        assert_eq!(c.kind(), ItemKind::Url);
    }

    #[test]
    fn test_url_wins_over_existing_path() {
        let c = classify_with(RawPayload::Text("file:///etc/hosts".into()), always).unwrap();
        assert_eq!(c.kind(), ItemKind::Url);
    }

    #[test]
    fn test_existing_path_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();

        let text = file.to_string_lossy().into_owned();
        let content = classify(RawPayload::Text(text)).unwrap();
        assert_eq!(content.kind(), ItemKind::File);
        assert_eq!(preview_for(&content, None), "notes.txt");
    }

    #[test]
    fn test_missing_path_is_text() {
        let c = classify_with(RawPayload::Text("/no/such/file".into()), never).unwrap();
        assert_eq!(c.kind(), ItemKind::Text);
    }

    #[test]
    fn test_word_without_separator_is_text_even_if_path_exists() {
        let c = classify_with(RawPayload::Text("Cargo.toml".into()), always).unwrap();
        assert_eq!(c.kind(), ItemKind::Text);
    }

    #[test]
    fn test_empty_string_is_dropped() {
        assert!(classify_with(RawPayload::Text(String::new()), always).is_none());
    }

    #[test]
    fn test_empty_file_list_is_dropped() {
        assert!(classify_with(RawPayload::FileUrls(vec![]), always).is_none());
    }

    #[test]
    fn test_file_urls_are_joined() {
        let content = classify_with(
            RawPayload::FileUrls(vec![PathBuf::from("/a/one.txt"), PathBuf::from("/b/two.txt")]),
            never,
        )
        .unwrap();
        assert_eq!(content, ItemContent::FilePaths("/a/one.txt\n/b/two.txt".into()));
        assert_eq!(preview_for(&content, None), "two.txt");
    }

    #[test]
    fn test_stored_image_becomes_image_ref() {
        let content =
            classify_with(RawPayload::StoredImage(PathBuf::from("/img/a.png")), never).unwrap();
        assert_eq!(content.kind(), ItemKind::Image);
        assert_eq!(content.as_str(), "/img/a.png");
    }

    #[test]
    fn test_text_preview_truncates_to_100_chars() {
        let long = "a".repeat(150);
        let preview = preview_for(&ItemContent::Text(long), None);
        assert_eq!(preview.chars().count(), PREVIEW_CHAR_LIMIT);
    }

    #[test]
    fn test_text_preview_counts_characters_not_bytes() {
        let long = "é".repeat(120);
        let preview = preview_for(&ItemContent::Text(long), None);
        assert_eq!(preview.chars().count(), 100);
        assert_eq!(preview, "é".repeat(100));
    }

    #[test]
    fn test_image_preview_mentions_source() {
        let content = ItemContent::ImageRef(PathBuf::from("/img/a.png"));
        assert_eq!(preview_for(&content, Some("Safari")), "Image copied from Safari");
        assert_eq!(preview_for(&content, None), "Image copied from Unknown");
    }

    #[test]
    fn test_url_preview_is_url() {
        let content = ItemContent::Url("https://example.com/a".into());
        assert_eq!(preview_for(&content, None), "https://example.com/a");
    }

    #[test]
    fn test_file_preview_trailing_slash_falls_back() {
        let content = ItemContent::FilePaths("/a/b/".into());
        assert_eq!(preview_for(&content, None), "File");
    }

    #[test]
    fn test_file_preview_uses_platform_separator() {
        let path = format!("{0}Users{0}me{0}report.pdf", MAIN_SEPARATOR);
        let content = ItemContent::FilePaths(path);
        assert_eq!(preview_for(&content, None), "report.pdf");
    }

    #[cfg(windows)]
    #[test]
    fn test_file_preview_handles_backslashes() {
        let content = ItemContent::FilePaths(r"C:\Users\me\report.pdf".into());
        assert_eq!(preview_for(&content, None), "report.pdf");
    }
}
