//! Clipboard port definition

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Encoding of image bytes read from or written to the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// Tagged Image File Format
    Tiff,
}

impl ImageFormat {
    /// File extension used when the image is persisted as a blob
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Tiff => "tiff",
        }
    }

    /// Infers the format from a blob path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }
}

/// Encoded image data together with its format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`
    pub format: ImageFormat,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self { bytes, format }
    }
}

/// Errors that can occur while talking to the system clipboard
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The clipboard could not be opened
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    /// Reading a representation failed
    #[error("Failed to read clipboard: {0}")]
    ReadFailed(String),

    /// Writing to the clipboard failed
    #[error("Failed to write clipboard: {0}")]
    WriteFailed(String),

    /// The image format cannot be placed on the clipboard
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Port for the shared, externally mutated clipboard
///
/// Read methods return `Ok(None)` when the representation is simply not
/// present; errors are reserved for failures of the clipboard itself.
#[async_trait]
pub trait ClipboardPort: Send + Sync {
    /// Monotonically increasing counter bumped on every clipboard write
    async fn change_count(&self) -> Result<i64, ClipboardError>;

    /// Current string representation, if any
    async fn read_text(&self) -> Result<Option<String>, ClipboardError>;

    /// Current image representation, if any
    async fn read_image(&self) -> Result<Option<ImagePayload>, ClipboardError>;

    /// Current file URL list, if any
    async fn read_file_urls(&self) -> Result<Option<Vec<PathBuf>>, ClipboardError>;

    /// Replaces the clipboard contents with a string
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;

    /// Replaces the clipboard contents with an image
    async fn write_image(&self, image: &ImagePayload) -> Result<(), ClipboardError>;

    /// Name of the application that owns the clipboard contents, when known
    async fn frontmost_application(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_extension() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Tiff.extension(), "tiff");
    }

    #[test]
    fn test_image_format_from_path() {
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/a.PNG")),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_path(Path::new("/tmp/a.tif")),
            Some(ImageFormat::Tiff)
        );
        assert_eq!(ImageFormat::from_path(Path::new("/tmp/a.gif")), None);
        assert_eq!(ImageFormat::from_path(Path::new("/tmp/noext")), None);
    }

    #[test]
    fn test_clipboard_error_messages() {
        let err = ClipboardError::Unavailable("no display".to_string());
        assert!(err.to_string().contains("no display"));

        let err = ClipboardError::UnsupportedFormat("tiff".to_string());
        assert!(err.to_string().contains("tiff"));
    }
}
