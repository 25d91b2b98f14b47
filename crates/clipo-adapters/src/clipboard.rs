//! System clipboard adapter backed by `arboard` and `clipboard-rs`
//!
//! On macOS the change counter is NSPasteboard's `changeCount` and the
//! source application is the frontmost application. Elsewhere no counter is
//! exposed, so one is synthesized: every sample fingerprints the current
//! text, image or file list and bumps the counter when the fingerprint
//! differs from the previous sample. Copying identical content twice in a
//! row is then not observed as a change, and the source application is
//! reported as unknown.
//!
//! Images cross the port as PNG. `arboard` speaks raw RGBA, so reads are
//! encoded and writes decoded with the `png` crate. File lists are read
//! with `clipboard-rs`, which reports them as `file://` URIs.

use async_trait::async_trait;
use clipo_core::ports::clipboard::{ClipboardError, ClipboardPort, ImageFormat, ImagePayload};
use clipboard_rs::{Clipboard as _, ClipboardContext, ContentFormat};
use percent_encoding::percent_decode_str;
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Cursor};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct ChangeTracker {
    last_fingerprint: Option<u64>,
    count: i64,
}

impl ChangeTracker {
    fn observe(&mut self, fingerprint: u64) -> i64 {
        if self.last_fingerprint != Some(fingerprint) {
            self.last_fingerprint = Some(fingerprint);
            self.count += 1;
        }
        self.count
    }
}

/// Clipboard port over the platform clipboard
///
/// A fresh `arboard::Clipboard` is opened for each call on the blocking pool.
#[derive(Default)]
pub struct SystemClipboard {
    tracker: Arc<Mutex<ChangeTracker>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_clipboard<T, F>(f: F) -> Result<T, ClipboardError>
    where
        T: Send + 'static,
        F: FnOnce(&mut arboard::Clipboard) -> Result<T, ClipboardError> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            f(&mut clipboard)
        })
        .await
        .map_err(|e| ClipboardError::Unavailable(format!("clipboard task failed: {}", e)))?
    }

    async fn with_file_context<T, F>(f: F) -> Result<T, ClipboardError>
    where
        T: Send + 'static,
        F: FnOnce(&ClipboardContext) -> Result<T, ClipboardError> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let ctx =
                ClipboardContext::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            f(&ctx)
        })
        .await
        .map_err(|e| ClipboardError::Unavailable(format!("clipboard task failed: {}", e)))?
    }

    async fn synthesized_change_count(&self) -> Result<i64, ClipboardError> {
        let mut fingerprint = Self::with_clipboard(current_fingerprint).await?;
        if fingerprint == 0 {
            if let Some(paths) = self.read_file_urls().await? {
                fingerprint = files_fingerprint(&paths);
            }
        }

        let mut tracker = self
            .tracker
            .lock()
            .map_err(|_| ClipboardError::Unavailable("change tracker poisoned".to_string()))?;
        Ok(tracker.observe(fingerprint))
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use objc2_app_kit::{NSPasteboard, NSWorkspace};

    pub fn change_count() -> Option<i64> {
        let pasteboard = NSPasteboard::generalPasteboard();
        Some(pasteboard.changeCount() as i64)
    }

    pub fn frontmost_application() -> Option<String> {
        let workspace = NSWorkspace::sharedWorkspace();
        let app = workspace.frontmostApplication()?;
        app.localizedName().map(|name| name.to_string())
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    pub fn change_count() -> Option<i64> {
        None
    }

    pub fn frontmost_application() -> Option<String> {
        None
    }
}

/// Maps "nothing of this kind on the clipboard" to `Ok(None)`
fn absent_as_none<T>(result: Result<T, arboard::Error>) -> Result<Option<T>, ClipboardError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(arboard::Error::ContentNotAvailable) => Ok(None),
        Err(e) => Err(ClipboardError::ReadFailed(e.to_string())),
    }
}

fn text_fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    "text".hash(&mut hasher);
    text.hash(&mut hasher);
    hasher.finish()
}

fn image_fingerprint(width: usize, height: usize, bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    "image".hash(&mut hasher);
    width.hash(&mut hasher);
    height.hash(&mut hasher);
    bytes.hash(&mut hasher);
    hasher.finish()
}

fn files_fingerprint(paths: &[PathBuf]) -> u64 {
    let mut hasher = DefaultHasher::new();
    "files".hash(&mut hasher);
    paths.hash(&mut hasher);
    hasher.finish()
}

/// Converts a `file://` URI (or a bare path) from the file list to a path
fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let uri = uri.trim();
    if uri.is_empty() {
        return None;
    }
    let Some(rest) = uri.strip_prefix("file://") else {
        return Some(PathBuf::from(uri));
    };

    // skip an authority such as `localhost`
    let path = &rest[rest.find('/')?..];
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    #[cfg(windows)]
    let decoded = match decoded.strip_prefix('/') {
        Some(drive) if drive.as_bytes().get(1) == Some(&b':') => drive.to_string().into(),
        _ => decoded,
    };

    Some(PathBuf::from(decoded.into_owned()))
}

fn current_fingerprint(clipboard: &mut arboard::Clipboard) -> Result<u64, ClipboardError> {
    if let Some(text) = absent_as_none(clipboard.get_text())? {
        if !text.is_empty() {
            return Ok(text_fingerprint(&text));
        }
    }
    if let Some(image) = absent_as_none(clipboard.get_image())? {
        return Ok(image_fingerprint(image.width, image.height, &image.bytes));
    }
    Ok(0)
}

/// Encodes 8-bit RGBA pixels as PNG
pub fn encode_rgba_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ClipboardError> {
    let mut png_data = Vec::new();
    {
        let mut encoder = Encoder::new(BufWriter::new(&mut png_data), width, height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| ClipboardError::ReadFailed(format!("PNG header error: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| ClipboardError::ReadFailed(format!("PNG encoding error: {}", e)))?;
    }
    Ok(png_data)
}

/// Decodes a PNG into 8-bit RGBA pixels plus dimensions
pub fn decode_png_rgba(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32), ClipboardError> {
    let invalid = |e: png::DecodingError| ClipboardError::WriteFailed(format!("PNG decoding error: {}", e));

    let mut decoder = Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(invalid)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(invalid)?;
    buf.truncate(info.buffer_size());

    let rgba = match info.color_type {
        ColorType::Rgba => buf,
        ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
            .collect(),
        ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, u8::MAX]).collect(),
        ColorType::Indexed => {
            return Err(ClipboardError::UnsupportedFormat(
                "indexed PNG after expansion".to_string(),
            ))
        }
    };
    Ok((rgba, info.width, info.height))
}

#[async_trait]
impl ClipboardPort for SystemClipboard {
    async fn change_count(&self) -> Result<i64, ClipboardError> {
        match platform::change_count() {
            Some(count) => Ok(count),
            None => self.synthesized_change_count().await,
        }
    }

    async fn read_text(&self) -> Result<Option<String>, ClipboardError> {
        Self::with_clipboard(|clipboard| absent_as_none(clipboard.get_text())).await
    }

    async fn read_image(&self) -> Result<Option<ImagePayload>, ClipboardError> {
        Self::with_clipboard(|clipboard| {
            let Some(image) = absent_as_none(clipboard.get_image())? else {
                return Ok(None);
            };
            let png = encode_rgba_png(&image.bytes, image.width as u32, image.height as u32)?;
            Ok(Some(ImagePayload::new(png, ImageFormat::Png)))
        })
        .await
    }

    async fn read_file_urls(&self) -> Result<Option<Vec<PathBuf>>, ClipboardError> {
        Self::with_file_context(|ctx| {
            if !ctx.has(ContentFormat::Files) {
                return Ok(None);
            }
            let uris = ctx
                .get_files()
                .map_err(|e| ClipboardError::ReadFailed(e.to_string()))?;
            let paths: Vec<PathBuf> = uris.iter().filter_map(|uri| file_uri_to_path(uri)).collect();
            Ok((!paths.is_empty()).then_some(paths))
        })
        .await
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_string();
        Self::with_clipboard(move |clipboard| {
            clipboard
                .set_text(text)
                .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
        })
        .await
    }

    async fn write_image(&self, image: &ImagePayload) -> Result<(), ClipboardError> {
        if image.format != ImageFormat::Png {
            return Err(ClipboardError::UnsupportedFormat(
                image.format.extension().to_string(),
            ));
        }

        let (rgba, width, height) = decode_png_rgba(&image.bytes)?;
        Self::with_clipboard(move |clipboard| {
            clipboard
                .set_image(arboard::ImageData {
                    width: width as usize,
                    height: height as usize,
                    bytes: Cow::Owned(rgba),
                })
                .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
        })
        .await
    }

    async fn frontmost_application(&self) -> Option<String> {
        platform::frontmost_application()
    }
}
