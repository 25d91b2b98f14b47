//! Filesystem blob store for image payloads

use async_trait::async_trait;
use clipo_core::ports::blob::{BlobError, BlobStorePort};
use clipo_core::ports::clipboard::{ImageFormat, ImagePayload};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Stores images as `<images_dir>/<uuid>.<ext>`
///
/// Writes go to a hidden temp file first and are renamed into place, so a
/// reader never observes a partially written blob.
pub struct FsBlobStore {
    images_dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(images_dir: PathBuf) -> Self {
        Self { images_dir }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}

#[async_trait]
impl BlobStorePort for FsBlobStore {
    async fn write_image(&self, image: &ImagePayload) -> Result<PathBuf, BlobError> {
        let name = format!("{}.{}", Uuid::new_v4(), image.format.extension());
        let final_path = self.images_dir.join(&name);
        let temp_path = self.images_dir.join(format!(".{}.tmp", name));

        let write_failed = |e: std::io::Error| BlobError::WriteFailed(final_path.clone(), e.to_string());

        fs::create_dir_all(&self.images_dir)
            .await
            .map_err(write_failed)?;
        fs::write(&temp_path, &image.bytes)
            .await
            .map_err(write_failed)?;
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(write_failed(e));
        }

        tracing::debug!(
            "Stored {} byte image at {:?}",
            image.bytes.len(),
            final_path
        );
        Ok(final_path)
    }

    async fn read_image(&self, path: &Path) -> Result<ImagePayload, BlobError> {
        let format =
            ImageFormat::from_path(path).ok_or_else(|| BlobError::UnknownFormat(path.to_path_buf()))?;

        match fs::read(path).await {
            Ok(bytes) => Ok(ImagePayload::new(bytes, format)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound(path.to_path_buf())),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, path: &Path) -> Result<bool, BlobError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
