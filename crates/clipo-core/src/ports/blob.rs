//! Blob store port definition
//!
//! Image payloads never live inside the history itself. They are written to
//! an application-owned directory and items reference them by path.

use crate::ports::clipboard::ImagePayload;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during blob operations
#[derive(Debug, Error)]
pub enum BlobError {
    /// Writing the blob failed
    #[error("Failed to write blob {}: {}", .0.display(), .1)]
    WriteFailed(PathBuf, String),

    /// The blob does not exist
    #[error("Blob not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The blob's format could not be determined
    #[error("Unknown blob format: {}", .0.display())]
    UnknownFormat(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Port for storing image blobs outside the history
#[async_trait]
pub trait BlobStorePort: Send + Sync {
    /// Persists an image under a fresh unique name and returns its path
    async fn write_image(&self, image: &ImagePayload) -> Result<PathBuf, BlobError>;

    /// Reads a previously written image back
    async fn read_image(&self, path: &Path) -> Result<ImagePayload, BlobError>;

    /// Removes a blob; returns `false` if it was already gone
    async fn remove(&self, path: &Path) -> Result<bool, BlobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_error_display() {
        let err = BlobError::WriteFailed(PathBuf::from("/tmp/x.png"), "disk full".to_string());
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x.png"));
        assert!(msg.contains("disk full"));

        let err = BlobError::NotFound(PathBuf::from("/tmp/missing.png"));
        assert!(err.to_string().contains("missing.png"));
    }
}
