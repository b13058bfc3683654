//! Image acquisition

use crate::error::AcquisitionError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use wayfinder_core::ImageSample;

/// Produces one encoded frame per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Camera: Send + Sync {
    async fn capture_image(&self) -> Result<ImageSample, AcquisitionError>;
}

/// Camera backed by a directory of JPEG files
///
/// Each capture returns the next file in name order, wrapping around at
/// the end. The directory is listed on every call so frames can be
/// dropped in while the scheduler runs.
pub struct DirectoryCamera {
    dir: PathBuf,
    cursor: AtomicUsize,
}

impl DirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn frames(&self) -> Result<Vec<PathBuf>, AcquisitionError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut frames = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_jpeg = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
                .unwrap_or(false);
            if is_jpeg && entry.file_type().await?.is_file() {
                frames.push(path);
            }
        }

        frames.sort();
        Ok(frames)
    }
}

#[async_trait]
impl Camera for DirectoryCamera {
    async fn capture_image(&self) -> Result<ImageSample, AcquisitionError> {
        let frames = self.frames().await?;
        if frames.is_empty() {
            return Err(AcquisitionError::NoImages(self.dir.clone()));
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % frames.len();
        let path = &frames[index];
        let bytes = tokio::fs::read(path).await?;
        if bytes.is_empty() {
            return Err(AcquisitionError::Device(format!("{} is empty", path.display())));
        }

        debug!("Captured {} ({} bytes)", path.display(), bytes.len());
        Ok(ImageSample::new(bytes))
    }
}
