use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::BlobUrl;

/// Content-addressed artifact storage. Filenames are UUID-generated so
/// writes are append-only and collision-free; URLs are opaque to callers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn save(
        &self,
        data: Bytes,
        subfolder: &str,
        extension: &str,
    ) -> Result<BlobUrl, BlobStoreError>;

    /// Downloads a remote resource and persists it. Provider result URLs are
    /// not assumed durable, so artifacts are always re-homed here.
    async fn save_from_url(&self, url: &str, subfolder: &str) -> Result<BlobUrl, BlobStoreError>;

    async fn read(&self, url: &BlobUrl) -> Result<Bytes, BlobStoreError>;

    /// Returns whether anything was deleted. Callers treat stale-artifact
    /// deletion as advisory cleanup and may swallow errors.
    async fn delete(&self, url: &BlobUrl) -> Result<bool, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("save failed: {0}")]
    SaveFailed(String),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
