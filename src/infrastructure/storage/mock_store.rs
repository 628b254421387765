use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::application::ports::{BlobStore, BlobStoreError};
use crate::domain::BlobUrl;

/// In-memory store for tests. Records every delete so assertions can check
/// stale-artifact cleanup happened.
#[derive(Default)]
pub struct MockBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    deleted: Mutex<Vec<String>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &BlobUrl) -> bool {
        self.blobs.lock().unwrap().contains_key(url.as_str())
    }

    pub fn deleted_urls(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn save(
        &self,
        data: Bytes,
        subfolder: &str,
        extension: &str,
    ) -> Result<BlobUrl, BlobStoreError> {
        let name = format!("{}/{}.{}", subfolder, Uuid::new_v4(), extension);
        self.blobs.lock().unwrap().insert(name.clone(), data);
        Ok(BlobUrl::from_raw(name))
    }

    async fn save_from_url(&self, url: &str, subfolder: &str) -> Result<BlobUrl, BlobStoreError> {
        self.save(Bytes::from(url.to_string()), subfolder, "png")
            .await
    }

    async fn read(&self, url: &BlobUrl) -> Result<Bytes, BlobStoreError> {
        self.blobs
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(url.as_str().to_string()))
    }

    async fn delete(&self, url: &BlobUrl) -> Result<bool, BlobStoreError> {
        self.deleted
            .lock()
            .unwrap()
            .push(url.as_str().to_string());
        Ok(self.blobs.lock().unwrap().remove(url.as_str()).is_some())
    }
}
