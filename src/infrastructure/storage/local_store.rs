use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use uuid::Uuid;

use crate::application::ports::{BlobStore, BlobStoreError};
use crate::domain::BlobUrl;

/// Filesystem-backed blob store. Stored URLs are paths relative to the base
/// directory, like `audio/8f3c....mp3`; only this store interprets them.
pub struct LocalBlobStore {
    inner: Arc<LocalFileSystem>,
    http: reqwest::Client,
}

impl LocalBlobStore {
    pub fn new(base_path: PathBuf, http: reqwest::Client) -> Result<Self, BlobStoreError> {
        std::fs::create_dir_all(&base_path).map_err(BlobStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| BlobStoreError::SaveFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
            http,
        })
    }
}

/// Last path segment extension of a URL, ignoring query strings. Falls back
/// to `png` because download re-homing is only used for images today.
fn extension_from_url(url: &str) -> &str {
    url.split('?')
        .next()
        .and_then(|path| path.rsplit('/').next())
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
        .filter(|ext| ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("png")
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(
        &self,
        data: Bytes,
        subfolder: &str,
        extension: &str,
    ) -> Result<BlobUrl, BlobStoreError> {
        let name = format!("{}/{}.{}", subfolder, Uuid::new_v4(), extension);
        let store_path = StorePath::from(name.as_str());

        self.inner
            .put(&store_path, PutPayload::from(data))
            .await
            .map_err(|e| BlobStoreError::SaveFailed(e.to_string()))?;

        Ok(BlobUrl::from_raw(name))
    }

    async fn save_from_url(&self, url: &str, subfolder: &str) -> Result<BlobUrl, BlobStoreError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BlobStoreError::DownloadFailed(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let extension = extension_from_url(url).to_string();
        let data = response
            .bytes()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))?;

        self.save(data, subfolder, &extension).await
    }

    async fn read(&self, url: &BlobUrl) -> Result<Bytes, BlobStoreError> {
        let store_path = StorePath::from(url.as_str());
        let result = self
            .inner
            .get(&store_path)
            .await
            .map_err(|e| BlobStoreError::NotFound(e.to_string()))?;

        result
            .bytes()
            .await
            .map_err(|e| BlobStoreError::NotFound(e.to_string()))
    }

    async fn delete(&self, url: &BlobUrl) -> Result<bool, BlobStoreError> {
        let store_path = StorePath::from(url.as_str());
        match self.inner.delete(&store_path).await {
            Ok(()) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(BlobStoreError::DeleteFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_taken_from_the_url_path() {
        assert_eq!(extension_from_url("https://cdn.example/covers/a.jpg"), "jpg");
        assert_eq!(
            extension_from_url("https://cdn.example/a.webp?sig=abc.def"),
            "webp"
        );
    }

    #[test]
    fn extensionless_urls_fall_back_to_png() {
        assert_eq!(extension_from_url("https://cdn.example/render/12345"), "png");
    }
}
