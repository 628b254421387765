use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{BlobStore, BlobStoreError};

use super::local_store::LocalBlobStore;
use super::mock_store::MockBlobStore;

/// Selects the blob store backend by name. `local` is the production
/// default; `memory` exists for tests and ephemeral runs.
pub fn create_blob_store(
    backend: &str,
    base_path: PathBuf,
    http: reqwest::Client,
) -> Result<Arc<dyn BlobStore>, BlobStoreError> {
    match backend {
        "memory" => Ok(Arc::new(MockBlobStore::new())),
        _ => Ok(Arc::new(LocalBlobStore::new(base_path, http)?)),
    }
}
