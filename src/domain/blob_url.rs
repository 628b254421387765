use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque URL issued by the blob store. Only the store implementation may
/// interpret its contents; everything else treats it as an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn from_raw(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
