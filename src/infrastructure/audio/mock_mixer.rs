use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::application::ports::{AudioMixer, AudioMixerError, BlobStore, MixTrack};
use crate::domain::BlobUrl;

/// Mixer stub for tests: concatenation joins bytes directly, mixing writes a
/// marker blob, and every duration is the configured constant.
pub struct MockAudioMixer {
    blob_store: Arc<dyn BlobStore>,
    fixed_duration: f64,
}

impl MockAudioMixer {
    pub fn new(blob_store: Arc<dyn BlobStore>, fixed_duration: f64) -> Self {
        Self {
            blob_store,
            fixed_duration,
        }
    }
}

#[async_trait]
impl AudioMixer for MockAudioMixer {
    async fn duration(&self, _url: &BlobUrl) -> Result<f64, AudioMixerError> {
        Ok(self.fixed_duration)
    }

    async fn concatenate(&self, parts: Vec<Bytes>) -> Result<BlobUrl, AudioMixerError> {
        let joined: Vec<u8> = parts.iter().flat_map(|p| p.to_vec()).collect();
        self.blob_store
            .save(Bytes::from(joined), "audio", "mp3")
            .await
            .map_err(|e| AudioMixerError::BlobAccess(e.to_string()))
    }

    async fn mix(
        &self,
        _primary: &BlobUrl,
        _primary_volume: f64,
        tracks: &[MixTrack],
    ) -> Result<(BlobUrl, f64), AudioMixerError> {
        let marker = format!("mixed:{}", tracks.len());
        let url = self
            .blob_store
            .save(Bytes::from(marker), "audio", "mp3")
            .await
            .map_err(|e| AudioMixerError::BlobAccess(e.to_string()))?;
        Ok((url, self.fixed_duration))
    }
}
