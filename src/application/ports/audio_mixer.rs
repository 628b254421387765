use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::BlobUrl;

/// One secondary track in a mix: delayed by `start_offset_seconds` of
/// silence from the start of the primary, scaled by `volume`.
#[derive(Debug, Clone)]
pub struct MixTrack {
    pub url: BlobUrl,
    pub volume: f64,
    pub start_offset_seconds: f64,
}

/// Deterministic local audio processing. The mix output is always bounded to
/// the primary track's length: background elements never extend the episode
/// beyond the narrated audio.
#[async_trait]
pub trait AudioMixer: Send + Sync {
    /// Probes the container for its duration in seconds. Fails loudly when
    /// the blob is absent or unreadable.
    async fn duration(&self, url: &BlobUrl) -> Result<f64, AudioMixerError>;

    /// Joins ordered parts into one stream with a lossless copy (no
    /// re-encode), preserving order exactly.
    async fn concatenate(&self, parts: Vec<Bytes>) -> Result<BlobUrl, AudioMixerError>;

    /// Mixes the primary track against zero or more secondary tracks and
    /// returns the output blob with its duration.
    async fn mix(
        &self,
        primary: &BlobUrl,
        primary_volume: f64,
        tracks: &[MixTrack],
    ) -> Result<(BlobUrl, f64), AudioMixerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AudioMixerError {
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),
    #[error("ffmpeg failed: {0}")]
    ProcessFailed(String),
    #[error("blob access failed: {0}")]
    BlobAccess(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
