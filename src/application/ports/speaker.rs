use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::VoiceId;

/// One spoken line handed to the TTS provider.
#[derive(Debug, Clone)]
pub struct DialogueInput {
    pub voice_id: VoiceId,
    pub text: String,
}

/// Text-to-speech plus sound-effect and music synthesis. A single provider
/// covers all three in production; the contract keeps them together because
/// they share authentication and failure modes.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Renders one dialogue part. Returns the audio bytes and the provider's
    /// raw alignment payload for that part.
    async fn render_dialogue(
        &self,
        lines: &[DialogueInput],
    ) -> Result<(Bytes, serde_json::Value), SpeakerError>;

    async fn render_sound_effect(
        &self,
        prompt: &str,
        duration_seconds: f64,
        prompt_influence: f64,
    ) -> Result<Bytes, SpeakerError>;

    /// Produces a composition plan consumed by `render_music`.
    async fn plan_music(
        &self,
        prompt: &str,
        duration_ms: u64,
    ) -> Result<serde_json::Value, SpeakerError>;

    async fn render_music(
        &self,
        composition_plan: &serde_json::Value,
        force_instrumental: bool,
    ) -> Result<Bytes, SpeakerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SpeakerError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("missing api key")]
    MissingApiKey,
}
