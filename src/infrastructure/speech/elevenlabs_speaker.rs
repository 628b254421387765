use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use crate::application::ports::{DialogueInput, Speaker, SpeakerError};

/// Speech, sound-effect, and music synthesis via the ElevenLabs API.
pub struct ElevenLabsSpeaker {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model_id: String,
}

impl ElevenLabsSpeaker {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        base_url: String,
        model_id: String,
    ) -> Result<Self, SpeakerError> {
        if api_key.trim().is_empty() {
            return Err(SpeakerError::MissingApiKey);
        }
        Ok(Self {
            http,
            api_key,
            base_url,
            model_id,
        })
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, SpeakerError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeakerError::ApiRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeakerError::ApiRequestFailed(format!(
                "{}: {}",
                status, body
            )));
        }
        Ok(response)
    }

    async fn audio_bytes(&self, response: reqwest::Response) -> Result<Bytes, SpeakerError> {
        response
            .bytes()
            .await
            .map_err(|e| SpeakerError::InvalidResponse(e.to_string()))
    }
}

#[derive(Deserialize)]
struct DialogueResponse {
    audio_base64: String,
    #[serde(default)]
    alignment: serde_json::Value,
}

#[async_trait]
impl Speaker for ElevenLabsSpeaker {
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    async fn render_dialogue(
        &self,
        lines: &[DialogueInput],
    ) -> Result<(Bytes, serde_json::Value), SpeakerError> {
        let inputs: Vec<serde_json::Value> = lines
            .iter()
            .map(|line| {
                json!({
                    "text": line.text,
                    "voice_id": line.voice_id.as_str(),
                })
            })
            .collect();

        let response = self
            .post_json(
                "/v1/text-to-dialogue",
                json!({
                    "inputs": inputs,
                    "model_id": self.model_id,
                }),
            )
            .await?;

        let body: DialogueResponse = response
            .json()
            .await
            .map_err(|e| SpeakerError::InvalidResponse(e.to_string()))?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(&body.audio_base64)
            .map_err(|e| SpeakerError::InvalidResponse(format!("bad audio payload: {}", e)))?;

        Ok((Bytes::from(audio), body.alignment))
    }

    #[tracing::instrument(skip(self, prompt))]
    async fn render_sound_effect(
        &self,
        prompt: &str,
        duration_seconds: f64,
        prompt_influence: f64,
    ) -> Result<Bytes, SpeakerError> {
        let response = self
            .post_json(
                "/v1/sound-generation",
                json!({
                    "text": prompt,
                    "duration_seconds": duration_seconds,
                    "prompt_influence": prompt_influence,
                }),
            )
            .await?;
        self.audio_bytes(response).await
    }

    #[tracing::instrument(skip(self, prompt))]
    async fn plan_music(
        &self,
        prompt: &str,
        duration_ms: u64,
    ) -> Result<serde_json::Value, SpeakerError> {
        let response = self
            .post_json(
                "/v1/music/plan",
                json!({
                    "prompt": prompt,
                    "music_length_ms": duration_ms,
                }),
            )
            .await?;

        response
            .json()
            .await
            .map_err(|e| SpeakerError::InvalidResponse(e.to_string()))
    }

    #[tracing::instrument(skip(self, composition_plan))]
    async fn render_music(
        &self,
        composition_plan: &serde_json::Value,
        force_instrumental: bool,
    ) -> Result<Bytes, SpeakerError> {
        let response = self
            .post_json(
                "/v1/music",
                json!({
                    "composition_plan": composition_plan,
                    "force_instrumental": force_instrumental,
                }),
            )
            .await?;
        self.audio_bytes(response).await
    }
}
