use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

use crate::application::ports::{DialogueInput, Speaker, SpeakerError};

/// Provider stub for tests. Returns marker byte payloads and counts calls
/// per operation so tests can assert which stages actually ran.
#[derive(Default)]
pub struct MockSpeaker {
    fail: bool,
    pub dialogue_calls: Mutex<usize>,
    pub sound_effect_calls: Mutex<usize>,
    pub music_calls: Mutex<usize>,
}

impl MockSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Speaker for MockSpeaker {
    async fn render_dialogue(
        &self,
        lines: &[DialogueInput],
    ) -> Result<(Bytes, serde_json::Value), SpeakerError> {
        if self.fail {
            return Err(SpeakerError::ApiRequestFailed("stub failure".to_string()));
        }
        *self.dialogue_calls.lock().unwrap() += 1;
        let alignment = json!({"characters": lines.iter().map(|l| l.text.len()).sum::<usize>()});
        Ok((Bytes::from_static(b"dialogue-audio"), alignment))
    }

    async fn render_sound_effect(
        &self,
        _prompt: &str,
        _duration_seconds: f64,
        _prompt_influence: f64,
    ) -> Result<Bytes, SpeakerError> {
        if self.fail {
            return Err(SpeakerError::ApiRequestFailed("stub failure".to_string()));
        }
        *self.sound_effect_calls.lock().unwrap() += 1;
        Ok(Bytes::from_static(b"sound-effect-audio"))
    }

    async fn plan_music(
        &self,
        prompt: &str,
        duration_ms: u64,
    ) -> Result<serde_json::Value, SpeakerError> {
        if self.fail {
            return Err(SpeakerError::ApiRequestFailed("stub failure".to_string()));
        }
        Ok(json!({"prompt": prompt, "music_length_ms": duration_ms}))
    }

    async fn render_music(
        &self,
        _composition_plan: &serde_json::Value,
        _force_instrumental: bool,
    ) -> Result<Bytes, SpeakerError> {
        if self.fail {
            return Err(SpeakerError::ApiRequestFailed("stub failure".to_string()));
        }
        *self.music_calls.lock().unwrap() += 1;
        Ok(Bytes::from_static(b"music-audio"))
    }
}
