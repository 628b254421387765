use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{ScriptContext, ScriptWriter, ScriptWriterError};
use crate::domain::{Script, ScriptLine, VoiceId};

/// Deterministic writer for tests. Produces a small fixed script (with one
/// sound cue when effects are enabled) and records received contexts.
pub struct MockScriptWriter {
    fail: bool,
    contexts: Mutex<Vec<ScriptContext>>,
}

impl MockScriptWriter {
    pub fn new() -> Self {
        Self {
            fail: false,
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn received_contexts(&self) -> Vec<ScriptContext> {
        self.contexts.lock().unwrap().clone()
    }
}

impl Default for MockScriptWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptWriter for MockScriptWriter {
    async fn generate_script(&self, context: &ScriptContext) -> Result<Script, ScriptWriterError> {
        if self.fail {
            return Err(ScriptWriterError::MalformedResponse(
                "stub failure".to_string(),
            ));
        }
        self.contexts.lock().unwrap().push(context.clone());

        let voice = context
            .characters
            .first()
            .map(|c| c.voice_id.clone())
            .unwrap_or_else(|| VoiceId::new("v-default"));

        Ok(Script {
            title: format!("Generated Episode {}", context.episode_number),
            genre_tone: context.genre_tone.clone(),
            approx_duration_minutes: context.target_duration_minutes.max(1) as u32,
            lines: vec![
                ScriptLine {
                    speaker: "Narrator".to_string(),
                    voice_id: Some(voice.clone()),
                    text: "The night swallowed the road behind them.".to_string(),
                    sound_effect: context
                        .include_sound_effects
                        .then(|| "distant thunder".to_string()),
                },
                ScriptLine {
                    speaker: "Narrator".to_string(),
                    voice_id: Some(voice),
                    text: "Nobody spoke until the lights of the town appeared.".to_string(),
                    sound_effect: None,
                },
            ],
        })
    }

    async fn summarize(&self, _script_text: &str) -> Result<String, ScriptWriterError> {
        if self.fail {
            return Err(ScriptWriterError::ApiRequestFailed(
                "stub failure".to_string(),
            ));
        }
        Ok("They drove through the night and reached the town.".to_string())
    }
}
