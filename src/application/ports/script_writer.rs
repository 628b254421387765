use async_trait::async_trait;

use crate::domain::{Script, VoiceId};

/// Everything the writer needs to produce one episode's script. Assembled by
/// the continuation planner; for episode 1 the continuation fields are empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptContext {
    pub project_title: String,
    pub project_description: String,
    pub genre_tone: String,
    pub episode_number: i32,
    pub episode_description: String,
    pub target_duration_minutes: i32,
    pub characters: Vec<CharacterBrief>,
    pub include_sound_effects: bool,
    pub earlier_summaries: Vec<EpisodeSummary>,
    pub previous_script_text: Option<String>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CharacterBrief {
    pub role: String,
    pub character_name: String,
    pub voice_id: VoiceId,
    pub voice_name: String,
}

#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    pub episode_number: i32,
    pub title: String,
    pub summary: String,
}

#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// Generates a structured script. Implementations must validate the
    /// response shape (title, genre/tone, at least one line, speaker+text per
    /// line) and raise `MalformedResponse` instead of guess-filling required
    /// fields.
    async fn generate_script(&self, context: &ScriptContext) -> Result<Script, ScriptWriterError>;

    /// Condenses a full script text into a short recap for continuation
    /// context.
    async fn summarize(&self, script_text: &str) -> Result<String, ScriptWriterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptWriterError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("malformed script response: {0}")]
    MalformedResponse(String),
    #[error("missing api key for {0}")]
    MissingApiKey(String),
}
