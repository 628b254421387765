use super::{ProjectId, VoiceId};

/// Container of episodes and its character roster. Owns the default
/// generation options inherited by new episodes.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub genre_tone: String,
    pub musical_atmosphere: Option<String>,
    pub default_include_sound_effects: bool,
    pub default_include_background_music: bool,
}

/// Binds a provider voice to a named role within a project. Referenced by
/// script lines through the voice id.
#[derive(Debug, Clone)]
pub struct ProjectCharacter {
    pub role: String,
    pub character_name: String,
    pub voice_id: VoiceId,
    pub voice_name: String,
    pub sort_order: i32,
}
