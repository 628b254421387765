use chrono::{DateTime, Utc};

use super::{
    BlobUrl, CoverArt, EpisodeId, EpisodeStatus, FinalAudio, MusicTrack, ProjectId, Script,
    SoundEffect, VoiceAudio,
};

/// Per-episode generation options, fixed at creation (inherited from the
/// project's defaults unless overridden) and read by every downstream stage
/// to decide whether optional stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    pub include_sound_effects: bool,
    pub include_background_music: bool,
}

/// The unit of work the pipeline operates on. Mutated in place by each
/// stage; artifacts accumulate monotonically until `Done`, or the record is
/// frozen at the failing stage with `Error` plus a message.
#[derive(Debug, Clone)]
pub struct Episode {
    pub id: EpisodeId,
    pub project_id: ProjectId,
    pub episode_number: i32,
    pub title: String,
    pub title_auto_generated: bool,
    pub show_episode_number: bool,
    pub description: String,
    pub target_duration_minutes: i32,
    pub options: GenerationOptions,
    pub status: EpisodeStatus,
    pub error_message: Option<String>,
    pub script: Option<Script>,
    pub script_text: Option<String>,
    pub summary: Option<String>,
    pub voice_audio: Option<VoiceAudio>,
    pub sounds: Option<Vec<SoundEffect>>,
    pub music: Option<MusicTrack>,
    pub final_audio: Option<FinalAudio>,
    pub cover: Option<CoverArt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(
        project_id: ProjectId,
        episode_number: i32,
        title: String,
        description: String,
        target_duration_minutes: i32,
        options: GenerationOptions,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EpisodeId::new(),
            project_id,
            episode_number,
            title,
            title_auto_generated: true,
            show_episode_number: true,
            description,
            target_duration_minutes,
            options,
            status: EpisodeStatus::Draft,
            error_message: None,
            script: None,
            script_text: None,
            summary: None,
            voice_audio: None,
            sounds: None,
            music: None,
            final_audio: None,
            cover: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_script(&self) -> bool {
        self.script
            .as_ref()
            .map(|s| !s.lines.is_empty())
            .unwrap_or(false)
    }

    /// Every blob the episode owns, for cleanup on deletion.
    pub fn owned_blobs(&self) -> Vec<BlobUrl> {
        let mut urls = Vec::new();
        if let Some(voice) = &self.voice_audio {
            urls.push(voice.url.clone());
        }
        if let Some(sounds) = &self.sounds {
            urls.extend(sounds.iter().map(|s| s.url.clone()));
        }
        if let Some(music) = &self.music {
            urls.push(music.url.clone());
        }
        if let Some(final_audio) = &self.final_audio {
            urls.push(final_audio.url.clone());
        }
        if let Some(cover) = &self.cover {
            urls.extend(cover.variants.iter().map(|v| v.url.clone()));
        }
        urls
    }
}
