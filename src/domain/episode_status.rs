use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pipeline position of an episode. Transitions are monotonic along the
/// stage order except for `Error`, which is reachable from every
/// non-terminal state and re-entered into the same stage on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Draft,
    ScriptGenerating,
    ScriptDone,
    VoiceoverGenerating,
    VoiceoverDone,
    SoundsGenerating,
    SoundsDone,
    MusicGenerating,
    MusicDone,
    Merging,
    AudioDone,
    CoverGenerating,
    Done,
    Error,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Draft => "draft",
            EpisodeStatus::ScriptGenerating => "script_generating",
            EpisodeStatus::ScriptDone => "script_done",
            EpisodeStatus::VoiceoverGenerating => "voiceover_generating",
            EpisodeStatus::VoiceoverDone => "voiceover_done",
            EpisodeStatus::SoundsGenerating => "sounds_generating",
            EpisodeStatus::SoundsDone => "sounds_done",
            EpisodeStatus::MusicGenerating => "music_generating",
            EpisodeStatus::MusicDone => "music_done",
            EpisodeStatus::Merging => "merging",
            EpisodeStatus::AudioDone => "audio_done",
            EpisodeStatus::CoverGenerating => "cover_generating",
            EpisodeStatus::Done => "done",
            EpisodeStatus::Error => "error",
        }
    }

    /// A stage is currently running. A second pipeline invocation observing
    /// this must refuse to proceed instead of racing the first.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            EpisodeStatus::ScriptGenerating
                | EpisodeStatus::VoiceoverGenerating
                | EpisodeStatus::SoundsGenerating
                | EpisodeStatus::MusicGenerating
                | EpisodeStatus::Merging
                | EpisodeStatus::CoverGenerating
        )
    }
}

impl FromStr for EpisodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EpisodeStatus::Draft),
            "script_generating" => Ok(EpisodeStatus::ScriptGenerating),
            "script_done" => Ok(EpisodeStatus::ScriptDone),
            "voiceover_generating" => Ok(EpisodeStatus::VoiceoverGenerating),
            "voiceover_done" => Ok(EpisodeStatus::VoiceoverDone),
            "sounds_generating" => Ok(EpisodeStatus::SoundsGenerating),
            "sounds_done" => Ok(EpisodeStatus::SoundsDone),
            "music_generating" => Ok(EpisodeStatus::MusicGenerating),
            "music_done" => Ok(EpisodeStatus::MusicDone),
            "merging" => Ok(EpisodeStatus::Merging),
            "audio_done" => Ok(EpisodeStatus::AudioDone),
            "cover_generating" => Ok(EpisodeStatus::CoverGenerating),
            "done" => Ok(EpisodeStatus::Done),
            "error" => Ok(EpisodeStatus::Error),
            _ => Err(format!("Invalid episode status: {}", s)),
        }
    }
}

impl fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
