mod artifacts;
mod blob_url;
mod episode;
mod episode_id;
mod episode_status;
mod project;
mod project_id;
mod script;
mod voice_id;

pub use artifacts::{CoverArt, CoverVariant, FinalAudio, MusicTrack, SoundEffect, VoiceAudio};
pub use blob_url::BlobUrl;
pub use episode::{Episode, GenerationOptions};
pub use episode_id::EpisodeId;
pub use episode_status::EpisodeStatus;
pub use project::{Project, ProjectCharacter};
pub use project_id::ProjectId;
pub use script::{Script, ScriptLine};
pub use voice_id::VoiceId;
