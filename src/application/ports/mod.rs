mod audio_mixer;
mod blob_store;
mod episode_repository;
mod image_generator;
mod project_repository;
mod repository_error;
mod script_writer;
mod speaker;
mod timing_estimator;

pub use audio_mixer::{AudioMixer, AudioMixerError, MixTrack};
pub use blob_store::{BlobStore, BlobStoreError};
pub use episode_repository::EpisodeRepository;
pub use image_generator::{
    ImageGenerator, ImageGeneratorError, ImageRequest, ImageTaskId, ImageTaskStatus,
};
pub use project_repository::ProjectRepository;
pub use repository_error::RepositoryError;
pub use script_writer::{
    CharacterBrief, EpisodeSummary, ScriptContext, ScriptWriter, ScriptWriterError,
};
pub use speaker::{DialogueInput, Speaker, SpeakerError};
pub use timing_estimator::{CharsPerSecondEstimator, LineSpan, TimingEstimator};
