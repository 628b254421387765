mod ffmpeg_mixer;
mod mock_mixer;

pub use ffmpeg_mixer::FfmpegMixer;
pub use mock_mixer::MockAudioMixer;
