mod elevenlabs_speaker;
mod mock_speaker;

pub use elevenlabs_speaker::ElevenLabsSpeaker;
pub use mock_speaker::MockSpeaker;
