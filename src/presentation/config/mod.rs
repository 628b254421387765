mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, ImageSettings, PipelineSettings, ServerSettings, Settings, SpeechSettings,
    StorageSettings, WriterSettings,
};
