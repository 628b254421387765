use std::sync::Arc;

use crate::application::ports::{ImageGenerator, ScriptWriter, Speaker};
use crate::application::services::{EpisodeService, PipelineService};

pub struct AppState<W, S, G>
where
    W: ScriptWriter,
    S: Speaker,
    G: ImageGenerator,
{
    pub pipeline_service: Arc<PipelineService<W, S, G>>,
    pub episode_service: Arc<EpisodeService>,
}

impl<W, S, G> Clone for AppState<W, S, G>
where
    W: ScriptWriter,
    S: Speaker,
    G: ImageGenerator,
{
    fn clone(&self) -> Self {
        Self {
            pipeline_service: Arc::clone(&self.pipeline_service),
            episode_service: Arc::clone(&self.episode_service),
        }
    }
}
