mod continuation_planner;
mod cover_workflow;
mod dialogue_splitter;
mod episode_service;
mod pipeline_service;

pub use continuation_planner::{ContinuationPlanner, PREVIOUS_SCRIPT_CHAR_LIMIT};
pub use cover_workflow::{CoverPromptInputs, CoverWorkflow, CoverWorkflowError};
pub use dialogue_splitter::{split_into_parts, MAX_PARTS};
pub use episode_service::{
    CreateEpisodeInput, EpisodeService, EpisodeServiceError, UpdateEpisodeInput,
};
pub use pipeline_service::{
    build_generation_status, GenerationStatus, PipelineConfig, PipelineError, PipelineReport,
    PipelineService, RunOptions, StageDescriptor, StepState, STAGES,
};
