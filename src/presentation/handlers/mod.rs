mod episodes;
mod generation;
mod health;
mod responses;

pub use episodes::{
    create_continuation_handler, create_episode_handler, delete_episode_handler,
    get_episode_handler, list_episodes_handler, update_episode_handler, update_script_handler,
    CreateEpisodeRequest, UpdateEpisodeRequest,
};
pub use generation::{
    generate_cover_handler, generate_music_handler, generate_script_handler,
    generate_sounds_handler, generate_voiceover_handler, generation_status_handler, merge_handler,
    remove_cover_variant_handler, run_full_handler, select_cover_handler, CoverGenerationRequest,
    FullRunRequest, ScriptGenerationRequest, SelectCoverRequest,
};
pub use health::health_handler;
pub use responses::{EpisodeResponse, ErrorResponse};
