use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{ImageGenerator, ScriptWriter, Speaker};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    create_continuation_handler, create_episode_handler, delete_episode_handler,
    generate_cover_handler, generate_music_handler, generate_script_handler,
    generate_sounds_handler, generate_voiceover_handler, generation_status_handler,
    get_episode_handler, health_handler, list_episodes_handler, merge_handler,
    remove_cover_variant_handler, run_full_handler, select_cover_handler, update_episode_handler,
    update_script_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<W, S, G>(state: AppState<W, S, G>) -> Router
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/projects/{project_id}/episodes",
            post(create_episode_handler::<W, S, G>).get(list_episodes_handler::<W, S, G>),
        )
        .route(
            "/api/v1/episodes/{episode_id}",
            get(get_episode_handler::<W, S, G>)
                .patch(update_episode_handler::<W, S, G>)
                .delete(delete_episode_handler::<W, S, G>),
        )
        .route(
            "/api/v1/episodes/{episode_id}/script",
            put(update_script_handler::<W, S, G>),
        )
        .route(
            "/api/v1/episodes/{episode_id}/continuation",
            post(create_continuation_handler::<W, S, G>),
        )
        .route(
            "/api/v1/episodes/{episode_id}/cover/{variant_index}",
            delete(remove_cover_variant_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/script/{episode_id}",
            post(generate_script_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/voiceover/{episode_id}",
            post(generate_voiceover_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/sounds/{episode_id}",
            post(generate_sounds_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/music/{episode_id}",
            post(generate_music_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/merge/{episode_id}",
            post(merge_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/cover/{episode_id}",
            post(generate_cover_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/cover/{episode_id}/select",
            post(select_cover_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/full/{episode_id}",
            post(run_full_handler::<W, S, G>),
        )
        .route(
            "/api/v1/generation/status/{episode_id}",
            get(generation_status_handler::<W, S, G>),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
