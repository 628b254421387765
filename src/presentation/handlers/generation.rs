use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{ImageGenerator, ScriptWriter, Speaker};
use crate::application::services::RunOptions;
use crate::domain::EpisodeId;
use crate::presentation::state::AppState;

use super::responses::{pipeline_error_response, EpisodeResponse};

#[derive(Debug, Deserialize, Default)]
pub struct ScriptGenerationRequest {
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CoverGenerationRequest {
    #[serde(default = "default_variants_count")]
    pub variants_count: usize,
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub reference_image_urls: Vec<String>,
}

fn default_variants_count() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct SelectCoverRequest {
    pub variant_index: usize,
}

#[derive(Debug, Deserialize, Default)]
pub struct FullRunRequest {
    #[serde(default)]
    pub generate_cover: bool,
    #[serde(default = "default_variants_count")]
    pub cover_variants_count: usize,
    pub custom_prompt: Option<String>,
    #[serde(default)]
    pub resume: bool,
}

fn ok_episode(episode: crate::domain::Episode) -> Response {
    (StatusCode::OK, Json(EpisodeResponse::from(episode))).into_response()
}

#[tracing::instrument(skip(state, request))]
pub async fn generate_script_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
    request: Option<Json<ScriptGenerationRequest>>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    let custom_prompt = request.and_then(|Json(r)| r.custom_prompt);
    match state
        .pipeline_service
        .generate_script(EpisodeId::from_uuid(episode_id), custom_prompt)
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn generate_voiceover_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .pipeline_service
        .generate_voiceover(EpisodeId::from_uuid(episode_id))
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn generate_sounds_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .pipeline_service
        .generate_sounds(EpisodeId::from_uuid(episode_id))
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn generate_music_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .pipeline_service
        .generate_music(EpisodeId::from_uuid(episode_id))
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn merge_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .pipeline_service
        .merge(EpisodeId::from_uuid(episode_id))
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn generate_cover_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
    request: Option<Json<CoverGenerationRequest>>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let variants_count = if request.variants_count == 0 {
        1
    } else {
        request.variants_count
    };
    match state
        .pipeline_service
        .generate_cover(
            EpisodeId::from_uuid(episode_id),
            variants_count,
            request.custom_prompt,
            request.reference_image_urls,
        )
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn select_cover_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
    Json(request): Json<SelectCoverRequest>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .pipeline_service
        .select_cover_variant(EpisodeId::from_uuid(episode_id), request.variant_index)
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn remove_cover_variant_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path((episode_id, variant_index)): Path<(Uuid, usize)>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .pipeline_service
        .remove_cover_variant(EpisodeId::from_uuid(episode_id), variant_index)
        .await
    {
        Ok(episode) => ok_episode(episode),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn run_full_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
    request: Option<Json<FullRunRequest>>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let options = RunOptions {
        generate_cover: request.generate_cover,
        cover_variants_count: request.cover_variants_count,
        custom_prompt: request.custom_prompt,
        resume: request.resume,
    };
    match state
        .pipeline_service
        .run_full(EpisodeId::from_uuid(episode_id), options)
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn generation_status_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .pipeline_service
        .generation_status(EpisodeId::from_uuid(episode_id))
        .await
    {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => pipeline_error_response(e),
    }
}
