use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{ImageGenerator, ScriptWriter, Speaker};
use crate::application::services::{CreateEpisodeInput, UpdateEpisodeInput};
use crate::domain::{EpisodeId, ProjectId, Script};
use crate::presentation::state::AppState;

use super::responses::{episode_error_response, EpisodeResponse};

#[derive(Debug, Deserialize, Default)]
pub struct CreateEpisodeRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    pub target_duration_minutes: Option<i32>,
    pub include_sound_effects: Option<bool>,
    pub include_background_music: Option<bool>,
    pub show_episode_number: Option<bool>,
}

impl From<CreateEpisodeRequest> for CreateEpisodeInput {
    fn from(request: CreateEpisodeRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            target_duration_minutes: request.target_duration_minutes,
            include_sound_effects: request.include_sound_effects,
            include_background_music: request.include_background_music,
            show_episode_number: request.show_episode_number,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateEpisodeRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_duration_minutes: Option<i32>,
    pub show_episode_number: Option<bool>,
}

#[tracing::instrument(skip(state, request))]
pub async fn create_episode_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateEpisodeRequest>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .episode_service
        .create(ProjectId::from_uuid(project_id), request.into())
        .await
    {
        Ok(episode) => (
            StatusCode::CREATED,
            Json(EpisodeResponse::from(episode)),
        )
            .into_response(),
        Err(e) => episode_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_episodes_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(project_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .episode_service
        .list_by_project(ProjectId::from_uuid(project_id))
        .await
    {
        Ok(episodes) => {
            let body: Vec<EpisodeResponse> =
                episodes.into_iter().map(EpisodeResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => episode_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn get_episode_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .episode_service
        .get(EpisodeId::from_uuid(episode_id))
        .await
    {
        Ok(episode) => (StatusCode::OK, Json(EpisodeResponse::from(episode))).into_response(),
        Err(e) => episode_error_response(e),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn update_episode_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
    Json(request): Json<UpdateEpisodeRequest>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    let input = UpdateEpisodeInput {
        title: request.title,
        description: request.description,
        target_duration_minutes: request.target_duration_minutes,
        show_episode_number: request.show_episode_number,
    };
    match state
        .episode_service
        .update_details(EpisodeId::from_uuid(episode_id), input)
        .await
    {
        Ok(episode) => (StatusCode::OK, Json(EpisodeResponse::from(episode))).into_response(),
        Err(e) => episode_error_response(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_episode_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .episode_service
        .delete(EpisodeId::from_uuid(episode_id))
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => episode_error_response(e),
    }
}

#[tracing::instrument(skip(state, script))]
pub async fn update_script_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
    Json(script): Json<Script>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .episode_service
        .update_script(EpisodeId::from_uuid(episode_id), script)
        .await
    {
        Ok(episode) => (StatusCode::OK, Json(EpisodeResponse::from(episode))).into_response(),
        Err(e) => episode_error_response(e),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn create_continuation_handler<W, S, G>(
    State(state): State<AppState<W, S, G>>,
    Path(episode_id): Path<Uuid>,
    Json(request): Json<CreateEpisodeRequest>,
) -> Response
where
    W: ScriptWriter + 'static,
    S: Speaker + 'static,
    G: ImageGenerator + 'static,
{
    match state
        .episode_service
        .create_continuation(EpisodeId::from_uuid(episode_id), request.into())
        .await
    {
        Ok(episode) => (
            StatusCode::CREATED,
            Json(EpisodeResponse::from(episode)),
        )
            .into_response(),
        Err(e) => episode_error_response(e),
    }
}
