use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::services::{EpisodeServiceError, PipelineError};
use crate::domain::{CoverArt, Episode, FinalAudio, MusicTrack, Script, SoundEffect, VoiceAudio};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Wire shape of an episode. Artifact fields serialize their stored
/// structures as-is; timestamps are RFC 3339.
#[derive(Serialize)]
pub struct EpisodeResponse {
    pub id: String,
    pub project_id: String,
    pub episode_number: i32,
    pub title: String,
    pub title_auto_generated: bool,
    pub show_episode_number: bool,
    pub description: String,
    pub target_duration_minutes: i32,
    pub include_sound_effects: bool,
    pub include_background_music: bool,
    pub status: String,
    pub error_message: Option<String>,
    pub script: Option<Script>,
    pub script_text: Option<String>,
    pub summary: Option<String>,
    pub voice_audio: Option<VoiceAudio>,
    pub sounds: Option<Vec<SoundEffect>>,
    pub music: Option<MusicTrack>,
    pub final_audio: Option<FinalAudio>,
    pub cover: Option<CoverArt>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Episode> for EpisodeResponse {
    fn from(episode: Episode) -> Self {
        Self {
            id: episode.id.as_uuid().to_string(),
            project_id: episode.project_id.as_uuid().to_string(),
            episode_number: episode.episode_number,
            title: episode.title,
            title_auto_generated: episode.title_auto_generated,
            show_episode_number: episode.show_episode_number,
            description: episode.description,
            target_duration_minutes: episode.target_duration_minutes,
            include_sound_effects: episode.options.include_sound_effects,
            include_background_music: episode.options.include_background_music,
            status: episode.status.as_str().to_string(),
            error_message: episode.error_message,
            script: episode.script,
            script_text: episode.script_text,
            summary: episode.summary,
            voice_audio: episode.voice_audio,
            sounds: episode.sounds,
            music: episode.music,
            final_audio: episode.final_audio,
            cover: episode.cover,
            created_at: episode.created_at.to_rfc3339(),
            updated_at: episode.updated_at.to_rfc3339(),
        }
    }
}

/// Caller mistakes map to 4xx without touching the episode; a failed
/// provider call maps to 502 with the episode already frozen in its error
/// state; everything else is a 500.
pub fn pipeline_error_response(error: PipelineError) -> Response {
    match error {
        PipelineError::PreconditionFailed(message) => {
            error_response(StatusCode::CONFLICT, message)
        }
        PipelineError::NotFound(what) => {
            error_response(StatusCode::NOT_FOUND, format!("not found: {}", what))
        }
        PipelineError::StageFailed { .. } => {
            error_response(StatusCode::BAD_GATEWAY, error.to_string())
        }
        PipelineError::Repository(e) => {
            tracing::error!(error = %e, "Repository failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub fn episode_error_response(error: EpisodeServiceError) -> Response {
    match error {
        EpisodeServiceError::NotFound(what) => {
            error_response(StatusCode::NOT_FOUND, format!("{} not found", what))
        }
        EpisodeServiceError::Validation(message) => {
            error_response(StatusCode::CONFLICT, message)
        }
        EpisodeServiceError::Repository(e) => {
            tracing::error!(error = %e, "Repository failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
