use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{EpisodeRepository, RepositoryError};
use crate::domain::{Episode, EpisodeId, EpisodeStatus, GenerationOptions, ProjectId};

pub struct PgEpisodeRepository {
    pool: PgPool,
}

impl PgEpisodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EPISODE_COLUMNS: &str = "id, project_id, episode_number, title, title_auto_generated, \
     show_episode_number, description, target_duration_minutes, include_sound_effects, \
     include_background_music, status, error_message, script, script_text, summary, \
     voice_audio, sounds, music, final_audio, cover, created_at, updated_at";

fn to_json<T: Serialize>(value: &Option<T>) -> Result<Option<serde_json::Value>, RepositoryError> {
    value
        .as_ref()
        .map(|v| serde_json::to_value(v).map_err(|e| RepositoryError::QueryFailed(e.to_string())))
        .transpose()
}

fn from_json<T: DeserializeOwned>(
    value: Option<serde_json::Value>,
    column: &str,
) -> Result<Option<T>, RepositoryError> {
    value
        .map(|v| {
            serde_json::from_value(v)
                .map_err(|e| RepositoryError::QueryFailed(format!("{}: {}", column, e)))
        })
        .transpose()
}

fn map_episode(row: PgRow) -> Result<Episode, RepositoryError> {
    let status: String = row
        .try_get("status")
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    let status: EpisodeStatus = status.parse().map_err(RepositoryError::QueryFailed)?;

    let get = |column: &str| -> Result<Option<serde_json::Value>, RepositoryError> {
        row.try_get(column)
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    };

    Ok(Episode {
        id: EpisodeId::from_uuid(
            row.try_get("id")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        ),
        project_id: ProjectId::from_uuid(
            row.try_get("project_id")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        ),
        episode_number: row
            .try_get("episode_number")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        title: row
            .try_get("title")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        title_auto_generated: row
            .try_get("title_auto_generated")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        show_episode_number: row
            .try_get("show_episode_number")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        target_duration_minutes: row
            .try_get("target_duration_minutes")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        options: GenerationOptions {
            include_sound_effects: row
                .try_get("include_sound_effects")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            include_background_music: row
                .try_get("include_background_music")
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        },
        status,
        error_message: row
            .try_get("error_message")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        script: from_json(get("script")?, "script")?,
        script_text: row
            .try_get("script_text")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        summary: row
            .try_get("summary")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        voice_audio: from_json(get("voice_audio")?, "voice_audio")?,
        sounds: from_json(get("sounds")?, "sounds")?,
        music: from_json(get("music")?, "music")?,
        final_audio: from_json(get("final_audio")?, "final_audio")?,
        cover: from_json(get("cover")?, "cover")?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
    })
}

#[async_trait]
impl EpisodeRepository for PgEpisodeRepository {
    #[instrument(skip(self, episode), fields(episode_id = %episode.id.as_uuid()))]
    async fn create(&self, episode: &Episode) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO episodes (
                id, project_id, episode_number, title, title_auto_generated,
                show_episode_number, description, target_duration_minutes,
                include_sound_effects, include_background_music, status,
                error_message, script, script_text, summary, voice_audio,
                sounds, music, final_audio, cover, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(episode.id.as_uuid())
        .bind(episode.project_id.as_uuid())
        .bind(episode.episode_number)
        .bind(&episode.title)
        .bind(episode.title_auto_generated)
        .bind(episode.show_episode_number)
        .bind(&episode.description)
        .bind(episode.target_duration_minutes)
        .bind(episode.options.include_sound_effects)
        .bind(episode.options.include_background_music)
        .bind(episode.status.as_str())
        .bind(&episode.error_message)
        .bind(to_json(&episode.script)?)
        .bind(&episode.script_text)
        .bind(&episode.summary)
        .bind(to_json(&episode.voice_audio)?)
        .bind(to_json(&episode.sounds)?)
        .bind(to_json(&episode.music)?)
        .bind(to_json(&episode.final_audio)?)
        .bind(to_json(&episode.cover)?)
        .bind(episode.created_at)
        .bind(episode.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                RepositoryError::Conflict(format!(
                    "episode number {} already exists in project {}",
                    episode.episode_number,
                    episode.project_id.as_uuid()
                ))
            } else {
                RepositoryError::QueryFailed(e.to_string())
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(episode_id = %id.as_uuid()))]
    async fn get_by_id(&self, id: EpisodeId) -> Result<Option<Episode>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM episodes WHERE id = $1",
            EPISODE_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.map(map_episode).transpose()
    }

    #[instrument(skip(self, episode), fields(episode_id = %episode.id.as_uuid(), status = %episode.status))]
    async fn update(&self, episode: &Episode) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE episodes SET
                title = $2, title_auto_generated = $3, show_episode_number = $4,
                description = $5, target_duration_minutes = $6,
                include_sound_effects = $7, include_background_music = $8,
                status = $9, error_message = $10, script = $11,
                script_text = $12, summary = $13, voice_audio = $14,
                sounds = $15, music = $16, final_audio = $17, cover = $18,
                updated_at = $19
            WHERE id = $1
            "#,
        )
        .bind(episode.id.as_uuid())
        .bind(&episode.title)
        .bind(episode.title_auto_generated)
        .bind(episode.show_episode_number)
        .bind(&episode.description)
        .bind(episode.target_duration_minutes)
        .bind(episode.options.include_sound_effects)
        .bind(episode.options.include_background_music)
        .bind(episode.status.as_str())
        .bind(&episode.error_message)
        .bind(to_json(&episode.script)?)
        .bind(&episode.script_text)
        .bind(&episode.summary)
        .bind(to_json(&episode.voice_audio)?)
        .bind(to_json(&episode.sounds)?)
        .bind(to_json(&episode.music)?)
        .bind(to_json(&episode.final_audio)?)
        .bind(to_json(&episode.cover)?)
        .bind(episode.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "episode {}",
                episode.id.as_uuid()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(episode_id = %id.as_uuid()))]
    async fn delete(&self, id: EpisodeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM episodes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "episode {}",
                id.as_uuid()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(project_id = %project_id.as_uuid()))]
    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Episode>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM episodes WHERE project_id = $1 ORDER BY episode_number",
            EPISODE_COLUMNS
        ))
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.into_iter().map(map_episode).collect()
    }

    #[instrument(skip(self), fields(project_id = %project_id.as_uuid()))]
    async fn max_episode_number(&self, project_id: ProjectId) -> Result<i32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(episode_number), 0) AS max_number \
             FROM episodes WHERE project_id = $1",
        )
        .bind(project_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.try_get("max_number")
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    #[instrument(skip(self), fields(project_id = %project_id.as_uuid(), before = before))]
    async fn previous_episodes(
        &self,
        project_id: ProjectId,
        before: i32,
    ) -> Result<Vec<Episode>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM episodes \
             WHERE project_id = $1 AND episode_number < $2 \
             ORDER BY episode_number",
            EPISODE_COLUMNS
        ))
        .bind(project_id.as_uuid())
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.into_iter().map(map_episode).collect()
    }
}
