use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{ProjectRepository, RepositoryError};
use crate::domain::{Project, ProjectCharacter, ProjectId, VoiceId};

pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    #[instrument(skip(self), fields(project_id = %id.as_uuid()))]
    async fn get_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, title, description, genre_tone, musical_atmosphere, \
                    default_include_sound_effects, default_include_background_music \
             FROM projects WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.map(|r| -> Result<Project, RepositoryError> {
            Ok(Project {
                id: ProjectId::from_uuid(
                    r.try_get("id")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                ),
                title: r
                    .try_get("title")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                description: r
                    .try_get("description")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                genre_tone: r
                    .try_get("genre_tone")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                musical_atmosphere: r
                    .try_get("musical_atmosphere")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                default_include_sound_effects: r
                    .try_get("default_include_sound_effects")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                default_include_background_music: r
                    .try_get("default_include_background_music")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), fields(project_id = %project_id.as_uuid()))]
    async fn characters(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectCharacter>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, character_name, voice_id, voice_name, sort_order \
             FROM project_characters WHERE project_id = $1 ORDER BY sort_order",
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.into_iter()
            .map(|r| -> Result<ProjectCharacter, RepositoryError> {
                let voice_id: String = r
                    .try_get("voice_id")
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
                Ok(ProjectCharacter {
                    role: r
                        .try_get("role")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    character_name: r
                        .try_get("character_name")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    voice_id: VoiceId::new(voice_id),
                    voice_name: r
                        .try_get("voice_name")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                    sort_order: r
                        .try_get("sort_order")
                        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
                })
            })
            .collect()
    }
}
