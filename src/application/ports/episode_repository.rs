use async_trait::async_trait;

use crate::domain::{Episode, EpisodeId, ProjectId};

use super::RepositoryError;

#[async_trait]
pub trait EpisodeRepository: Send + Sync {
    async fn create(&self, episode: &Episode) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: EpisodeId) -> Result<Option<Episode>, RepositoryError>;

    /// Persists the full episode row, replacing every artifact column.
    /// Structured fields are whole-value replacements, never in-place edits.
    async fn update(&self, episode: &Episode) -> Result<(), RepositoryError>;

    async fn delete(&self, id: EpisodeId) -> Result<(), RepositoryError>;

    async fn list_by_project(&self, project_id: ProjectId)
        -> Result<Vec<Episode>, RepositoryError>;

    async fn max_episode_number(&self, project_id: ProjectId) -> Result<i32, RepositoryError>;

    /// Episodes of the project with numbers strictly below `before`, ordered
    /// by episode number ascending. Continuation context is built from this.
    async fn previous_episodes(
        &self,
        project_id: ProjectId,
        before: i32,
    ) -> Result<Vec<Episode>, RepositoryError>;
}
