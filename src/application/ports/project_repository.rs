use async_trait::async_trait;

use crate::domain::{Project, ProjectCharacter, ProjectId};

use super::RepositoryError;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;

    /// Character roster ordered by sort order.
    async fn characters(&self, project_id: ProjectId)
        -> Result<Vec<ProjectCharacter>, RepositoryError>;
}
