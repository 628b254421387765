use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{EpisodeRepository, ProjectRepository, RepositoryError};
use crate::domain::{Episode, EpisodeId, Project, ProjectCharacter, ProjectId};

/// In-memory episode repository for tests.
#[derive(Default)]
pub struct MockEpisodeRepository {
    episodes: Mutex<HashMap<EpisodeId, Episode>>,
}

impl MockEpisodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, episode: Episode) {
        self.episodes.lock().unwrap().insert(episode.id, episode);
    }

    pub fn snapshot(&self, id: EpisodeId) -> Option<Episode> {
        self.episodes.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl EpisodeRepository for MockEpisodeRepository {
    async fn create(&self, episode: &Episode) -> Result<(), RepositoryError> {
        let mut episodes = self.episodes.lock().unwrap();
        // Mirrors the UNIQUE (project_id, episode_number) constraint.
        let taken = episodes.values().any(|e| {
            e.project_id == episode.project_id && e.episode_number == episode.episode_number
        });
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "episode number {} already exists in project {}",
                episode.episode_number,
                episode.project_id.as_uuid()
            )));
        }
        episodes.insert(episode.id, episode.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: EpisodeId) -> Result<Option<Episode>, RepositoryError> {
        Ok(self.episodes.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, episode: &Episode) -> Result<(), RepositoryError> {
        let mut episodes = self.episodes.lock().unwrap();
        if !episodes.contains_key(&episode.id) {
            return Err(RepositoryError::NotFound(format!(
                "episode {}",
                episode.id.as_uuid()
            )));
        }
        episodes.insert(episode.id, episode.clone());
        Ok(())
    }

    async fn delete(&self, id: EpisodeId) -> Result<(), RepositoryError> {
        self.episodes
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("episode {}", id.as_uuid())))
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Episode>, RepositoryError> {
        let mut episodes: Vec<Episode> = self
            .episodes
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        episodes.sort_by_key(|e| e.episode_number);
        Ok(episodes)
    }

    async fn max_episode_number(&self, project_id: ProjectId) -> Result<i32, RepositoryError> {
        Ok(self
            .episodes
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.project_id == project_id)
            .map(|e| e.episode_number)
            .max()
            .unwrap_or(0))
    }

    async fn previous_episodes(
        &self,
        project_id: ProjectId,
        before: i32,
    ) -> Result<Vec<Episode>, RepositoryError> {
        let mut episodes: Vec<Episode> = self
            .episodes
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.project_id == project_id && e.episode_number < before)
            .cloned()
            .collect();
        episodes.sort_by_key(|e| e.episode_number);
        Ok(episodes)
    }
}

/// In-memory project repository for tests.
#[derive(Default)]
pub struct MockProjectRepository {
    projects: Mutex<HashMap<ProjectId, (Project, Vec<ProjectCharacter>)>>,
}

impl MockProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, project: Project, characters: Vec<ProjectCharacter>) {
        self.projects
            .lock()
            .unwrap()
            .insert(project.id, (project, characters));
    }
}

#[async_trait]
impl ProjectRepository for MockProjectRepository {
    async fn get_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .get(&id)
            .map(|(project, _)| project.clone()))
    }

    async fn characters(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectCharacter>, RepositoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .get(&project_id)
            .map(|(_, characters)| characters.clone())
            .unwrap_or_default())
    }
}
