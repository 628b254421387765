use std::sync::Arc;

use crate::application::ports::{
    BlobStore, EpisodeRepository, ProjectRepository, RepositoryError,
};
use crate::domain::{
    Episode, EpisodeId, EpisodeStatus, GenerationOptions, ProjectId, Script,
};

/// Caller-supplied fields for a new episode. Unset option fields inherit the
/// project's defaults; an unset title produces an auto-generated placeholder
/// the script stage is allowed to overwrite later.
#[derive(Debug, Clone, Default)]
pub struct CreateEpisodeInput {
    pub title: Option<String>,
    pub description: String,
    pub target_duration_minutes: Option<i32>,
    pub include_sound_effects: Option<bool>,
    pub include_background_music: Option<bool>,
    pub show_episode_number: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEpisodeInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_duration_minutes: Option<i32>,
    pub show_episode_number: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum EpisodeServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

const DEFAULT_TARGET_DURATION_MINUTES: i32 = 10;

/// Episode lifecycle outside the generation pipeline: numbering, metadata,
/// manual script edits, continuation setup, and deletion with blob cleanup.
pub struct EpisodeService {
    episodes: Arc<dyn EpisodeRepository>,
    projects: Arc<dyn ProjectRepository>,
    blob_store: Arc<dyn BlobStore>,
}

impl EpisodeService {
    pub fn new(
        episodes: Arc<dyn EpisodeRepository>,
        projects: Arc<dyn ProjectRepository>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            episodes,
            projects,
            blob_store,
        }
    }

    /// Creates the next episode of a project. Numbers are dense: always the
    /// current maximum plus one.
    pub async fn create(
        &self,
        project_id: ProjectId,
        input: CreateEpisodeInput,
    ) -> Result<Episode, EpisodeServiceError> {
        let project = self
            .projects
            .get_by_id(project_id)
            .await?
            .ok_or_else(|| EpisodeServiceError::NotFound("project".to_string()))?;

        let number = self.episodes.max_episode_number(project_id).await? + 1;

        let options = GenerationOptions {
            include_sound_effects: input
                .include_sound_effects
                .unwrap_or(project.default_include_sound_effects),
            include_background_music: input
                .include_background_music
                .unwrap_or(project.default_include_background_music),
        };

        let (title, auto_generated) = match input.title {
            Some(title) if !title.trim().is_empty() => (title, false),
            _ => (format!("Episode {}", number), true),
        };

        let mut episode = Episode::new(
            project_id,
            number,
            title,
            input.description,
            input
                .target_duration_minutes
                .unwrap_or(DEFAULT_TARGET_DURATION_MINUTES),
            options,
        );
        episode.title_auto_generated = auto_generated;
        if let Some(show) = input.show_episode_number {
            episode.show_episode_number = show;
        }

        match self.episodes.create(&episode).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                return Err(EpisodeServiceError::Validation(format!(
                    "episode number {} was claimed by a concurrent request, retry the create",
                    number
                )));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(
            episode_id = %episode.id.as_uuid(),
            episode_number = number,
            "Episode created"
        );
        Ok(episode)
    }

    /// Creates the next episode as a continuation of `parent`. The parent
    /// must be the project's latest episode and fully done; otherwise the
    /// continuation would be written against a story state that never aired.
    pub async fn create_continuation(
        &self,
        parent_id: EpisodeId,
        input: CreateEpisodeInput,
    ) -> Result<Episode, EpisodeServiceError> {
        let parent = self
            .episodes
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| EpisodeServiceError::NotFound("episode".to_string()))?;

        if parent.status != EpisodeStatus::Done {
            return Err(EpisodeServiceError::Validation(format!(
                "episode {} is not finished (status: {})",
                parent.episode_number, parent.status
            )));
        }

        let max = self.episodes.max_episode_number(parent.project_id).await?;
        if parent.episode_number != max {
            return Err(EpisodeServiceError::Validation(format!(
                "continuations start from the latest episode ({}), not episode {}",
                max, parent.episode_number
            )));
        }

        self.create(parent.project_id, input).await
    }

    pub async fn get(&self, id: EpisodeId) -> Result<Episode, EpisodeServiceError> {
        self.episodes
            .get_by_id(id)
            .await?
            .ok_or_else(|| EpisodeServiceError::NotFound("episode".to_string()))
    }

    pub async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Episode>, EpisodeServiceError> {
        Ok(self.episodes.list_by_project(project_id).await?)
    }

    pub async fn update_details(
        &self,
        id: EpisodeId,
        input: UpdateEpisodeInput,
    ) -> Result<Episode, EpisodeServiceError> {
        let mut episode = self.get(id).await?;

        if let Some(title) = input.title {
            if !title.trim().is_empty() {
                episode.title = title;
                episode.title_auto_generated = false;
            }
        }
        if let Some(description) = input.description {
            episode.description = description;
        }
        if let Some(minutes) = input.target_duration_minutes {
            episode.target_duration_minutes = minutes;
        }
        if let Some(show) = input.show_episode_number {
            episode.show_episode_number = show;
        }

        episode.updated_at = chrono::Utc::now();
        self.episodes.update(&episode).await?;
        Ok(episode)
    }

    /// Replaces the script by hand. Downstream artifacts are not touched,
    /// but the status falls back to the script stage so the pipeline knows
    /// later stages no longer match the text.
    pub async fn update_script(
        &self,
        id: EpisodeId,
        script: Script,
    ) -> Result<Episode, EpisodeServiceError> {
        let mut episode = self.get(id).await?;

        if episode.status.is_in_progress() {
            return Err(EpisodeServiceError::Validation(format!(
                "a generation stage is running (status: {})",
                episode.status
            )));
        }
        if script.lines.is_empty() {
            return Err(EpisodeServiceError::Validation(
                "script must contain at least one line".to_string(),
            ));
        }

        if episode.title_auto_generated && !script.title.is_empty() {
            episode.title = script.title.clone();
        }
        episode.script_text = Some(script.render_text());
        episode.script = Some(script);
        episode.status = EpisodeStatus::ScriptDone;
        episode.error_message = None;
        episode.updated_at = chrono::Utc::now();
        self.episodes.update(&episode).await?;
        Ok(episode)
    }

    /// Deletes the project's latest episode. Only the maximum-numbered one
    /// may go so numbering stays dense. Blob deletions are best effort: a
    /// failed delete is logged and the row removal proceeds.
    pub async fn delete(&self, id: EpisodeId) -> Result<(), EpisodeServiceError> {
        let episode = self.get(id).await?;

        let max = self.episodes.max_episode_number(episode.project_id).await?;
        if episode.episode_number != max {
            return Err(EpisodeServiceError::Validation(format!(
                "only the latest episode ({}) can be deleted, not episode {}",
                max, episode.episode_number
            )));
        }

        for url in episode.owned_blobs() {
            if let Err(e) = self.blob_store.delete(&url).await {
                tracing::warn!(url = %url, error = %e, "Failed to delete episode blob");
            }
        }

        self.episodes.delete(id).await?;
        tracing::info!(
            episode_id = %id.as_uuid(),
            episode_number = episode.episode_number,
            "Episode deleted"
        );
        Ok(())
    }
}
