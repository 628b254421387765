use std::sync::Arc;

use async_trait::async_trait;
use fablecast::application::ports::{EpisodeRepository, RepositoryError};
use fablecast::application::services::{
    CreateEpisodeInput, EpisodeService, EpisodeServiceError,
};
use fablecast::domain::{
    Episode, EpisodeId, EpisodeStatus, GenerationOptions, Project, ProjectId, Script, ScriptLine,
    VoiceId,
};
use fablecast::infrastructure::persistence::{MockEpisodeRepository, MockProjectRepository};
use fablecast::infrastructure::storage::MockBlobStore;

struct Harness {
    service: EpisodeService,
    episodes: Arc<MockEpisodeRepository>,
    projects: Arc<MockProjectRepository>,
    store: Arc<MockBlobStore>,
}

fn harness() -> Harness {
    let episodes = Arc::new(MockEpisodeRepository::new());
    let projects = Arc::new(MockProjectRepository::new());
    let store = Arc::new(MockBlobStore::new());
    let service = EpisodeService::new(episodes.clone(), projects.clone(), store.clone());
    Harness {
        service,
        episodes,
        projects,
        store,
    }
}

fn seed_project(harness: &Harness, sounds_default: bool, music_default: bool) -> Project {
    let project = Project {
        id: ProjectId::new(),
        title: "Driftwood".to_string(),
        description: "Coastal ghost stories".to_string(),
        genre_tone: "melancholy folk horror".to_string(),
        musical_atmosphere: Some("sparse strings".to_string()),
        default_include_sound_effects: sounds_default,
        default_include_background_music: music_default,
    };
    harness.projects.insert(project.clone(), Vec::new());
    project
}

fn script(title: &str) -> Script {
    Script {
        title: title.to_string(),
        genre_tone: "melancholy".to_string(),
        approx_duration_minutes: 5,
        lines: vec![ScriptLine {
            speaker: "Narrator".to_string(),
            voice_id: Some(VoiceId::new("v-1")),
            text: "The tide never brought him back.".to_string(),
            sound_effect: None,
        }],
    }
}

#[tokio::test]
async fn given_empty_project_when_creating_episodes_then_numbers_are_dense_from_one() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let first = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    let second = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();

    assert_eq!(first.episode_number, 1);
    assert_eq!(second.episode_number, 2);
}

#[tokio::test]
async fn given_no_title_when_creating_then_placeholder_is_auto_generated() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let episode = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();

    assert_eq!(episode.title, "Episode 1");
    assert!(episode.title_auto_generated);
}

#[tokio::test]
async fn given_explicit_title_when_creating_then_it_is_kept_as_manual() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let episode = h
        .service
        .create(
            project.id,
            CreateEpisodeInput {
                title: Some("The Lighthouse".to_string()),
                ..CreateEpisodeInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(episode.title, "The Lighthouse");
    assert!(!episode.title_auto_generated);
}

#[tokio::test]
async fn given_project_defaults_when_creating_then_options_are_inherited() {
    let h = harness();
    let project = seed_project(&h, true, false);

    let inherited = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    let overridden = h
        .service
        .create(
            project.id,
            CreateEpisodeInput {
                include_sound_effects: Some(false),
                include_background_music: Some(true),
                ..CreateEpisodeInput::default()
            },
        )
        .await
        .unwrap();

    assert!(inherited.options.include_sound_effects);
    assert!(!inherited.options.include_background_music);
    assert!(!overridden.options.include_sound_effects);
    assert!(overridden.options.include_background_music);
}

#[tokio::test]
async fn given_unknown_project_when_creating_then_not_found() {
    let h = harness();

    let result = h
        .service
        .create(ProjectId::new(), CreateEpisodeInput::default())
        .await;

    assert!(matches!(result, Err(EpisodeServiceError::NotFound(_))));
}

/// Repository double whose max-number read lags one behind the stored rows.
/// This is the view the losing side of a concurrent create race observes.
struct StaleMaxRepository {
    inner: MockEpisodeRepository,
}

#[async_trait]
impl EpisodeRepository for StaleMaxRepository {
    async fn create(&self, episode: &Episode) -> Result<(), RepositoryError> {
        self.inner.create(episode).await
    }

    async fn get_by_id(&self, id: EpisodeId) -> Result<Option<Episode>, RepositoryError> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, episode: &Episode) -> Result<(), RepositoryError> {
        self.inner.update(episode).await
    }

    async fn delete(&self, id: EpisodeId) -> Result<(), RepositoryError> {
        self.inner.delete(id).await
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Episode>, RepositoryError> {
        self.inner.list_by_project(project_id).await
    }

    async fn max_episode_number(&self, project_id: ProjectId) -> Result<i32, RepositoryError> {
        Ok((self.inner.max_episode_number(project_id).await? - 1).max(0))
    }

    async fn previous_episodes(
        &self,
        project_id: ProjectId,
        before: i32,
    ) -> Result<Vec<Episode>, RepositoryError> {
        self.inner.previous_episodes(project_id, before).await
    }
}

#[tokio::test]
async fn given_concurrent_create_claiming_the_number_then_validation_error_not_repository_error() {
    let episodes = Arc::new(StaleMaxRepository {
        inner: MockEpisodeRepository::new(),
    });
    let projects = Arc::new(MockProjectRepository::new());
    let store = Arc::new(MockBlobStore::new());
    let service = EpisodeService::new(episodes.clone(), projects.clone(), store);

    let project = Project {
        id: ProjectId::new(),
        title: "Driftwood".to_string(),
        description: "Coastal ghost stories".to_string(),
        genre_tone: "melancholy folk horror".to_string(),
        musical_atmosphere: None,
        default_include_sound_effects: false,
        default_include_background_music: false,
    };
    projects.insert(project.clone(), Vec::new());

    // The row a faster concurrent request already committed.
    episodes.inner.insert(Episode::new(
        project.id,
        1,
        "Episode 1".to_string(),
        String::new(),
        10,
        GenerationOptions {
            include_sound_effects: false,
            include_background_music: false,
        },
    ));

    let result = service.create(project.id, CreateEpisodeInput::default()).await;

    match result {
        Err(EpisodeServiceError::Validation(message)) => {
            assert!(message.contains("concurrent"), "message: {}", message);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn given_middle_episode_when_deleting_then_it_is_refused() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let first = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    h.service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();

    let result = h.service.delete(first.id).await;

    assert!(matches!(result, Err(EpisodeServiceError::Validation(_))));
    assert!(h.episodes.snapshot(first.id).is_some());
}

#[tokio::test]
async fn given_latest_episode_when_deleting_then_row_and_blobs_go() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let episode = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();

    // Attach an artifact so deletion has a blob to clean up.
    let mut stored = h.episodes.snapshot(episode.id).unwrap();
    stored.voice_audio = Some(fablecast::domain::VoiceAudio {
        url: fablecast::domain::BlobUrl::from_raw("audio/narration.mp3"),
        duration_seconds: 60.0,
        parts: 1,
        alignment: serde_json::json!({}),
    });
    h.episodes.insert(stored);

    h.service.delete(episode.id).await.unwrap();

    assert!(h.episodes.snapshot(episode.id).is_none());
    assert!(h
        .store
        .deleted_urls()
        .contains(&"audio/narration.mp3".to_string()));
}

#[tokio::test]
async fn given_unfinished_parent_when_creating_continuation_then_it_is_refused() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let parent = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();

    let result = h
        .service
        .create_continuation(parent.id, CreateEpisodeInput::default())
        .await;

    assert!(matches!(result, Err(EpisodeServiceError::Validation(_))));
}

#[tokio::test]
async fn given_done_latest_parent_when_creating_continuation_then_next_number_is_assigned() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let parent = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    let mut done = h.episodes.snapshot(parent.id).unwrap();
    done.status = EpisodeStatus::Done;
    h.episodes.insert(done);

    let continuation = h
        .service
        .create_continuation(parent.id, CreateEpisodeInput::default())
        .await
        .unwrap();

    assert_eq!(continuation.episode_number, 2);
    assert_eq!(continuation.project_id, project.id);
}

#[tokio::test]
async fn given_earlier_done_parent_when_creating_continuation_then_it_is_refused() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let first = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    let mut done = h.episodes.snapshot(first.id).unwrap();
    done.status = EpisodeStatus::Done;
    h.episodes.insert(done);
    h.service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();

    let result = h
        .service
        .create_continuation(first.id, CreateEpisodeInput::default())
        .await;

    assert!(matches!(result, Err(EpisodeServiceError::Validation(_))));
}

#[tokio::test]
async fn given_manual_script_replacement_then_status_falls_back_to_script_done() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let episode = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    let mut advanced = h.episodes.snapshot(episode.id).unwrap();
    advanced.status = EpisodeStatus::AudioDone;
    h.episodes.insert(advanced);

    let updated = h
        .service
        .update_script(episode.id, script("Rewritten"))
        .await
        .unwrap();

    assert_eq!(updated.status, EpisodeStatus::ScriptDone);
    assert_eq!(updated.title, "Rewritten");
    assert!(updated.script_text.unwrap().contains("# Rewritten"));
}

#[tokio::test]
async fn given_empty_script_when_replacing_then_it_is_rejected() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let episode = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    let mut empty = script("Empty");
    empty.lines.clear();

    let result = h.service.update_script(episode.id, empty).await;

    assert!(matches!(result, Err(EpisodeServiceError::Validation(_))));
}

#[tokio::test]
async fn given_generation_in_progress_when_replacing_script_then_it_is_refused() {
    let h = harness();
    let project = seed_project(&h, false, false);

    let episode = h
        .service
        .create(project.id, CreateEpisodeInput::default())
        .await
        .unwrap();
    let mut busy = h.episodes.snapshot(episode.id).unwrap();
    busy.status = EpisodeStatus::Merging;
    h.episodes.insert(busy);

    let result = h.service.update_script(episode.id, script("Late Edit")).await;

    assert!(matches!(result, Err(EpisodeServiceError::Validation(_))));
}
