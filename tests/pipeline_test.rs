use std::sync::Arc;
use std::time::Duration;

use fablecast::application::ports::{BlobStore, CharsPerSecondEstimator};
use fablecast::application::services::{
    CoverWorkflow, PipelineConfig, PipelineError, PipelineService, RunOptions, StepState,
};
use fablecast::domain::{
    Episode, EpisodeStatus, GenerationOptions, Project, ProjectCharacter, ProjectId, Script,
    ScriptLine, VoiceId,
};
use fablecast::infrastructure::audio::MockAudioMixer;
use fablecast::infrastructure::image::MockImageGenerator;
use fablecast::infrastructure::llm::MockScriptWriter;
use fablecast::infrastructure::persistence::{MockEpisodeRepository, MockProjectRepository};
use fablecast::infrastructure::speech::MockSpeaker;
use fablecast::infrastructure::storage::MockBlobStore;

struct Harness {
    service: PipelineService<MockScriptWriter, MockSpeaker, MockImageGenerator>,
    episodes: Arc<MockEpisodeRepository>,
    projects: Arc<MockProjectRepository>,
    store: Arc<MockBlobStore>,
    speaker: Arc<MockSpeaker>,
    writer: Arc<MockScriptWriter>,
}

fn harness_with(writer: MockScriptWriter, generator: MockImageGenerator) -> Harness {
    let episodes = Arc::new(MockEpisodeRepository::new());
    let projects = Arc::new(MockProjectRepository::new());
    let store = Arc::new(MockBlobStore::new());
    let speaker = Arc::new(MockSpeaker::new());
    let writer = Arc::new(writer);
    let mixer = Arc::new(MockAudioMixer::new(store.clone(), 120.0));
    let cover_workflow = Arc::new(CoverWorkflow::new(
        Arc::new(generator),
        store.clone(),
        Duration::from_millis(1),
        Duration::from_millis(200),
    ));

    let service = PipelineService::new(
        writer.clone(),
        speaker.clone(),
        cover_workflow,
        store.clone(),
        mixer,
        episodes.clone(),
        projects.clone(),
        Arc::new(CharsPerSecondEstimator::default()),
        PipelineConfig::default(),
    );

    Harness {
        service,
        episodes,
        projects,
        store,
        speaker,
        writer,
    }
}

fn harness() -> Harness {
    harness_with(MockScriptWriter::new(), MockImageGenerator::new())
}

fn seed_project(harness: &Harness) -> Project {
    let project = Project {
        id: ProjectId::new(),
        title: "Night Freight".to_string(),
        description: "A trucker serial".to_string(),
        genre_tone: "slow-burn mystery".to_string(),
        musical_atmosphere: None,
        default_include_sound_effects: false,
        default_include_background_music: false,
    };
    let characters = vec![ProjectCharacter {
        role: "narrator".to_string(),
        character_name: "Narrator".to_string(),
        voice_id: VoiceId::new("v-narrator"),
        voice_name: "Atlas".to_string(),
        sort_order: 0,
    }];
    harness.projects.insert(project.clone(), characters);
    project
}

fn seed_episode(harness: &Harness, project: &Project, sounds: bool, music: bool) -> Episode {
    let episode = Episode::new(
        project.id,
        1,
        "Episode 1".to_string(),
        "premise".to_string(),
        10,
        GenerationOptions {
            include_sound_effects: sounds,
            include_background_music: music,
        },
    );
    harness.episodes.insert(episode.clone());
    episode
}

#[tokio::test]
async fn given_flags_disabled_when_run_full_then_sounds_and_music_are_skipped() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let report = h
        .service
        .run_full(episode.id, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.sounds_status, StepState::Skipped);
    assert_eq!(report.music_status, StepState::Skipped);
    assert_eq!(report.merge_status, StepState::Done);
    assert_eq!(*h.speaker.sound_effect_calls.lock().unwrap(), 0);
    assert_eq!(*h.speaker.music_calls.lock().unwrap(), 0);

    let stored = h.episodes.snapshot(episode.id).unwrap();
    assert_eq!(stored.status, EpisodeStatus::Done);
    assert!(stored.final_audio.is_some());
    assert!(stored.summary.is_some());
    assert!(stored.sounds.is_none());
    assert!(stored.music.is_none());
}

#[tokio::test]
async fn given_enabled_flags_when_run_full_then_optional_stages_run() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, true, true);

    let report = h
        .service
        .run_full(episode.id, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.sounds_status, StepState::Done);
    assert_eq!(report.music_status, StepState::Done);
    assert_eq!(*h.speaker.sound_effect_calls.lock().unwrap(), 1);
    assert_eq!(*h.speaker.music_calls.lock().unwrap(), 1);

    let stored = h.episodes.snapshot(episode.id).unwrap();
    assert_eq!(stored.sounds.as_ref().unwrap().len(), 1);
    assert!(stored.music.is_some());
}

#[tokio::test]
async fn given_failing_writer_when_generating_script_then_episode_is_error_without_script() {
    let h = harness_with(MockScriptWriter::failing(), MockImageGenerator::new());
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let result = h.service.generate_script(episode.id, None).await;

    assert!(matches!(
        result,
        Err(PipelineError::StageFailed { stage: "script", .. })
    ));
    let stored = h.episodes.snapshot(episode.id).unwrap();
    assert_eq!(stored.status, EpisodeStatus::Error);
    assert!(stored.error_message.is_some());
    assert!(stored.script.is_none());
    assert!(stored.script_text.is_none());
}

#[tokio::test]
async fn given_no_script_when_generating_voiceover_then_precondition_fails_without_mutation() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let result = h.service.generate_voiceover(episode.id).await;

    assert!(matches!(result, Err(PipelineError::PreconditionFailed(_))));
    let stored = h.episodes.snapshot(episode.id).unwrap();
    assert_eq!(stored.status, EpisodeStatus::Draft);
    assert!(stored.error_message.is_none());
}

#[tokio::test]
async fn given_existing_voiceover_when_regenerating_then_old_blob_is_deleted() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service.generate_script(episode.id, None).await.unwrap();
    let first = h.service.generate_voiceover(episode.id).await.unwrap();
    let first_url = first.voice_audio.unwrap().url;

    let second = h.service.generate_voiceover(episode.id).await.unwrap();
    let second_url = second.voice_audio.unwrap().url;

    assert_ne!(first_url, second_url);
    assert!(!h.store.contains(&first_url));
    assert!(h.store.contains(&second_url));
    assert!(h
        .store
        .deleted_urls()
        .contains(&first_url.as_str().to_string()));
}

#[tokio::test]
async fn given_stage_in_progress_when_starting_another_then_it_is_refused() {
    let h = harness();
    let project = seed_project(&h);
    let mut episode = seed_episode(&h, &project, false, false);
    episode.status = EpisodeStatus::VoiceoverGenerating;
    h.episodes.insert(episode.clone());

    let result = h.service.generate_script(episode.id, None).await;

    assert!(matches!(result, Err(PipelineError::PreconditionFailed(_))));
}

#[tokio::test]
async fn given_disabled_music_flag_when_merging_then_existing_music_artifact_is_excluded() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service.generate_script(episode.id, None).await.unwrap();
    h.service.generate_voiceover(episode.id).await.unwrap();

    // A music artifact left over from before the flag was turned off.
    let mut stored = h.episodes.snapshot(episode.id).unwrap();
    stored.music = Some(fablecast::domain::MusicTrack {
        url: fablecast::domain::BlobUrl::from_raw("audio/old-music.mp3"),
        composition_plan: serde_json::json!({}),
    });
    h.episodes.insert(stored);

    h.service.merge(episode.id).await.unwrap();

    let merged = h.episodes.snapshot(episode.id).unwrap();
    let final_audio = merged.final_audio.unwrap();
    // The mock mixer records the secondary track count in the blob payload.
    let payload = h.store.read(&final_audio.url).await.unwrap();
    assert_eq!(&payload[..], b"mixed:0");
}

#[tokio::test]
async fn given_completed_stages_when_rerunning_with_resume_then_providers_are_not_called_again() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service
        .run_full(episode.id, RunOptions::default())
        .await
        .unwrap();
    let dialogue_calls = *h.speaker.dialogue_calls.lock().unwrap();

    let report = h
        .service
        .run_full(
            episode.id,
            RunOptions {
                resume: true,
                ..RunOptions::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(report.script_status, StepState::Done);
    assert_eq!(report.voiceover_status, StepState::Done);
    assert_eq!(report.merge_status, StepState::Done);
    assert_eq!(*h.speaker.dialogue_calls.lock().unwrap(), dialogue_calls);
}

#[tokio::test]
async fn given_cover_generation_when_one_variant_fails_then_the_rest_survive() {
    let h = harness_with(
        MockScriptWriter::new(),
        MockImageGenerator::new().with_failing_tasks(vec![0]),
    );
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let updated = h
        .service
        .generate_cover(episode.id, 3, None, Vec::new())
        .await
        .unwrap();

    let cover = updated.cover.unwrap();
    assert_eq!(cover.variants.len(), 2);
    assert_eq!(cover.selected_index(), Some(0));
    assert_eq!(updated.status, EpisodeStatus::Done);
}

#[tokio::test]
async fn given_slow_image_tasks_when_generating_cover_then_polling_continues_until_success() {
    let h = harness_with(
        MockScriptWriter::new(),
        MockImageGenerator::new().with_polls_until_success(3),
    );
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let updated = h
        .service
        .generate_cover(episode.id, 1, None, Vec::new())
        .await
        .unwrap();

    assert_eq!(updated.cover.unwrap().variants.len(), 1);
    assert_eq!(updated.status, EpisodeStatus::Done);
}

#[tokio::test]
async fn given_all_variants_fail_when_generating_cover_then_episode_is_error() {
    let h = harness_with(
        MockScriptWriter::new(),
        MockImageGenerator::new().with_failing_tasks(vec![0, 1]),
    );
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let result = h.service.generate_cover(episode.id, 2, None, Vec::new()).await;

    assert!(matches!(
        result,
        Err(PipelineError::StageFailed { stage: "cover", .. })
    ));
    let stored = h.episodes.snapshot(episode.id).unwrap();
    assert_eq!(stored.status, EpisodeStatus::Error);
    assert!(stored.cover.is_none());
}

#[tokio::test]
async fn given_cover_variants_when_selecting_then_primary_follows_the_selection() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service
        .generate_cover(episode.id, 3, None, Vec::new())
        .await
        .unwrap();
    let updated = h.service.select_cover_variant(episode.id, 2).await.unwrap();

    let cover = updated.cover.unwrap();
    assert_eq!(cover.selected_index(), Some(2));
    assert_eq!(cover.url, cover.variants[2].url);
}

#[tokio::test]
async fn given_out_of_range_variant_when_selecting_then_nothing_changes() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service
        .generate_cover(episode.id, 2, None, Vec::new())
        .await
        .unwrap();
    let before = h.episodes.snapshot(episode.id).unwrap();

    let result = h.service.select_cover_variant(episode.id, 9).await;

    assert!(matches!(result, Err(PipelineError::PreconditionFailed(_))));
    let after = h.episodes.snapshot(episode.id).unwrap();
    assert_eq!(after.cover, before.cover);
}

#[tokio::test]
async fn given_selected_variant_removal_then_first_remaining_is_promoted() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service
        .generate_cover(episode.id, 3, None, Vec::new())
        .await
        .unwrap();
    let before = h.episodes.snapshot(episode.id).unwrap().cover.unwrap();
    let removed_url = before.variants[0].url.clone();

    let updated = h.service.remove_cover_variant(episode.id, 0).await.unwrap();

    let cover = updated.cover.unwrap();
    assert_eq!(cover.variants.len(), 2);
    assert_eq!(cover.selected_index(), Some(0));
    assert_eq!(cover.url, cover.variants[0].url);
    assert!(h
        .store
        .deleted_urls()
        .contains(&removed_url.as_str().to_string()));
}

#[tokio::test]
async fn given_last_variant_removal_then_cover_is_cleared() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service
        .generate_cover(episode.id, 1, None, Vec::new())
        .await
        .unwrap();

    let updated = h.service.remove_cover_variant(episode.id, 0).await.unwrap();

    assert!(updated.cover.is_none());
}

#[tokio::test]
async fn given_regenerated_cover_then_previous_variant_blobs_are_deleted() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let first = h
        .service
        .generate_cover(episode.id, 2, None, Vec::new())
        .await
        .unwrap();
    let old_urls: Vec<String> = first
        .cover
        .unwrap()
        .variants
        .iter()
        .map(|v| v.url.as_str().to_string())
        .collect();

    h.service
        .generate_cover(episode.id, 1, None, Vec::new())
        .await
        .unwrap();

    let deleted = h.store.deleted_urls();
    for url in old_urls {
        assert!(deleted.contains(&url));
    }
}

#[tokio::test]
async fn given_auto_generated_title_when_script_arrives_then_title_is_adopted() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let updated = h.service.generate_script(episode.id, None).await.unwrap();

    assert_eq!(updated.title, "Generated Episode 1");
    assert_eq!(updated.status, EpisodeStatus::ScriptDone);
}

#[tokio::test]
async fn given_manual_title_when_script_arrives_then_title_is_kept() {
    let h = harness();
    let project = seed_project(&h);
    let mut episode = seed_episode(&h, &project, false, false);
    episode.title = "My Own Title".to_string();
    episode.title_auto_generated = false;
    h.episodes.insert(episode.clone());

    let updated = h.service.generate_script(episode.id, None).await.unwrap();

    assert_eq!(updated.title, "My Own Title");
}

#[tokio::test]
async fn given_sounds_disabled_when_generating_sounds_then_precondition_fails() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    h.service.generate_script(episode.id, None).await.unwrap();
    h.service.generate_voiceover(episode.id).await.unwrap();

    let result = h.service.generate_sounds(episode.id).await;

    assert!(matches!(result, Err(PipelineError::PreconditionFailed(_))));
}

#[tokio::test]
async fn given_provider_that_never_finishes_when_generating_cover_then_stage_times_out() {
    let h = harness_with(
        MockScriptWriter::new(),
        MockImageGenerator::new().with_polls_until_success(usize::MAX),
    );
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, false, false);

    let result = h.service.generate_cover(episode.id, 1, None, Vec::new()).await;

    match result {
        Err(PipelineError::StageFailed {
            stage: "cover",
            message,
        }) => assert!(message.contains("timed out"), "message: {}", message),
        other => panic!("expected cover stage failure, got {:?}", other),
    }
    let stored = h.episodes.snapshot(episode.id).unwrap();
    assert_eq!(stored.status, EpisodeStatus::Error);
    assert!(stored.error_message.unwrap().contains("timed out"));
    assert!(stored.cover.is_none());
}

#[tokio::test]
async fn given_script_without_cues_when_generating_sounds_then_empty_list_completes_the_stage() {
    let h = harness();
    let project = seed_project(&h);
    let episode = seed_episode(&h, &project, true, false);

    let mut stored = h.episodes.snapshot(episode.id).unwrap();
    stored.script = Some(Script {
        title: "Quiet Roads".to_string(),
        genre_tone: "slow-burn mystery".to_string(),
        approx_duration_minutes: 5,
        lines: vec![ScriptLine {
            speaker: "Narrator".to_string(),
            voice_id: Some(VoiceId::new("v-narrator")),
            text: "Nothing stirred for miles.".to_string(),
            sound_effect: None,
        }],
    });
    stored.voice_audio = Some(fablecast::domain::VoiceAudio {
        url: fablecast::domain::BlobUrl::from_raw("audio/narration.mp3"),
        duration_seconds: 60.0,
        parts: 1,
        alignment: serde_json::json!({}),
    });
    stored.status = EpisodeStatus::VoiceoverDone;
    h.episodes.insert(stored);

    let updated = h.service.generate_sounds(episode.id).await.unwrap();

    assert_eq!(updated.status, EpisodeStatus::SoundsDone);
    assert_eq!(updated.sounds, Some(Vec::new()));
    assert_eq!(*h.speaker.sound_effect_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn given_error_state_when_retrying_the_stage_then_error_is_cleared() {
    let h = harness();
    let project = seed_project(&h);
    let mut episode = seed_episode(&h, &project, false, false);
    episode.status = EpisodeStatus::Error;
    episode.error_message = Some("tts exploded".to_string());
    h.episodes.insert(episode.clone());

    let updated = h.service.generate_script(episode.id, None).await.unwrap();

    assert_eq!(updated.status, EpisodeStatus::ScriptDone);
    assert!(updated.error_message.is_none());
}

#[tokio::test]
async fn given_continuation_episode_then_writer_receives_previous_story_context() {
    let h = harness();
    let project = seed_project(&h);

    let mut ep1 = seed_episode(&h, &project, false, false);
    ep1.summary = Some("They crossed the border.".to_string());
    ep1.script_text = Some("full script of one".to_string());
    ep1.status = EpisodeStatus::Done;
    h.episodes.insert(ep1);

    let mut ep2 = Episode::new(
        project.id,
        2,
        "Episode 2".to_string(),
        "next".to_string(),
        10,
        GenerationOptions {
            include_sound_effects: false,
            include_background_music: false,
        },
    );
    ep2.status = EpisodeStatus::Draft;
    h.episodes.insert(ep2.clone());

    h.service.generate_script(ep2.id, None).await.unwrap();

    let contexts = h.writer.received_contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(
        contexts[0].previous_script_text.as_deref(),
        Some("full script of one")
    );
    let stored = h.episodes.snapshot(ep2.id).unwrap();
    assert_eq!(stored.status, EpisodeStatus::ScriptDone);
}
