use std::sync::Arc;

use serde::Serialize;

use crate::application::ports::{
    AudioMixer, BlobStore, DialogueInput, EpisodeRepository, ImageGenerator, MixTrack,
    ProjectRepository, RepositoryError, ScriptWriter, Speaker, TimingEstimator,
};
use crate::domain::{
    BlobUrl, CoverArt, Episode, EpisodeId, EpisodeStatus, FinalAudio, MusicTrack, Project,
    SoundEffect, VoiceAudio,
};

use super::continuation_planner::ContinuationPlanner;
use super::cover_workflow::{CoverPromptInputs, CoverWorkflow};
use super::dialogue_splitter::split_into_parts;

/// Tunables shared by every stage. Values come from settings at wiring time.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Character budget of one TTS request; longer scripts are split.
    pub max_chars_per_request: usize,
    pub sound_effect_duration_seconds: f64,
    pub sound_effect_prompt_influence: f64,
    pub voice_volume: f64,
    pub sounds_volume: f64,
    pub music_volume: f64,
    pub cover_aspect_ratio: String,
    pub cover_prompt_template: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chars_per_request: 3000,
            sound_effect_duration_seconds: 3.0,
            sound_effect_prompt_influence: 0.3,
            voice_volume: 1.0,
            sounds_volume: 0.8,
            music_volume: 0.3,
            cover_aspect_ratio: "1:1".to_string(),
            cover_prompt_template: None,
        }
    }
}

/// One named unit of the pipeline as walked for progress reporting. The
/// `enabled` predicate makes optional-stage skipping first-class instead of
/// an index table.
pub struct StageDescriptor {
    pub name: &'static str,
    pub in_progress: EpisodeStatus,
    pub done: EpisodeStatus,
    pub enabled: fn(&Episode) -> bool,
}

fn always(_: &Episode) -> bool {
    true
}

fn sounds_enabled(episode: &Episode) -> bool {
    episode.options.include_sound_effects
}

fn music_enabled(episode: &Episode) -> bool {
    episode.options.include_background_music
}

pub const STAGES: &[StageDescriptor] = &[
    StageDescriptor {
        name: "script",
        in_progress: EpisodeStatus::ScriptGenerating,
        done: EpisodeStatus::ScriptDone,
        enabled: always,
    },
    StageDescriptor {
        name: "voiceover",
        in_progress: EpisodeStatus::VoiceoverGenerating,
        done: EpisodeStatus::VoiceoverDone,
        enabled: always,
    },
    StageDescriptor {
        name: "sounds",
        in_progress: EpisodeStatus::SoundsGenerating,
        done: EpisodeStatus::SoundsDone,
        enabled: sounds_enabled,
    },
    StageDescriptor {
        name: "music",
        in_progress: EpisodeStatus::MusicGenerating,
        done: EpisodeStatus::MusicDone,
        enabled: music_enabled,
    },
    StageDescriptor {
        name: "merge",
        in_progress: EpisodeStatus::Merging,
        done: EpisodeStatus::AudioDone,
        enabled: always,
    },
    StageDescriptor {
        name: "cover",
        in_progress: EpisodeStatus::CoverGenerating,
        done: EpisodeStatus::Done,
        enabled: always,
    },
];

/// Per-step outcome reported by a full pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    InProgress,
    Done,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub script_status: StepState,
    pub voiceover_status: StepState,
    pub sounds_status: StepState,
    pub music_status: StepState,
    pub merge_status: StepState,
    pub cover_status: StepState,
    pub final_audio_url: Option<BlobUrl>,
    pub final_audio_duration_seconds: Option<f64>,
    pub cover_url: Option<BlobUrl>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub generate_cover: bool,
    pub cover_variants_count: usize,
    pub custom_prompt: Option<String>,
    /// When set, stages whose artifact already exists are reported done
    /// without re-invoking their provider. Off by default: a plain rerun
    /// regenerates everything.
    pub resume: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationStatus {
    pub status: EpisodeStatus,
    pub current_step: String,
    pub steps_completed: Vec<String>,
    pub steps_remaining: Vec<String>,
    pub error_message: Option<String>,
    pub script_ready: bool,
    pub voiceover_ready: bool,
    pub sounds_ready: bool,
    pub music_ready: bool,
    pub audio_ready: bool,
    pub cover_ready: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Caller mistake; the episode row is left untouched.
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("episode not found: {0}")]
    NotFound(String),
    /// A stage's external call failed. The episode is frozen at the failing
    /// stage with `status = error` and the message recorded.
    #[error("{stage} stage failed: {message}")]
    StageFailed {
        stage: &'static str,
        message: String,
    },
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

/// The episode state machine. One method per stage; each enforces its own
/// precondition, persists intermediate state after the stage commits, and
/// translates external failure into a recorded error state without
/// discarding prior artifacts.
pub struct PipelineService<W, S, G>
where
    W: ScriptWriter,
    S: Speaker,
    G: ImageGenerator,
{
    script_writer: Arc<W>,
    speaker: Arc<S>,
    cover_workflow: Arc<CoverWorkflow<G>>,
    blob_store: Arc<dyn BlobStore>,
    mixer: Arc<dyn AudioMixer>,
    episodes: Arc<dyn EpisodeRepository>,
    projects: Arc<dyn ProjectRepository>,
    timing: Arc<dyn TimingEstimator>,
    config: PipelineConfig,
}

impl<W, S, G> PipelineService<W, S, G>
where
    W: ScriptWriter,
    S: Speaker,
    G: ImageGenerator,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        script_writer: Arc<W>,
        speaker: Arc<S>,
        cover_workflow: Arc<CoverWorkflow<G>>,
        blob_store: Arc<dyn BlobStore>,
        mixer: Arc<dyn AudioMixer>,
        episodes: Arc<dyn EpisodeRepository>,
        projects: Arc<dyn ProjectRepository>,
        timing: Arc<dyn TimingEstimator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            script_writer,
            speaker,
            cover_workflow,
            blob_store,
            mixer,
            episodes,
            projects,
            timing,
            config,
        }
    }

    async fn load_episode(&self, id: EpisodeId) -> Result<Episode, PipelineError> {
        self.episodes
            .get_by_id(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.as_uuid().to_string()))
    }

    async fn load_project(&self, episode: &Episode) -> Result<Project, PipelineError> {
        self.projects
            .get_by_id(episode.project_id)
            .await?
            .ok_or_else(|| {
                PipelineError::NotFound(format!(
                    "project {}",
                    episode.project_id.as_uuid()
                ))
            })
    }

    fn guard_not_running(&self, episode: &Episode) -> Result<(), PipelineError> {
        if episode.status.is_in_progress() {
            return Err(PipelineError::PreconditionFailed(format!(
                "a generation stage is already running (status: {})",
                episode.status
            )));
        }
        Ok(())
    }

    /// Enters a stage: clears the previous error and persists the
    /// in-progress status so concurrent invocations observe it.
    async fn enter_stage(
        &self,
        episode: &mut Episode,
        status: EpisodeStatus,
    ) -> Result<(), PipelineError> {
        episode.status = status;
        episode.error_message = None;
        self.touch_and_save(episode).await
    }

    async fn touch_and_save(&self, episode: &mut Episode) -> Result<(), PipelineError> {
        episode.updated_at = chrono::Utc::now();
        self.episodes.update(episode).await?;
        Ok(())
    }

    /// Freezes the episode at the failing stage. Artifacts committed by
    /// earlier stages stay in place; only the status and message change.
    async fn fail_stage(
        &self,
        episode: &mut Episode,
        stage: &'static str,
        message: String,
    ) -> PipelineError {
        tracing::error!(
            episode_id = %episode.id.as_uuid(),
            stage,
            error = %message,
            "Pipeline stage failed"
        );
        episode.status = EpisodeStatus::Error;
        episode.error_message = Some(message.clone());
        if let Err(e) = self.touch_and_save(episode).await {
            tracing::error!(error = %e, "Failed to persist error state");
        }
        PipelineError::StageFailed { stage, message }
    }

    /// Best-effort blob cleanup before regeneration. Deletion failures are
    /// logged and swallowed by policy.
    async fn delete_stale(&self, url: &BlobUrl) {
        if let Err(e) = self.blob_store.delete(url).await {
            tracing::warn!(url = %url, error = %e, "Failed to delete stale artifact");
        }
    }

    // ---- script ---------------------------------------------------------

    /// Legal from any non-running state; re-running overwrites the previous
    /// script. No partial script is persisted on failure.
    #[tracing::instrument(skip(self, custom_prompt), fields(episode_id = %episode_id.as_uuid()))]
    pub async fn generate_script(
        &self,
        episode_id: EpisodeId,
        custom_prompt: Option<String>,
    ) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;
        self.guard_not_running(&episode)?;

        let project = self.load_project(&episode).await?;
        let characters = self.projects.characters(project.id).await?;
        let previous = if episode.episode_number > 1 {
            self.episodes
                .previous_episodes(project.id, episode.episode_number)
                .await?
        } else {
            Vec::new()
        };

        self.enter_stage(&mut episode, EpisodeStatus::ScriptGenerating)
            .await?;

        let context = ContinuationPlanner::build_context(
            &project,
            &episode,
            &characters,
            &previous,
            custom_prompt,
        );

        let script = match self.script_writer.generate_script(&context).await {
            Ok(script) => script,
            Err(e) => return Err(self.fail_stage(&mut episode, "script", e.to_string()).await),
        };

        episode.script_text = Some(script.render_text());
        if episode.title_auto_generated && !script.title.is_empty() {
            episode.title = script.title.clone();
        }
        episode.script = Some(script);
        episode.status = EpisodeStatus::ScriptDone;
        self.touch_and_save(&mut episode).await?;

        tracing::info!(
            lines = episode.script.as_ref().map(|s| s.lines.len()).unwrap_or(0),
            "Script generated"
        );
        Ok(episode)
    }

    // ---- voiceover ------------------------------------------------------

    /// Requires a non-empty script. The previously stored narration blob is
    /// deleted before regeneration so no orphan survives the success path.
    #[tracing::instrument(skip(self), fields(episode_id = %episode_id.as_uuid()))]
    pub async fn generate_voiceover(&self, episode_id: EpisodeId) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;
        self.guard_not_running(&episode)?;

        if !episode.has_script() {
            return Err(PipelineError::PreconditionFailed(
                "episode must have a script before generating voiceover".to_string(),
            ));
        }

        if let Some(previous) = episode.voice_audio.take() {
            self.delete_stale(&previous.url).await;
        }

        self.enter_stage(&mut episode, EpisodeStatus::VoiceoverGenerating)
            .await?;

        match self.render_voiceover(&episode).await {
            Ok(voice_audio) => {
                episode.voice_audio = Some(voice_audio);
                episode.status = EpisodeStatus::VoiceoverDone;
                self.touch_and_save(&mut episode).await?;
                Ok(episode)
            }
            Err(message) => Err(self.fail_stage(&mut episode, "voiceover", message).await),
        }
    }

    async fn render_voiceover(&self, episode: &Episode) -> Result<VoiceAudio, String> {
        let script = episode.script.as_ref().ok_or("script missing")?;

        let parts = split_into_parts(&script.lines, self.config.max_chars_per_request);

        let mut audio_parts = Vec::new();
        let mut alignment_parts = Vec::new();
        for part in &parts {
            let inputs = dialogue_inputs(part)?;
            let (audio, alignment) = self
                .speaker
                .render_dialogue(&inputs)
                .await
                .map_err(|e| e.to_string())?;
            audio_parts.push(audio);
            alignment_parts.push(alignment);
        }

        let part_count = audio_parts.len() as u32;
        let url = if audio_parts.len() > 1 {
            self.mixer
                .concatenate(audio_parts)
                .await
                .map_err(|e| e.to_string())?
        } else {
            let single = audio_parts.into_iter().next().ok_or("no audio rendered")?;
            self.blob_store
                .save(single, "audio", "mp3")
                .await
                .map_err(|e| e.to_string())?
        };

        let duration = self.mixer.duration(&url).await.map_err(|e| e.to_string())?;

        Ok(VoiceAudio {
            url,
            duration_seconds: duration,
            parts: part_count,
            alignment: serde_json::json!({
                "parts": alignment_parts,
                "total_parts": part_count,
            }),
        })
    }

    // ---- sounds ---------------------------------------------------------

    /// Requires narration and the sound-effects flag. A script with zero
    /// cues still completes the stage with an empty list.
    #[tracing::instrument(skip(self), fields(episode_id = %episode_id.as_uuid()))]
    pub async fn generate_sounds(&self, episode_id: EpisodeId) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;
        self.guard_not_running(&episode)?;

        if episode.voice_audio.is_none() {
            return Err(PipelineError::PreconditionFailed(
                "episode must have voiceover before generating sounds".to_string(),
            ));
        }
        if !episode.options.include_sound_effects {
            return Err(PipelineError::PreconditionFailed(
                "sound effects are disabled for this episode".to_string(),
            ));
        }

        self.enter_stage(&mut episode, EpisodeStatus::SoundsGenerating)
            .await?;

        match self.render_sounds(&episode).await {
            Ok(sounds) => {
                episode.sounds = Some(sounds);
                episode.status = EpisodeStatus::SoundsDone;
                self.touch_and_save(&mut episode).await?;
                Ok(episode)
            }
            Err(message) => Err(self.fail_stage(&mut episode, "sounds", message).await),
        }
    }

    async fn render_sounds(&self, episode: &Episode) -> Result<Vec<SoundEffect>, String> {
        let script = episode.script.as_ref().ok_or("script missing")?;
        let spans = self.timing.line_spans(&script.lines);

        let mut generated = Vec::new();
        for (index, line) in script.lines.iter().enumerate() {
            let Some(prompt) = &line.sound_effect else {
                continue;
            };
            let audio = self
                .speaker
                .render_sound_effect(
                    prompt,
                    self.config.sound_effect_duration_seconds,
                    self.config.sound_effect_prompt_influence,
                )
                .await
                .map_err(|e| e.to_string())?;
            let url = self
                .blob_store
                .save(audio, "audio", "mp3")
                .await
                .map_err(|e| e.to_string())?;

            // Cue lands at the end of its line's estimated span.
            generated.push(SoundEffect {
                prompt: prompt.clone(),
                url,
                start_time_seconds: spans[index].end_seconds,
                duration_seconds: self.config.sound_effect_duration_seconds,
                line_index: index,
            });
        }

        Ok(generated)
    }

    // ---- music ----------------------------------------------------------

    /// Requires narration and the background-music flag.
    #[tracing::instrument(skip(self), fields(episode_id = %episode_id.as_uuid()))]
    pub async fn generate_music(&self, episode_id: EpisodeId) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;
        self.guard_not_running(&episode)?;

        let Some(voice_audio) = episode.voice_audio.clone() else {
            return Err(PipelineError::PreconditionFailed(
                "episode must have voiceover before generating music".to_string(),
            ));
        };
        if !episode.options.include_background_music {
            return Err(PipelineError::PreconditionFailed(
                "background music is disabled for this episode".to_string(),
            ));
        }

        let project = self.load_project(&episode).await?;

        self.enter_stage(&mut episode, EpisodeStatus::MusicGenerating)
            .await?;

        let atmosphere = project
            .musical_atmosphere
            .clone()
            .unwrap_or_else(|| project.genre_tone.clone());
        let prompt = format!(
            "{}, instrumental background music for audiobook, ambient, atmospheric",
            atmosphere
        );
        let duration_ms = (voice_audio.duration_seconds * 1000.0) as u64;

        match self.render_music(&prompt, duration_ms).await {
            Ok(music) => {
                episode.music = Some(music);
                episode.status = EpisodeStatus::MusicDone;
                self.touch_and_save(&mut episode).await?;
                Ok(episode)
            }
            Err(message) => Err(self.fail_stage(&mut episode, "music", message).await),
        }
    }

    async fn render_music(&self, prompt: &str, duration_ms: u64) -> Result<MusicTrack, String> {
        let plan = self
            .speaker
            .plan_music(prompt, duration_ms)
            .await
            .map_err(|e| e.to_string())?;
        let audio = self
            .speaker
            .render_music(&plan, true)
            .await
            .map_err(|e| e.to_string())?;
        let url = self
            .blob_store
            .save(audio, "audio", "mp3")
            .await
            .map_err(|e| e.to_string())?;
        Ok(MusicTrack {
            url,
            composition_plan: plan,
        })
    }

    // ---- merge ----------------------------------------------------------

    /// Mixes narration with sounds and music. The flags, not artifact
    /// presence, decide inclusion: a disabled stage's artifact is excluded
    /// even when it exists.
    #[tracing::instrument(skip(self), fields(episode_id = %episode_id.as_uuid()))]
    pub async fn merge(&self, episode_id: EpisodeId) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;
        self.guard_not_running(&episode)?;

        let Some(voice_audio) = episode.voice_audio.clone() else {
            return Err(PipelineError::PreconditionFailed(
                "episode must have voiceover before merging".to_string(),
            ));
        };

        self.enter_stage(&mut episode, EpisodeStatus::Merging).await?;

        let mut tracks = Vec::new();
        if episode.options.include_sound_effects {
            if let Some(sounds) = &episode.sounds {
                tracks.extend(sounds.iter().map(|s| MixTrack {
                    url: s.url.clone(),
                    volume: self.config.sounds_volume,
                    start_offset_seconds: s.start_time_seconds,
                }));
            }
        }
        if episode.options.include_background_music {
            if let Some(music) = &episode.music {
                tracks.push(MixTrack {
                    url: music.url.clone(),
                    volume: self.config.music_volume,
                    start_offset_seconds: 0.0,
                });
            }
        }

        match self
            .mixer
            .mix(&voice_audio.url, self.config.voice_volume, &tracks)
            .await
        {
            Ok((url, duration)) => {
                episode.final_audio = Some(FinalAudio {
                    url,
                    duration_seconds: duration,
                });
                episode.status = EpisodeStatus::AudioDone;
                self.touch_and_save(&mut episode).await?;
                Ok(episode)
            }
            Err(e) => Err(self.fail_stage(&mut episode, "merge", e.to_string()).await),
        }
    }

    // ---- cover ----------------------------------------------------------

    /// No precondition on prior stages. All previously stored cover blobs
    /// are deleted before regeneration; the first produced variant is
    /// auto-selected.
    #[tracing::instrument(skip(self, custom_prompt, reference_image_urls), fields(episode_id = %episode_id.as_uuid()))]
    pub async fn generate_cover(
        &self,
        episode_id: EpisodeId,
        variants_count: usize,
        custom_prompt: Option<String>,
        reference_image_urls: Vec<String>,
    ) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;
        self.guard_not_running(&episode)?;

        let project = self.load_project(&episode).await?;

        if let Some(previous) = episode.cover.take() {
            for variant in &previous.variants {
                self.delete_stale(&variant.url).await;
            }
        }

        self.enter_stage(&mut episode, EpisodeStatus::CoverGenerating)
            .await?;

        let prompt_inputs = CoverPromptInputs {
            title: if episode.title.is_empty() {
                project.title.clone()
            } else {
                episode.title.clone()
            },
            genre_tone: project.genre_tone.clone(),
            synopsis: episode
                .summary
                .clone()
                .unwrap_or_else(|| episode.description.clone()),
            project_title: Some(project.title.clone()),
            episode_number: Some(episode.episode_number),
            custom_instructions: custom_prompt,
        };
        let prompt = CoverWorkflow::<G>::build_prompt(
            &prompt_inputs,
            self.config.cover_prompt_template.as_deref(),
        );

        let reference = reference_image_urls.first().cloned();

        match self
            .cover_workflow
            .generate_variants(
                &prompt,
                variants_count,
                &reference_image_urls,
                &self.config.cover_aspect_ratio,
            )
            .await
        {
            Ok(urls) => {
                episode.cover = CoverArt::from_variants(urls, reference);
                episode.status = EpisodeStatus::Done;
                self.touch_and_save(&mut episode).await?;
                Ok(episode)
            }
            Err(e) => Err(self.fail_stage(&mut episode, "cover", e.to_string()).await),
        }
    }

    /// Removes cover variant `index` and deletes its blob best-effort.
    /// Removing the selected variant promotes the first remaining one;
    /// removing the last variant clears the cover entirely.
    pub async fn remove_cover_variant(
        &self,
        episode_id: EpisodeId,
        index: usize,
    ) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;

        let Some(cover) = &episode.cover else {
            return Err(PipelineError::PreconditionFailed(
                "no cover variants available".to_string(),
            ));
        };
        let Some(remaining) = cover.with_removed(index) else {
            return Err(PipelineError::PreconditionFailed(format!(
                "invalid variant index: {}",
                index
            )));
        };

        let removed_url = cover.variants[index].url.clone();
        self.delete_stale(&removed_url).await;

        episode.cover = remaining;
        self.touch_and_save(&mut episode).await?;
        Ok(episode)
    }

    /// Re-points the primary cover at variant `index`. A caller mistake
    /// (no variants, out-of-range index) never mutates the episode.
    pub async fn select_cover_variant(
        &self,
        episode_id: EpisodeId,
        index: usize,
    ) -> Result<Episode, PipelineError> {
        let mut episode = self.load_episode(episode_id).await?;

        let Some(cover) = &episode.cover else {
            return Err(PipelineError::PreconditionFailed(
                "no cover variants available".to_string(),
            ));
        };
        let Some(selected) = cover.with_selected(index) else {
            return Err(PipelineError::PreconditionFailed(format!(
                "invalid variant index: {}",
                index
            )));
        };

        episode.cover = Some(selected);
        self.touch_and_save(&mut episode).await?;
        Ok(episode)
    }

    // ---- full run -------------------------------------------------------

    /// Runs every stage in order, honoring the per-episode flags and the
    /// resume option, then generates the continuation summary and marks the
    /// episode done. The first failing stage aborts the run; artifacts
    /// committed by earlier stages stay in place.
    #[tracing::instrument(skip(self, options), fields(episode_id = %episode_id.as_uuid()))]
    pub async fn run_full(
        &self,
        episode_id: EpisodeId,
        options: RunOptions,
    ) -> Result<PipelineReport, PipelineError> {
        let episode = self.load_episode(episode_id).await?;
        self.guard_not_running(&episode)?;

        let mut report = PipelineReport {
            script_status: StepState::Pending,
            voiceover_status: StepState::Pending,
            sounds_status: if episode.options.include_sound_effects {
                StepState::Pending
            } else {
                StepState::Skipped
            },
            music_status: if episode.options.include_background_music {
                StepState::Pending
            } else {
                StepState::Skipped
            },
            merge_status: StepState::Pending,
            cover_status: if options.generate_cover {
                StepState::Pending
            } else {
                StepState::Skipped
            },
            final_audio_url: None,
            final_audio_duration_seconds: None,
            cover_url: None,
        };

        // Script
        let mut episode = if options.resume && episode.has_script() {
            report.script_status = StepState::Done;
            episode
        } else {
            report.script_status = StepState::InProgress;
            let episode = self
                .generate_script(episode_id, options.custom_prompt.clone())
                .await?;
            report.script_status = StepState::Done;
            episode
        };

        // Voiceover
        if options.resume && episode.voice_audio.is_some() {
            report.voiceover_status = StepState::Done;
        } else {
            report.voiceover_status = StepState::InProgress;
            episode = self.generate_voiceover(episode_id).await?;
            report.voiceover_status = StepState::Done;
        }

        // Sounds
        if episode.options.include_sound_effects {
            if options.resume && episode.sounds.is_some() {
                report.sounds_status = StepState::Done;
            } else {
                report.sounds_status = StepState::InProgress;
                episode = self.generate_sounds(episode_id).await?;
                report.sounds_status = StepState::Done;
            }
        }

        // Music
        if episode.options.include_background_music {
            if options.resume && episode.music.is_some() {
                report.music_status = StepState::Done;
            } else {
                report.music_status = StepState::InProgress;
                episode = self.generate_music(episode_id).await?;
                report.music_status = StepState::Done;
            }
        }

        // Merge
        if options.resume && episode.final_audio.is_some() {
            report.merge_status = StepState::Done;
        } else {
            report.merge_status = StepState::InProgress;
            episode = self.merge(episode_id).await?;
            report.merge_status = StepState::Done;
        }
        if let Some(final_audio) = &episode.final_audio {
            report.final_audio_url = Some(final_audio.url.clone());
            report.final_audio_duration_seconds = Some(final_audio.duration_seconds);
        }

        // Cover
        if options.generate_cover {
            if options.resume && episode.cover.is_some() {
                report.cover_status = StepState::Done;
            } else {
                report.cover_status = StepState::InProgress;
                episode = self
                    .generate_cover(
                        episode_id,
                        options.cover_variants_count.max(1),
                        None,
                        Vec::new(),
                    )
                    .await?;
                report.cover_status = StepState::Done;
            }
            report.cover_url = episode.cover.as_ref().map(|c| c.url.clone());
        }

        // Summary for future continuations, then terminal state.
        if let Some(script_text) = episode.script_text.clone() {
            match self.script_writer.summarize(&script_text).await {
                Ok(summary) => episode.summary = Some(summary),
                Err(e) => {
                    return Err(self
                        .fail_stage(&mut episode, "summary", e.to_string())
                        .await);
                }
            }
        }

        episode.status = EpisodeStatus::Done;
        self.touch_and_save(&mut episode).await?;

        tracing::info!("Full pipeline completed");
        Ok(report)
    }

    // ---- status ---------------------------------------------------------

    /// Progress report built by walking the ordered stage descriptors, with
    /// optional stages filtered by their enabled predicate.
    pub async fn generation_status(
        &self,
        episode_id: EpisodeId,
    ) -> Result<GenerationStatus, PipelineError> {
        let episode = self.load_episode(episode_id).await?;
        Ok(build_generation_status(&episode))
    }
}

/// Resolves script lines into TTS inputs. Every line needs a voice
/// reference by the time narration is rendered.
fn dialogue_inputs(lines: &[crate::domain::ScriptLine]) -> Result<Vec<DialogueInput>, String> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let voice_id = line
                .voice_id
                .clone()
                .ok_or_else(|| format!("line {} ({}) has no voice reference", i, line.speaker))?;
            Ok(DialogueInput {
                voice_id,
                text: line.text.clone(),
            })
        })
        .collect()
}

pub fn build_generation_status(episode: &Episode) -> GenerationStatus {
    let enabled: Vec<&StageDescriptor> = STAGES
        .iter()
        .filter(|stage| (stage.enabled)(episode))
        .collect();
    let all_names: Vec<String> = enabled.iter().map(|s| s.name.to_string()).collect();

    let (current_step, steps_completed, steps_remaining) = match episode.status {
        EpisodeStatus::Error => ("error".to_string(), Vec::new(), all_names.clone()),
        EpisodeStatus::Done => ("done".to_string(), all_names.clone(), Vec::new()),
        EpisodeStatus::Draft => (
            all_names
                .first()
                .cloned()
                .unwrap_or_else(|| "done".to_string()),
            Vec::new(),
            all_names.clone(),
        ),
        status => {
            // Position of the stage whose marker matches the status. A done
            // marker means every enabled stage up to and including it is
            // complete; an in-progress marker stops one short.
            let matched = enabled.iter().position(|stage| {
                status == stage.in_progress || status == stage.done
            });

            match matched {
                Some(i) => {
                    let stage_is_done = status == enabled[i].done;
                    let boundary = if stage_is_done { i + 1 } else { i };
                    let completed = all_names[..boundary].to_vec();
                    let remaining = all_names[boundary..].to_vec();
                    let current = remaining
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "done".to_string());
                    (current, completed, remaining)
                }
                // Status belongs to a stage the flags later disabled.
                // Report everything as remaining from the front.
                None => (
                    all_names
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "done".to_string()),
                    Vec::new(),
                    all_names.clone(),
                ),
            }
        }
    };

    GenerationStatus {
        status: episode.status,
        current_step,
        steps_completed,
        steps_remaining,
        error_message: episode.error_message.clone(),
        script_ready: episode.has_script(),
        voiceover_ready: episode.voice_audio.is_some(),
        sounds_ready: if episode.options.include_sound_effects {
            episode.sounds.is_some()
        } else {
            true
        },
        music_ready: if episode.options.include_background_music {
            episode.music.is_some()
        } else {
            true
        },
        audio_ready: episode.final_audio.is_some(),
        cover_ready: episode.cover.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GenerationOptions, ProjectId};

    fn episode_with(
        status: EpisodeStatus,
        sounds: bool,
        music: bool,
    ) -> Episode {
        let mut episode = Episode::new(
            ProjectId::new(),
            1,
            "Test".to_string(),
            "desc".to_string(),
            10,
            GenerationOptions {
                include_sound_effects: sounds,
                include_background_music: music,
            },
        );
        episode.status = status;
        episode
    }

    #[test]
    fn draft_episode_reports_all_stages_remaining() {
        let status = build_generation_status(&episode_with(EpisodeStatus::Draft, true, true));

        assert_eq!(status.current_step, "script");
        assert!(status.steps_completed.is_empty());
        assert_eq!(
            status.steps_remaining,
            vec!["script", "voiceover", "sounds", "music", "merge", "cover"]
        );
    }

    #[test]
    fn disabled_stages_are_absent_from_the_walk() {
        let status = build_generation_status(&episode_with(EpisodeStatus::Draft, false, false));

        assert_eq!(
            status.steps_remaining,
            vec!["script", "voiceover", "merge", "cover"]
        );
    }

    #[test]
    fn done_status_of_a_stage_makes_it_completed() {
        let status =
            build_generation_status(&episode_with(EpisodeStatus::VoiceoverDone, false, false));

        assert_eq!(status.steps_completed, vec!["script", "voiceover"]);
        assert_eq!(status.current_step, "merge");
        assert_eq!(status.steps_remaining, vec!["merge", "cover"]);
    }

    #[test]
    fn in_progress_stage_is_current_and_remaining() {
        let status =
            build_generation_status(&episode_with(EpisodeStatus::SoundsGenerating, true, false));

        assert_eq!(status.current_step, "sounds");
        assert_eq!(status.steps_completed, vec!["script", "voiceover"]);
        assert_eq!(status.steps_remaining, vec!["sounds", "merge", "cover"]);
    }

    #[test]
    fn error_status_reports_everything_remaining() {
        let mut episode = episode_with(EpisodeStatus::Error, false, false);
        episode.error_message = Some("tts failed".to_string());

        let status = build_generation_status(&episode);

        assert_eq!(status.current_step, "error");
        assert!(status.steps_completed.is_empty());
        assert_eq!(status.error_message.as_deref(), Some("tts failed"));
    }

    #[test]
    fn done_episode_reports_everything_completed() {
        let status = build_generation_status(&episode_with(EpisodeStatus::Done, true, true));

        assert_eq!(status.current_step, "done");
        assert!(status.steps_remaining.is_empty());
        assert_eq!(status.steps_completed.len(), 6);
    }

    #[test]
    fn disabled_optional_stages_report_ready() {
        let status = build_generation_status(&episode_with(EpisodeStatus::Draft, false, false));

        assert!(status.sounds_ready);
        assert!(status.music_ready);
        assert!(!status.script_ready);
    }
}
