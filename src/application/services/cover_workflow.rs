use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::application::ports::{
    BlobStore, BlobStoreError, ImageGenerator, ImageGeneratorError, ImageRequest, ImageTaskStatus,
};
use crate::domain::BlobUrl;

/// Inputs for cover prompt assembly.
#[derive(Debug, Clone, Default)]
pub struct CoverPromptInputs {
    pub title: String,
    pub genre_tone: String,
    pub synopsis: String,
    pub project_title: Option<String>,
    pub episode_number: Option<i32>,
    pub custom_instructions: Option<String>,
}

/// Submit/poll fan-out for cover variants. Each variant runs its own
/// submit+poll cycle; cycles run concurrently and the join tolerates partial
/// failure: one successful variant is enough, zero fails the step.
pub struct CoverWorkflow<G: ImageGenerator> {
    generator: Arc<G>,
    blob_store: Arc<dyn BlobStore>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl<G: ImageGenerator> CoverWorkflow<G> {
    pub fn new(
        generator: Arc<G>,
        blob_store: Arc<dyn BlobStore>,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            generator,
            blob_store,
            poll_interval,
            max_wait,
        }
    }

    /// Builds the image prompt. A caller-supplied template replaces the
    /// default wholesale; custom instructions are appended either way.
    pub fn build_prompt(inputs: &CoverPromptInputs, template: Option<&str>) -> String {
        let mut series_info = String::new();
        if let Some(project_title) = &inputs.project_title {
            series_info.push_str(&format!("Series: {}\n", project_title));
        }
        if let Some(number) = inputs.episode_number {
            series_info.push_str(&format!("Episode: #{}\n", number));
        }

        let synopsis: String = inputs.synopsis.chars().take(500).collect();

        let base = match template {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => format!(
                "Create a professional audiobook cover image.\n\n\
                 STORY CONTENT:\n{series_info}Title: {title}\nGenre: {genre}\nSynopsis: {synopsis}\n\n\
                 COMPOSITION:\n\
                 - Main visual in the center, striking and memorable\n\
                 - High contrast for readability at small sizes\n\
                 - Cinematic lighting, professional typography",
                series_info = series_info,
                title = inputs.title,
                genre = inputs.genre_tone,
                synopsis = synopsis,
            ),
        };

        match &inputs.custom_instructions {
            Some(extra) if !extra.trim().is_empty() => {
                format!("{}\n\nAdditional instructions: {}", base, extra)
            }
            _ => base,
        }
    }

    /// Generates `count` variants (clamped to 1..=4) concurrently, persists
    /// each successful provider URL into the blob store, and returns the
    /// stored URLs in completion-slot order. Fails only when every variant
    /// failed.
    pub async fn generate_variants(
        &self,
        prompt: &str,
        count: usize,
        reference_image_urls: &[String],
        aspect_ratio: &str,
    ) -> Result<Vec<BlobUrl>, CoverWorkflowError> {
        let count = count.clamp(1, 4);

        let request = ImageRequest {
            prompt: prompt.to_string(),
            reference_image_urls: reference_image_urls.to_vec(),
            aspect_ratio: aspect_ratio.to_string(),
        };

        let cycles = (0..count).map(|_| self.generate_and_wait(&request));
        let results = join_all(cycles).await;

        let mut urls = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(url) => urls.push(url),
                Err(e) => {
                    tracing::warn!(error = %e, "Cover variant generation failed");
                    failures.push(e);
                }
            }
        }

        if urls.is_empty() {
            // Surface the first concrete failure (a timeout reads differently
            // from a provider-reported error) instead of a generic summary.
            return Err(failures
                .into_iter()
                .next()
                .unwrap_or(CoverWorkflowError::AllVariantsFailed));
        }

        let mut stored = Vec::new();
        for url in urls {
            let blob = self.blob_store.save_from_url(&url, "covers").await?;
            stored.push(blob);
        }

        Ok(stored)
    }

    /// One submit+poll cycle. Exceeding the wait cap is a timeout failure,
    /// distinct from a provider-reported failure.
    async fn generate_and_wait(
        &self,
        request: &ImageRequest,
    ) -> Result<String, CoverWorkflowError> {
        let task_id = self.generator.submit(request).await?;

        let mut elapsed = Duration::ZERO;
        while elapsed < self.max_wait {
            tokio::time::sleep(self.poll_interval).await;
            elapsed += self.poll_interval;

            match self.generator.poll(&task_id).await? {
                ImageTaskStatus::Success { url } => return Ok(url),
                ImageTaskStatus::Failed { message } => {
                    return Err(CoverWorkflowError::GenerationFailed(message));
                }
                ImageTaskStatus::Pending => {
                    tracing::debug!(task_id = %task_id.0, "Cover generation in progress");
                }
            }
        }

        Err(CoverWorkflowError::Timeout {
            seconds: self.max_wait.as_secs(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoverWorkflowError {
    #[error("image provider: {0}")]
    Provider(#[from] ImageGeneratorError),
    #[error("cover generation failed: {0}")]
    GenerationFailed(String),
    #[error("cover generation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
    #[error("all cover generations failed")]
    AllVariantsFailed,
    #[error("blob store: {0}")]
    Store(#[from] BlobStoreError),
}
