use async_trait::async_trait;

/// Identifier of one submitted generation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTaskId(pub String);

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub reference_image_urls: Vec<String>,
    pub aspect_ratio: String,
}

/// Poll result for a submitted task.
#[derive(Debug, Clone)]
pub enum ImageTaskStatus {
    Pending,
    Success { url: String },
    Failed { message: String },
}

/// Asynchronous, task-based image generation: submission returns a task id,
/// completion is discovered by polling.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn submit(&self, request: &ImageRequest) -> Result<ImageTaskId, ImageGeneratorError>;

    async fn poll(&self, task_id: &ImageTaskId) -> Result<ImageTaskStatus, ImageGeneratorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageGeneratorError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("no task id returned by provider")]
    NoTaskId,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("missing api key")]
    MissingApiKey,
}
