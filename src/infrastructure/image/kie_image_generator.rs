use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::application::ports::{
    ImageGenerator, ImageGeneratorError, ImageRequest, ImageTaskId, ImageTaskStatus,
};

/// Task-based image generation via the Kie.ai jobs API: one POST to submit,
/// then polling a record endpoint until the task settles.
pub struct KieImageGenerator {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl KieImageGenerator {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        base_url: String,
        model: String,
    ) -> Result<Self, ImageGeneratorError> {
        if api_key.trim().is_empty() {
            return Err(ImageGeneratorError::MissingApiKey);
        }
        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    data: Option<SubmitData>,
}

#[derive(Deserialize)]
struct SubmitData {
    #[serde(rename = "taskId")]
    task_id: Option<String>,
}

#[derive(Deserialize)]
struct RecordResponse {
    #[serde(default)]
    data: Option<RecordData>,
}

#[derive(Deserialize)]
struct RecordData {
    #[serde(default)]
    state: String,
    #[serde(rename = "resultJson", default)]
    result_json: Option<String>,
    #[serde(rename = "failMsg", default)]
    fail_msg: Option<String>,
}

#[derive(Deserialize)]
struct ResultPayload {
    #[serde(rename = "resultUrls", default)]
    result_urls: Vec<String>,
}

#[async_trait]
impl ImageGenerator for KieImageGenerator {
    #[tracing::instrument(skip(self, request))]
    async fn submit(&self, request: &ImageRequest) -> Result<ImageTaskId, ImageGeneratorError> {
        let mut input = json!({
            "prompt": request.prompt,
            "aspect_ratio": request.aspect_ratio,
        });
        if !request.reference_image_urls.is_empty() {
            input["image_urls"] = json!(request.reference_image_urls);
        }

        let response = self
            .http
            .post(format!("{}/api/v1/jobs/createTask", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": input,
            }))
            .send()
            .await
            .map_err(|e| ImageGeneratorError::ApiRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGeneratorError::ApiRequestFailed(format!(
                "{}: {}",
                status, body
            )));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ImageGeneratorError::InvalidResponse(e.to_string()))?;

        body.data
            .and_then(|d| d.task_id)
            .map(ImageTaskId)
            .ok_or(ImageGeneratorError::NoTaskId)
    }

    async fn poll(&self, task_id: &ImageTaskId) -> Result<ImageTaskStatus, ImageGeneratorError> {
        let response = self
            .http
            .get(format!("{}/api/v1/jobs/recordInfo", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[("taskId", task_id.0.as_str())])
            .send()
            .await
            .map_err(|e| ImageGeneratorError::ApiRequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGeneratorError::ApiRequestFailed(format!(
                "{}: {}",
                status, body
            )));
        }

        let body: RecordResponse = response
            .json()
            .await
            .map_err(|e| ImageGeneratorError::InvalidResponse(e.to_string()))?;

        let Some(data) = body.data else {
            return Ok(ImageTaskStatus::Pending);
        };

        match data.state.as_str() {
            "success" => {
                // Result URLs arrive as a JSON string inside the record.
                let payload = data.result_json.ok_or_else(|| {
                    ImageGeneratorError::InvalidResponse("success without result".to_string())
                })?;
                let result: ResultPayload = serde_json::from_str(&payload)
                    .map_err(|e| ImageGeneratorError::InvalidResponse(e.to_string()))?;
                let url = result.result_urls.into_iter().next().ok_or_else(|| {
                    ImageGeneratorError::InvalidResponse("success without urls".to_string())
                })?;
                Ok(ImageTaskStatus::Success { url })
            }
            "fail" => Ok(ImageTaskStatus::Failed {
                message: data
                    .fail_msg
                    .unwrap_or_else(|| "generation failed".to_string()),
            }),
            _ => Ok(ImageTaskStatus::Pending),
        }
    }
}
