//! Direct-family adapters: providers called on their own endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use vgen_models::ProviderKey;

use crate::adapter::{AdapterRequest, TaskStatus, VideoAdapter};
use crate::error::{ProviderError, ProviderResult};
use crate::extract::extract_media_url;
use crate::sanitize::I2vIntent;

const RUNWAY_BASE_URL: &str = "https://api.dev.runwayml.com";
const LUMA_BASE_URL: &str = "https://api.lumalabs.ai";

/// Known media URL locations in Runway completion payloads, newest
/// schema first.
const RUNWAY_RESULT_PATHS: &[&str] = &["output.0", "output.url", "artifacts.0.uri"];

/// Known media URL locations in Luma completion payloads.
const LUMA_RESULT_PATHS: &[&str] = &["assets.video", "assets.0.url", "video.url"];

// ---------------------------------------------------------------------------
// Runway
// ---------------------------------------------------------------------------

/// Runway adapter.
pub struct RunwayAdapter {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct RunwayCreateRequest {
    model: String,
    #[serde(rename = "promptText")]
    prompt_text: String,
    #[serde(rename = "promptImage", skip_serializing_if = "Option::is_none")]
    prompt_image: Option<String>,
    /// Runway takes the reference image as a style anchor rather than a
    /// first frame when this is set.
    #[serde(rename = "referenceMode", skip_serializing_if = "Option::is_none")]
    reference_mode: Option<&'static str>,
    duration: u32,
    ratio: String,
}

#[derive(Debug, Deserialize)]
struct RunwayCreateResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunwayTaskResponse {
    status: String,
    #[serde(default)]
    failure: Option<String>,
    #[serde(flatten)]
    rest: Value,
}

impl RunwayAdapter {
    /// Create from `RUNWAY_API_KEY`.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("RUNWAY_API_KEY")
            .map_err(|_| ProviderError::not_configured("RUNWAY_API_KEY not set"))?;
        Ok(Self {
            api_key,
            base_url: RUNWAY_BASE_URL.to_string(),
            client: Client::new(),
        })
    }

    /// Override the base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[cfg(test)]
    fn for_tests(base_url: impl Into<String>) -> Self {
        Self {
            api_key: "test-key".to_string(),
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl VideoAdapter for RunwayAdapter {
    fn provider(&self) -> ProviderKey {
        ProviderKey::Runway
    }

    async fn create_task(&self, request: &AdapterRequest) -> ProviderResult<String> {
        let endpoint = if request.source_image_url.is_some() {
            "image_to_video"
        } else {
            "text_to_video"
        };
        let url = format!("{}/v1/{}", self.base_url, endpoint);

        let body = RunwayCreateRequest {
            model: request.model.clone(),
            prompt_text: request.prompt.clone(),
            prompt_image: request.source_image_url.clone(),
            reference_mode: match request.i2v_intent {
                Some(I2vIntent::NewContent) => Some("reference"),
                Some(I2vIntent::AnimateExisting) => Some("first_frame"),
                None => None,
            },
            duration: request.duration_secs.round() as u32,
            ratio: request.aspect_ratio.as_str().to_string(),
        };

        debug!(model = %body.model, endpoint, "Creating Runway task");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Runway-Version", "2024-11-06")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: ProviderKey::Runway,
                status,
                body,
            });
        }

        let created: RunwayCreateResponse = response.json().await?;
        created.id.ok_or(ProviderError::NoTaskId(ProviderKey::Runway))
    }

    async fn poll_status(&self, task_id: &str) -> ProviderResult<TaskStatus> {
        let url = format!("{}/v1/tasks/{}", self.base_url, task_id);
        let response = self.client.get(&url).bearer_auth(&self.api_key).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: ProviderKey::Runway,
                status,
                body,
            });
        }

        let task: RunwayTaskResponse = response.json().await?;
        Ok(match task.status.as_str() {
            "PENDING" | "THROTTLED" => TaskStatus::Queued,
            "RUNNING" => TaskStatus::Running,
            "SUCCEEDED" => TaskStatus::Complete(task.rest),
            _ => TaskStatus::Failed(
                task.failure
                    .unwrap_or_else(|| format!("task status {}", task.status)),
            ),
        })
    }

    fn extract_result(&self, payload: &Value) -> Option<String> {
        extract_media_url(payload, RUNWAY_RESULT_PATHS)
    }
}

// ---------------------------------------------------------------------------
// Luma
// ---------------------------------------------------------------------------

/// Luma Dream Machine adapter.
pub struct LumaAdapter {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct LumaKeyframe {
    #[serde(rename = "type")]
    kind: &'static str,
    url: String,
}

#[derive(Debug, Serialize, Default)]
struct LumaKeyframes {
    #[serde(skip_serializing_if = "Option::is_none")]
    frame0: Option<LumaKeyframe>,
}

#[derive(Debug, Serialize)]
struct LumaCreateRequest {
    model: String,
    prompt: String,
    aspect_ratio: String,
    /// Luma expresses duration as a string with a unit suffix ("5s").
    duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    keyframes: Option<LumaKeyframes>,
}

#[derive(Debug, Deserialize)]
struct LumaCreateResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LumaGenerationResponse {
    state: String,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(flatten)]
    rest: Value,
}

impl LumaAdapter {
    /// Create from `LUMA_API_KEY`.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("LUMA_API_KEY")
            .map_err(|_| ProviderError::not_configured("LUMA_API_KEY not set"))?;
        Ok(Self {
            api_key,
            base_url: LUMA_BASE_URL.to_string(),
            client: Client::new(),
        })
    }

    /// Override the base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[cfg(test)]
    fn for_tests(base_url: impl Into<String>) -> Self {
        Self {
            api_key: "test-key".to_string(),
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl VideoAdapter for LumaAdapter {
    fn provider(&self) -> ProviderKey {
        ProviderKey::Luma
    }

    async fn create_task(&self, request: &AdapterRequest) -> ProviderResult<String> {
        let url = format!("{}/dream-machine/v1/generations", self.base_url);

        // Luma only takes images as keyframes, so both i2v intents pin
        // the image as frame0; a new-content intent reaches the model
        // through the prompt phrasing alone.
        let keyframes = request.source_image_url.as_ref().map(|image_url| LumaKeyframes {
            frame0: Some(LumaKeyframe {
                kind: "image",
                url: image_url.clone(),
            }),
        });

        let body = LumaCreateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            aspect_ratio: request.aspect_ratio.as_str().to_string(),
            duration: format!("{}s", request.duration_secs.round() as u32),
            keyframes,
        };

        debug!(model = %body.model, "Creating Luma generation");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: ProviderKey::Luma,
                status,
                body,
            });
        }

        let created: LumaCreateResponse = response.json().await?;
        created.id.ok_or(ProviderError::NoTaskId(ProviderKey::Luma))
    }

    async fn poll_status(&self, task_id: &str) -> ProviderResult<TaskStatus> {
        let url = format!("{}/dream-machine/v1/generations/{}", self.base_url, task_id);
        let response = self.client.get(&url).bearer_auth(&self.api_key).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: ProviderKey::Luma,
                status,
                body,
            });
        }

        let generation: LumaGenerationResponse = response.json().await?;
        Ok(match generation.state.as_str() {
            "queued" => TaskStatus::Queued,
            "dreaming" => TaskStatus::Running,
            "completed" => TaskStatus::Complete(generation.rest),
            _ => TaskStatus::Failed(
                generation
                    .failure_reason
                    .unwrap_or_else(|| format!("generation state {}", generation.state)),
            ),
        })
    }

    fn extract_result(&self, payload: &Value) -> Option<String> {
        extract_media_url(payload, LUMA_RESULT_PATHS)
    }
}
