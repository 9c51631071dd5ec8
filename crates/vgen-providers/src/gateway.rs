//! Aggregator-family adapter.
//!
//! Kling, Hailuo, and Seedance are reached through a single gateway API
//! that routes on a vendor path segment plus a model identifier. One
//! adapter struct serves all three; the provider key picks the route
//! and the model id carries the tier-specific variant.

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

const GATEWAY_BASE_URL: &str = "https://api.aimlapi.com";

/// The gateway normalizes completion payloads across vendors, but older
/// routes still use vendor-specific shapes.
const GATEWAY_RESULT_PATHS: &[&str] = &[
    "video.url",
    "video.0.url",
    "videos.0.url",
    "data.video_url",
    "output.url",
];

/// Gateway adapter for one aggregator-family provider.
pub struct GatewayAdapter {
    provider: ProviderKey,
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GatewayCreateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    duration: u32,
    ratio: String,
    /// Seeds the first frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    /// Subject-reference route: the image steers what appears in new
    /// footage instead of being animated.
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayCreateResponse {
    #[serde(alias = "generation_id")]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayGenerationResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    rest: Value,
}

impl GatewayAdapter {
    /// Create an adapter for one aggregator provider from `AIML_API_KEY`.
    pub fn from_env(provider: ProviderKey) -> ProviderResult<Self> {
        let api_key = std::env::var("AIML_API_KEY")
            .map_err(|_| ProviderError::not_configured("AIML_API_KEY not set"))?;
        Ok(Self {
            provider,
            api_key,
            base_url: GATEWAY_BASE_URL.to_string(),
            client: Client::new(),
        })
    }

    /// Override the base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[cfg(test)]
    fn for_tests(provider: ProviderKey, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: "test-key".to_string(),
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Vendor path segment on the gateway.
    fn vendor_path(&self) -> &'static str {
        match self.provider {
            ProviderKey::Kling => "kling",
            ProviderKey::Hailuo => "minimax",
            ProviderKey::Seedance => "bytedance",
            // Direct-family keys never construct a gateway adapter.
            ProviderKey::Runway | ProviderKey::Luma => "unsupported",
        }
    }

    fn generation_url(&self) -> String {
        format!(
            "{}/v2/generate/video/{}/generation",
            self.base_url,
            self.vendor_path()
        )
    }
}

#[async_trait]
impl VideoAdapter for GatewayAdapter {
    fn provider(&self) -> ProviderKey {
        self.provider
    }

    async fn create_task(&self, request: &AdapterRequest) -> ProviderResult<String> {
        let (image_url, reference_image_url) = match request.i2v_intent {
            Some(I2vIntent::NewContent) => (None, request.source_image_url.clone()),
            _ => (request.source_image_url.clone(), None),
        };

        let body = GatewayCreateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            duration: request.duration_secs.round() as u32,
            ratio: request.aspect_ratio.as_str().to_string(),
            image_url,
            reference_image_url,
        };

        debug!(provider = %self.provider, model = %body.model, "Creating gateway task");

        let response = self
            .client
            .post(self.generation_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: self.provider,
                status,
                body,
            });
        }

        let created: GatewayCreateResponse = response.json().await?;
        created.id.ok_or(ProviderError::NoTaskId(self.provider))
    }

    async fn poll_status(&self, task_id: &str) -> ProviderResult<TaskStatus> {
        let response = self
            .client
            .get(self.generation_url())
            .bearer_auth(&self.api_key)
            .query(&[("generation_id", task_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: self.provider,
                status,
                body,
            });
        }

        let generation: GatewayGenerationResponse = response.json().await?;
        Ok(match generation.status.as_str() {
            "queued" | "waiting" => TaskStatus::Queued,
            "active" | "generating" | "processing" => TaskStatus::Running,
            "completed" => TaskStatus::Complete(generation.rest),
            _ => TaskStatus::Failed(
                generation
                    .error
                    .unwrap_or_else(|| format!("generation status {}", generation.status)),
            ),
        })
    }

    fn extract_result(&self, payload: &Value) -> Option<String> {
        extract_media_url(payload, GATEWAY_RESULT_PATHS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgen_models::AspectRatio;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> AdapterRequest {
        AdapterRequest {
            prompt: "steam rising from a coffee cup. No text, no captions, no logos.".into(),
            negative_prompt: Some("blurry, distorted".into()),
            duration_secs: 5.0,
            aspect_ratio: AspectRatio::Portrait,
            source_image_url: None,
            i2v_intent: None,
            model: model.into(),
        }
    }

    #[tokio::test]
    async fn test_kling_routes_to_kling_vendor_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/generate/video/kling/generation"))
            .and(body_partial_json(serde_json::json!({
                "model": "kling-video/v2.1/standard"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "gw-1"
            })))
            .mount(&server)
            .await;

        let adapter = GatewayAdapter::for_tests(ProviderKey::Kling, server.uri());
        let task_id = adapter
            .create_task(&request("kling-video/v2.1/standard"))
            .await
            .unwrap();
        assert_eq!(task_id, "gw-1");
    }

    #[tokio::test]
    async fn test_hailuo_and_seedance_route_to_their_vendors() {
        let adapter = GatewayAdapter::for_tests(ProviderKey::Hailuo, "http://gw");
        assert!(adapter.generation_url().contains("/minimax/"));

        let adapter = GatewayAdapter::for_tests(ProviderKey::Seedance, "http://gw");
        assert!(adapter.generation_url().contains("/bytedance/"));
    }

    #[tokio::test]
    async fn test_poll_maps_gateway_states() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/generate/video/kling/generation"))
            .and(query_param("generation_id", "gw-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed",
                "video": { "url": "https://cdn.gateway.example/clip.mp4" }
            })))
            .mount(&server)
            .await;

        let adapter = GatewayAdapter::for_tests(ProviderKey::Kling, server.uri());
        match adapter.poll_status("gw-1").await.unwrap() {
            TaskStatus::Complete(payload) => {
                assert_eq!(
                    adapter.extract_result(&payload).unwrap(),
                    "https://cdn.gateway.example/clip.mp4"
                );
            }
            other => panic!("expected complete, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_generation_carries_reason() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/generate/video/minimax/generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "failed",
                "error": "content moderation rejected the prompt"
            })))
            .mount(&server)
            .await;

        let adapter = GatewayAdapter::for_tests(ProviderKey::Hailuo, server.uri());
        match adapter.poll_status("gw-2").await.unwrap() {
            TaskStatus::Failed(reason) => assert!(reason.contains("moderation")),
            other => panic!("expected failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_animate_intent_seeds_first_frame() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/generate/video/kling/generation"))
            .and(body_partial_json(serde_json::json!({
                "image_url": "https://example.com/product.png"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "gw-4"
            })))
            .mount(&server)
            .await;

        let mut req = request("kling-video/v2.1/standard");
        req.source_image_url = Some("https://example.com/product.png".into());
        req.i2v_intent = Some(I2vIntent::AnimateExisting);

        let adapter = GatewayAdapter::for_tests(ProviderKey::Kling, server.uri());
        assert_eq!(adapter.create_task(&req).await.unwrap(), "gw-4");
    }

    #[tokio::test]
    async fn test_new_content_intent_uses_reference_route() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/generate/video/kling/generation"))
            .and(body_partial_json(serde_json::json!({
                "reference_image_url": "https://example.com/product.png"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "gw-5"
            })))
            .mount(&server)
            .await;

        let mut req = request("kling-video/v2.1/standard");
        req.source_image_url = Some("https://example.com/product.png".into());
        req.i2v_intent = Some(I2vIntent::NewContent);

        let adapter = GatewayAdapter::for_tests(ProviderKey::Kling, server.uri());
        assert_eq!(adapter.create_task(&req).await.unwrap(), "gw-5");
    }

    #[tokio::test]
    async fn test_alias_generation_id_accepted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/generate/video/bytedance/generation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "generation_id": "gw-3"
            })))
            .mount(&server)
            .await;

        let adapter = GatewayAdapter::for_tests(ProviderKey::Seedance, server.uri());
        let task_id = adapter
            .create_task(&request("bytedance/seedance-1.0-lite"))
            .await
            .unwrap();
        assert_eq!(task_id, "gw-3");
    }
}
