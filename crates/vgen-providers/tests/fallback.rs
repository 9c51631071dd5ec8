//! End-to-end fallback across real adapters against a mock gateway.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vgen_models::{
    AspectRatio, GenerationRequest, ProviderKey, QualityTier, SceneContext,
};
use vgen_providers::{
    GatewayAdapter, Orchestrator, PollConfig, RunwayAdapter, VideoAdapter,
};

fn request() -> GenerationRequest {
    GenerationRequest {
        prompt: "slow pan over a leather backpack on a workbench".into(),
        negative_prompt: None,
        duration_secs: 5.0,
        aspect_ratio: AspectRatio::Portrait,
        source_image_url: None,
        provider: None,
        quality_tier: QualityTier::Standard,
        context: SceneContext::default(),
    }
}

#[tokio::test]
async fn gateway_failure_falls_back_to_direct_provider() {
    let gateway = MockServer::start().await;
    let runway = MockServer::start().await;

    // Kling (first in default order) is down.
    Mock::given(method("POST"))
        .and(path("/v2/generate/video/kling/generation"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&gateway)
        .await;

    // Runway (second) accepts and completes on the first poll.
    Mock::given(method("POST"))
        .and(path("/v1/text_to_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "rw-1"
        })))
        .mount(&runway)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/rw-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "SUCCEEDED",
            "output": ["https://cdn.runway.example/rw-1.mp4"]
        })))
        .mount(&runway)
        .await;

    std::env::set_var("AIML_API_KEY", "test-key");
    std::env::set_var("RUNWAY_API_KEY", "test-key");

    let mut adapters: HashMap<ProviderKey, Arc<dyn VideoAdapter>> = HashMap::new();
    adapters.insert(
        ProviderKey::Kling,
        Arc::new(
            GatewayAdapter::from_env(ProviderKey::Kling)
                .unwrap()
                .with_base_url(gateway.uri()),
        ),
    );
    adapters.insert(
        ProviderKey::Runway,
        Arc::new(RunwayAdapter::from_env().unwrap().with_base_url(runway.uri())),
    );

    let orchestrator = Orchestrator::new(adapters).with_poll_config(PollConfig {
        interval: Duration::from_millis(1),
        max_attempts: 5,
    });

    let outcome = orchestrator.generate(&request()).await.unwrap();
    assert_eq!(outcome.provider_used, ProviderKey::Runway);
    assert_eq!(outcome.media_url, "https://cdn.runway.example/rw-1.mp4");
    // 5 seconds at Runway's rate.
    assert!((outcome.cost_usd - 5.0 * 0.25).abs() < 1e-9);
}

#[tokio::test]
async fn gateway_completes_after_polling() {
    let gateway = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/generate/video/minimax/generation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "mm-1"
        })))
        .mount(&gateway)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/generate/video/minimax/generation"))
        .and(query_param("generation_id", "mm-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "video": { "url": "https://cdn.gateway.example/mm-1.mp4" }
        })))
        .mount(&gateway)
        .await;

    std::env::set_var("AIML_API_KEY", "test-key");

    let mut adapters: HashMap<ProviderKey, Arc<dyn VideoAdapter>> = HashMap::new();
    adapters.insert(
        ProviderKey::Hailuo,
        Arc::new(
            GatewayAdapter::from_env(ProviderKey::Hailuo)
                .unwrap()
                .with_base_url(gateway.uri()),
        ),
    );

    let orchestrator = Orchestrator::new(adapters).with_poll_config(PollConfig {
        interval: Duration::from_millis(1),
        max_attempts: 5,
    });

    let mut req = request();
    req.provider = Some(ProviderKey::Hailuo);

    let outcome = orchestrator.generate(&req).await.unwrap();
    assert_eq!(outcome.provider_used, ProviderKey::Hailuo);
    assert_eq!(outcome.media_url, "https://cdn.gateway.example/mm-1.mp4");
}
