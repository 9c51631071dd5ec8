//! Provider orchestration: candidate ordering and sequential fallback.
//!
//! One call to [`Orchestrator::generate`] tries candidate providers in
//! order until one returns a playable clip. Attempts are sequential,
//! never parallel: generation is billed per attempt, and the first
//! success wins. The last error is carried forward so a total failure
//! reports what actually went wrong, not just "all failed".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use vgen_models::{
    descriptor, model_for_tier, GenerationMode, GenerationOutcome, GenerationRequest,
    ProviderFamily, ProviderKey, SceneContext, SceneType, VisualStyle,
};
use vgen_storage::ObjectStore;

use crate::adapter::{poll_until_complete, AdapterRequest, PollConfig, VideoAdapter};
use crate::error::{ProviderError, ProviderResult};
use crate::rehost::rehost_result;
use crate::sanitize::{classify_i2v_intent, phrase_i2v_prompt, sanitize_t2v_prompt, I2vIntent};

/// Negative prompt applied to aggregator-family providers when the
/// caller does not supply one. The direct providers do not take
/// negative prompts.
const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, distorted, low quality, text, watermark";

/// A provider choice from an external recommender.
#[derive(Debug, Clone)]
pub struct ProviderRecommendation {
    pub primary: ProviderKey,
    pub fallback: Vec<ProviderKey>,
}

/// Optional external provider recommender, consulted only when the
/// scene context is rich enough to be worth a call.
#[async_trait]
pub trait ProviderRecommender: Send + Sync {
    async fn recommend(&self, context: &SceneContext) -> Option<ProviderRecommendation>;
}

/// Sequential-fallback provider orchestrator.
pub struct Orchestrator {
    adapters: HashMap<ProviderKey, Arc<dyn VideoAdapter>>,
    recommender: Option<Arc<dyn ProviderRecommender>>,
    object_store: Option<Arc<dyn ObjectStore>>,
    poll: PollConfig,
}

impl Orchestrator {
    pub fn new(adapters: HashMap<ProviderKey, Arc<dyn VideoAdapter>>) -> Self {
        Self {
            adapters,
            recommender: None,
            object_store: None,
            poll: PollConfig::default(),
        }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn ProviderRecommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Generate one clip, falling back across providers in order.
    pub async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GenerationOutcome> {
        let candidates = self.candidate_order(request).await;
        let mut last_error = String::from("no candidate providers");

        for key in &candidates {
            let Some(adapter) = self.adapters.get(key) else {
                debug!(provider = %key, "No adapter registered, skipping");
                continue;
            };

            let started = Instant::now();
            match self.attempt(adapter.as_ref(), *key, request).await {
                Ok((media_url, task_id, billed_secs)) => {
                    let media_url = match &self.object_store {
                        Some(store) => rehost_result(store, *key, &task_id, &media_url).await,
                        None => media_url,
                    };
                    let cost_usd = billed_secs * descriptor(*key).cost_per_second;
                    info!(
                        provider = %key,
                        cost_usd,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Generation succeeded"
                    );
                    return Ok(GenerationOutcome {
                        media_url,
                        cost_usd,
                        duration_ms: started.elapsed().as_millis() as u64,
                        provider_used: *key,
                    });
                }
                Err(e) if e.is_fatal() => {
                    debug!(provider = %key, "Skipping unconfigured provider: {}", e);
                    last_error = e.to_string();
                }
                Err(e) => {
                    warn!(provider = %key, "Attempt failed, trying next provider: {}", e);
                    last_error = e.to_string();
                }
            }
        }

        Err(ProviderError::AllProvidersFailed {
            scene_type: request.context.scene_type.as_str().to_string(),
            last_error,
        })
    }

    /// One attempt against one provider: create, poll, extract.
    async fn attempt(
        &self,
        adapter: &dyn VideoAdapter,
        key: ProviderKey,
        request: &GenerationRequest,
    ) -> ProviderResult<(String, String, f64)> {
        let desc = descriptor(key);
        let duration_secs = request.duration_secs.min(desc.max_duration_secs);

        let (prompt, i2v_intent) = match request.mode() {
            GenerationMode::TextToVideo => (sanitize_t2v_prompt(&request.prompt), None),
            GenerationMode::ImageToVideo => {
                // The source image carries the real brand content, so the
                // prompt is rephrased for its branch instead of sanitized.
                let intent = classify_i2v_intent(&request.prompt);
                (phrase_i2v_prompt(&request.prompt, intent), Some(intent))
            }
        };

        let negative_prompt = match desc.family {
            ProviderFamily::Aggregator => Some(
                request
                    .negative_prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_NEGATIVE_PROMPT.to_string()),
            ),
            ProviderFamily::Direct => request.negative_prompt.clone(),
        };

        let adapter_request = AdapterRequest {
            prompt,
            negative_prompt,
            duration_secs,
            aspect_ratio: request.aspect_ratio,
            source_image_url: request.source_image_url.clone(),
            i2v_intent,
            model: model_for_tier(key, request.quality_tier).to_string(),
        };

        let task_id = adapter.create_task(&adapter_request).await?;
        let payload = poll_until_complete(adapter, &task_id, &self.poll).await?;
        let media_url = adapter
            .extract_result(&payload)
            .ok_or(ProviderError::NoMediaUrl(key))?;

        Ok((media_url, task_id, duration_secs))
    }

    /// Resolve the ordered, deduplicated, mode-capable candidate list.
    async fn candidate_order(&self, request: &GenerationRequest) -> Vec<ProviderKey> {
        let mut ordered: Vec<ProviderKey> = Vec::new();

        if let Some(explicit) = request.provider {
            ordered.push(explicit);
        } else if request.context.is_rich() {
            if let Some(recommender) = &self.recommender {
                if let Some(rec) = recommender.recommend(&request.context).await {
                    ordered.push(rec.primary);
                    ordered.extend(rec.fallback);
                }
            }
        }

        if ordered.is_empty() {
            ordered.extend(heuristic_order(request));
        }

        // Everyone else still backstops the preferred head of the list.
        ordered.extend(ProviderKey::all().iter().copied());

        let mode = request.mode();
        let mut seen = Vec::with_capacity(ordered.len());
        ordered.retain(|key| {
            if seen.contains(key) {
                return false;
            }
            seen.push(*key);
            match mode {
                GenerationMode::TextToVideo => descriptor(*key).supports_t2v,
                GenerationMode::ImageToVideo => descriptor(*key).supports_i2v,
            }
        });
        ordered
    }
}

/// Scene-driven preference rules used when no explicit choice or
/// recommendation exists.
fn heuristic_order(request: &GenerationRequest) -> Vec<ProviderKey> {
    if request.context.scene_type == SceneType::Cta {
        // CTA scenes need the crispest motion and framing.
        return vec![ProviderKey::Runway, ProviderKey::Kling];
    }
    if classify_i2v_intent(&request.prompt) == I2vIntent::NewContent {
        // Human subjects: the aggregator models handle people best.
        return vec![ProviderKey::Kling, ProviderKey::Hailuo];
    }
    if request.context.visual_style == VisualStyle::Cinematic {
        return vec![ProviderKey::Luma, ProviderKey::Kling];
    }
    ProviderKey::all().to_vec()
}
