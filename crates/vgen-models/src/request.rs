//! Generation request and outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::provider::{ProviderKey, QualityTier};

/// Target aspect ratio for generated media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 16:9 landscape
    #[default]
    Landscape,
    /// 9:16 portrait
    Portrait,
    /// 1:1 square
    Square,
}

impl AspectRatio {
    /// Ratio string in the form most providers expect.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }

    /// Output pixel dimensions at the default resolution.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            AspectRatio::Landscape => (1920, 1080),
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Square => (1080, 1080),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    TextToVideo,
    ImageToVideo,
}

/// Scene classification used by the orchestrator's heuristic rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SceneType {
    #[default]
    Product,
    Lifestyle,
    Testimonial,
    /// Closing call-to-action scene
    Cta,
}

impl SceneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneType::Product => "product",
            SceneType::Lifestyle => "lifestyle",
            SceneType::Testimonial => "testimonial",
            SceneType::Cta => "cta",
        }
    }
}

/// Visual style tag used by the orchestrator's heuristic rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualStyle {
    #[default]
    Clean,
    Cinematic,
    Energetic,
    Minimal,
}

/// Rich scene context available when a brief has been fully analyzed.
///
/// When both narration and visual direction are present the orchestrator
/// can delegate provider selection to an external recommender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_direction: Option<String>,
    #[serde(default)]
    pub scene_type: SceneType,
    #[serde(default)]
    pub visual_style: VisualStyle,
}

impl SceneContext {
    /// Whether enough context exists to consult the recommender.
    pub fn is_rich(&self) -> bool {
        self.narration.is_some() && self.visual_direction.is_some()
    }
}

/// A generic generation request handed to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt text
    pub prompt: String,
    /// Negative prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Target duration in seconds
    pub duration_secs: f64,
    /// Target aspect ratio
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Source image URL (selects image-to-video mode when present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image_url: Option<String>,
    /// Explicit provider preference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKey>,
    /// Requested quality tier
    #[serde(default)]
    pub quality_tier: QualityTier,
    /// Scene context for heuristic/recommended selection
    #[serde(default)]
    pub context: SceneContext,
}

impl GenerationRequest {
    pub fn mode(&self) -> GenerationMode {
        if self.source_image_url.is_some() {
            GenerationMode::ImageToVideo
        } else {
            GenerationMode::TextToVideo
        }
    }

    /// Preflight cost estimate in USD.
    ///
    /// Uses the explicit provider's rate when one is set, otherwise the
    /// flat default rate; the actual provider is only known after the
    /// fallback chain resolves.
    pub fn estimated_cost_usd(&self) -> f64 {
        let rate = self
            .provider
            .map(|key| crate::provider::descriptor(key).cost_per_second)
            .unwrap_or(crate::provider::DEFAULT_COST_PER_SECOND);
        self.duration_secs * rate
    }
}

/// Outcome of a generation attempt across all candidate providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Result media URL (re-hosted where possible)
    pub media_url: String,
    /// Estimated cost in USD
    pub cost_usd: f64,
    /// Wall-clock generation time in milliseconds
    pub duration_ms: u64,
    /// Provider that produced the result
    pub provider_used: ProviderKey,
}
