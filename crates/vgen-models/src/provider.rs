//! Provider descriptors and quality-tier model mapping.
//!
//! Descriptors are immutable process-wide configuration owned by the
//! orchestrator; nothing mutates them after startup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default per-second cost used when a provider is unknown.
pub const DEFAULT_COST_PER_SECOND: f64 = 0.15;

/// How an adapter reaches its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    /// Calls the provider's own endpoint directly
    Direct,
    /// Routes through a shared gateway with a model identifier
    Aggregator,
}

/// Video generation providers known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKey {
    Runway,
    Luma,
    Kling,
    Hailuo,
    Seedance,
}

impl ProviderKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKey::Runway => "runway",
            ProviderKey::Luma => "luma",
            ProviderKey::Kling => "kling",
            ProviderKey::Hailuo => "hailuo",
            ProviderKey::Seedance => "seedance",
        }
    }

    /// All configured providers, in default preference order.
    pub fn all() -> &'static [ProviderKey] {
        &[
            ProviderKey::Kling,
            ProviderKey::Runway,
            ProviderKey::Hailuo,
            ProviderKey::Luma,
            ProviderKey::Seedance,
        ]
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-selected quality/cost level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Ultra,
    Premium,
    #[default]
    Standard,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Ultra => "ultra",
            QualityTier::Premium => "premium",
            QualityTier::Standard => "standard",
        }
    }
}

/// Immutable description of one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Provider key
    pub key: ProviderKey,
    /// Human-readable name
    pub display_name: &'static str,
    /// Adapter family
    pub family: ProviderFamily,
    /// Cost per generated second in USD
    pub cost_per_second: f64,
    /// Maximum supported clip duration in seconds
    pub max_duration_secs: f64,
    /// Supports text-to-video
    pub supports_t2v: bool,
    /// Supports image-to-video
    pub supports_i2v: bool,
}

/// Static descriptor table for all configured providers.
pub static PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        key: ProviderKey::Runway,
        display_name: "Runway",
        family: ProviderFamily::Direct,
        cost_per_second: 0.25,
        max_duration_secs: 10.0,
        supports_t2v: true,
        supports_i2v: true,
    },
    ProviderDescriptor {
        key: ProviderKey::Luma,
        display_name: "Luma Dream Machine",
        family: ProviderFamily::Direct,
        cost_per_second: 0.18,
        max_duration_secs: 9.0,
        supports_t2v: true,
        supports_i2v: true,
    },
    ProviderDescriptor {
        key: ProviderKey::Kling,
        display_name: "Kling",
        family: ProviderFamily::Aggregator,
        cost_per_second: 0.14,
        max_duration_secs: 10.0,
        supports_t2v: true,
        supports_i2v: true,
    },
    ProviderDescriptor {
        key: ProviderKey::Hailuo,
        display_name: "Hailuo",
        family: ProviderFamily::Aggregator,
        cost_per_second: 0.10,
        max_duration_secs: 6.0,
        supports_t2v: true,
        supports_i2v: true,
    },
    ProviderDescriptor {
        key: ProviderKey::Seedance,
        display_name: "Seedance",
        family: ProviderFamily::Aggregator,
        cost_per_second: 0.08,
        max_duration_secs: 10.0,
        supports_t2v: true,
        supports_i2v: false,
    },
];

/// Look up the descriptor for a provider.
pub fn descriptor(key: ProviderKey) -> &'static ProviderDescriptor {
    PROVIDERS
        .iter()
        .find(|d| d.key == key)
        .expect("every ProviderKey has a descriptor")
}

/// Resolve the concrete model identifier for a provider at a quality tier.
///
/// The same provider family dispatches to different versioned variants
/// depending on the requested tier.
pub fn model_for_tier(key: ProviderKey, tier: QualityTier) -> &'static str {
    match (key, tier) {
        (ProviderKey::Runway, QualityTier::Standard) => "gen3a_turbo",
        (ProviderKey::Runway, _) => "gen4_turbo",

        (ProviderKey::Luma, QualityTier::Standard) => "ray-flash-2",
        (ProviderKey::Luma, _) => "ray-2",

        (ProviderKey::Kling, QualityTier::Ultra) => "kling-video/v2.1/master",
        (ProviderKey::Kling, QualityTier::Premium) => "kling-video/v2.1/standard",
        (ProviderKey::Kling, QualityTier::Standard) => "kling-video/v1.6/standard",

        (ProviderKey::Hailuo, QualityTier::Ultra) => "minimax/video-01-director",
        (ProviderKey::Hailuo, _) => "minimax/video-01",

        (ProviderKey::Seedance, QualityTier::Standard) => "bytedance/seedance-1.0-lite",
        (ProviderKey::Seedance, _) => "bytedance/seedance-1.0-pro",
    }
}
