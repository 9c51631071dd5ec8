//! Shared data models for the VGen video generation pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their state machine
//! - Provider descriptors and quality tiers
//! - Generation requests and outcomes
//! - Assembly configuration and progress reporting
//! - Encoding configuration

pub mod assembly;
pub mod encoding;
pub mod job;
pub mod provider;
pub mod request;

// Re-export common types
pub use assembly::{
    AssemblyConfig, AssemblyPhase, AssemblyProgress, AssemblyResult, AudioTrack, AudioTrackKind,
    OutputFormat, SceneSegment, TextPosition, TransitionKind, WatermarkPosition, WatermarkSpec,
};
pub use encoding::EncodingConfig;
pub use job::{GenerationJob, JobId, JobPatch, JobState, TransitionError};
pub use provider::{
    descriptor, model_for_tier, ProviderDescriptor, ProviderFamily, ProviderKey, QualityTier,
    DEFAULT_COST_PER_SECOND, PROVIDERS,
};
pub use request::{
    AspectRatio, GenerationMode, GenerationOutcome, GenerationRequest, SceneContext, SceneType,
    VisualStyle,
};
