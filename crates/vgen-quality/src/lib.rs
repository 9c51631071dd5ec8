//! Quality gate for generated scenes.
//!
//! A pure state-aggregation layer: per-scene automated analysis plus human
//! approvals are converted into a render/no-render decision with explicit
//! blocking reasons. Nothing here touches a store or the network, and the
//! project report is recomputed from live scene data on every call rather
//! than trusting a previously stored flag.

pub mod report;
pub mod status;

pub use report::ProjectQualityReport;
pub use status::{
    derive_status, IssueSeverity, QualityIssue, SceneAnalysis, SceneQualityStatus, SceneStatus,
    AUTO_APPROVE_SCORE, MIN_SCENE_SCORE,
};
