//! Generation job definitions and the job state machine.
//!
//! Jobs are immutable records: every lifecycle step is a consuming
//! transition method that returns the next record, so the state machine
//! can be unit-tested without a store or a network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::provider::{ProviderKey, QualityTier};
use crate::request::AspectRatio;

/// Unique identifier for a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job is waiting for a worker
    #[default]
    Pending,
    /// Job is being processed
    Running,
    /// Job completed successfully
    Succeeded,
    /// Job failed after exhausting its retry budget
    Failed,
    /// Job was cancelled before a worker picked it up
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a transition is requested from the wrong state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} a job in state {state}")]
    InvalidState {
        action: &'static str,
        state: JobState,
    },
    #[error("retry budget exhausted ({retry_count}/{max_retries})")]
    RetriesExhausted { retry_count: u32, max_retries: u32 },
}

/// A scene generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Unique job ID
    pub id: JobId,

    /// Owning project ID
    pub project_id: String,

    /// Scene index within the project
    pub scene_index: u32,

    /// Explicitly requested provider (optional; the orchestrator
    /// falls back to heuristics when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKey>,

    /// Job state
    #[serde(default)]
    pub state: JobState,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Prompt text
    pub prompt: String,

    /// Fallback prompt used when the primary prompt is rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_prompt: Option<String>,

    /// Negative prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Target clip duration in seconds
    pub duration_secs: f64,

    /// Target aspect ratio
    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Visual style tag (e.g. "cinematic", "minimal")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Requested quality tier
    #[serde(default)]
    pub quality_tier: QualityTier,

    /// Source image URL for image-to-video jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image_url: Option<String>,

    /// Number of retry attempts so far
    #[serde(default)]
    pub retry_count: u32,

    /// Maximum retries allowed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Started at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Completed at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Result media URL (set on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,

    /// Estimated generation cost in USD (set on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,

    /// Error message (set on terminal failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

fn default_max_retries() -> u32 {
    3
}

impl GenerationJob {
    /// Create a new pending job for a scene.
    pub fn new(
        project_id: impl Into<String>,
        scene_index: u32,
        prompt: impl Into<String>,
        duration_secs: f64,
    ) -> Self {
        Self {
            id: JobId::new(),
            project_id: project_id.into(),
            scene_index,
            provider: None,
            state: JobState::Pending,
            progress: 0,
            prompt: prompt.into(),
            fallback_prompt: None,
            negative_prompt: None,
            duration_secs,
            aspect_ratio: AspectRatio::default(),
            style: None,
            quality_tier: QualityTier::default(),
            source_image_url: None,
            retry_count: 0,
            max_retries: default_max_retries(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result_url: None,
            cost_usd: None,
            error_message: None,
        }
    }

    /// Set an explicit provider preference.
    pub fn with_provider(mut self, provider: ProviderKey) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the source image for an image-to-video job.
    pub fn with_source_image(mut self, url: impl Into<String>) -> Self {
        self.source_image_url = Some(url.into());
        self
    }

    /// Set the quality tier.
    pub fn with_quality_tier(mut self, tier: QualityTier) -> Self {
        self.quality_tier = tier;
        self
    }

    /// `pending -> running`.
    pub fn start(mut self) -> Result<Self, TransitionError> {
        if self.state != JobState::Pending {
            return Err(TransitionError::InvalidState {
                action: "start",
                state: self.state,
            });
        }
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        Ok(self)
    }

    /// `running -> succeeded` with the result media URL and cost.
    pub fn complete(
        mut self,
        result_url: impl Into<String>,
        cost_usd: f64,
    ) -> Result<Self, TransitionError> {
        if self.state != JobState::Running {
            return Err(TransitionError::InvalidState {
                action: "complete",
                state: self.state,
            });
        }
        self.state = JobState::Succeeded;
        self.result_url = Some(result_url.into());
        self.cost_usd = Some(cost_usd);
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    /// `running -> pending` with an incremented retry count.
    ///
    /// Fails with `RetriesExhausted` when the budget is spent; callers
    /// should then use [`GenerationJob::fail`].
    pub fn retry(mut self) -> Result<Self, TransitionError> {
        if self.state != JobState::Running {
            return Err(TransitionError::InvalidState {
                action: "retry",
                state: self.state,
            });
        }
        if self.retry_count >= self.max_retries {
            return Err(TransitionError::RetriesExhausted {
                retry_count: self.retry_count,
                max_retries: self.max_retries,
            });
        }
        self.state = JobState::Pending;
        self.retry_count += 1;
        self.started_at = None;
        self.progress = 0;
        Ok(self)
    }

    /// `running -> failed` with the captured error message.
    pub fn fail(mut self, error: impl Into<String>) -> Result<Self, TransitionError> {
        if self.state != JobState::Running {
            return Err(TransitionError::InvalidState {
                action: "fail",
                state: self.state,
            });
        }
        self.state = JobState::Failed;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    /// `pending -> cancelled`. A running generation cannot be interrupted.
    pub fn cancel(mut self) -> Result<Self, TransitionError> {
        if self.state != JobState::Pending {
            return Err(TransitionError::InvalidState {
                action: "cancel",
                state: self.state,
            });
        }
        self.state = JobState::Cancelled;
        self.completed_at = Some(Utc::now());
        Ok(self)
    }

    /// Whether a failure still has retry budget left.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Whether the job uses image-to-video generation.
    pub fn is_image_to_video(&self) -> bool {
        self.source_image_url.is_some()
    }
}

/// Partial update applied by the job store.
///
/// Only set fields are written; everything else is left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobPatch {
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress.min(100)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> GenerationJob {
        GenerationJob::new("proj-1", 0, "A sunrise over mountains", 5.0)
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = job();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.retry_count, 0);
        assert!(!job.is_image_to_video());
    }

    #[test]
    fn test_happy_path_transitions() {
        let job = job().start().unwrap();
        assert_eq!(job.state, JobState::Running);
        assert!(job.started_at.is_some());

        let job = job.complete("https://cdn.example.com/out.mp4", 1.25).unwrap();
        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.progress, 100);
        assert_eq!(job.cost_usd, Some(1.25));
    }

    #[test]
    fn test_retry_increments_and_resets() {
        let job = job().start().unwrap();
        let job = job.retry().unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.retry_count, 1);
        assert_eq!(job.progress, 0);
        assert!(job.started_at.is_none());
    }

    #[test]
    fn test_retry_budget_exhaustion() {
        let mut job = job();
        job.max_retries = 1;
        let job = job.start().unwrap().retry().unwrap();
        assert_eq!(job.retry_count, 1);

        let job = job.start().unwrap();
        let err = job.clone().retry().unwrap_err();
        assert_eq!(
            err,
            TransitionError::RetriesExhausted {
                retry_count: 1,
                max_retries: 1
            }
        );

        // Budget exhausted: the only remaining edge is terminal failure.
        let job = job.fail("provider exhausted").unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert!(job.error_message.is_some());
    }

    #[test]
    fn test_cancel_only_while_pending() {
        let job = job().cancel().unwrap();
        assert_eq!(job.state, JobState::Cancelled);

        let running = super::GenerationJob::new("p", 0, "x", 4.0).start().unwrap();
        assert!(running.cancel().is_err());
    }

    #[test]
    fn test_invalid_edges_rejected() {
        let pending = job();
        assert!(pending.clone().complete("u", 0.0).is_err());
        assert!(pending.clone().fail("e").is_err());
        assert!(pending.retry().is_err());

        let done = job().start().unwrap().complete("u", 0.0).unwrap();
        assert!(done.start().is_err());
    }

    #[test]
    fn test_succeeded_never_exceeds_retry_budget() {
        // Walk the full retry budget, then succeed; the invariant
        // retry_count <= max_retries must hold at every step.
        let mut job = job();
        job.max_retries = 2;
        for _ in 0..2 {
            job = job.start().unwrap().retry().unwrap();
            assert!(job.retry_count <= job.max_retries);
        }
        let job = job.start().unwrap().complete("u", 0.1).unwrap();
        assert!(job.retry_count <= job.max_retries);
        assert_eq!(job.state, JobState::Succeeded);
    }
}
