//! The `VideoAdapter` trait and bounded polling.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use vgen_models::{AspectRatio, ProviderKey};

use crate::error::{ProviderError, ProviderResult};
use crate::sanitize::I2vIntent;

/// A generation request already resolved for one adapter call: the
/// prompt has been through the sanitization branch for its mode and the
/// model id has been remapped for the quality tier.
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    /// Prompt to submit
    pub prompt: String,
    /// Negative prompt
    pub negative_prompt: Option<String>,
    /// Clip duration in seconds (already clamped to the provider max)
    pub duration_secs: f64,
    /// Aspect ratio
    pub aspect_ratio: AspectRatio,
    /// Source image URL for image-to-video
    pub source_image_url: Option<String>,
    /// Image-to-video branch (new content vs. animate existing)
    pub i2v_intent: Option<I2vIntent>,
    /// Concrete model identifier for the requested tier
    pub model: String,
}

/// Status of a provider task.
#[derive(Debug, Clone)]
pub enum TaskStatus {
    Queued,
    Running,
    /// Completed; carries the raw completion payload for URL extraction
    Complete(Value),
    Failed(String),
}

/// One provider's wire protocol.
#[async_trait]
pub trait VideoAdapter: Send + Sync {
    /// The provider this adapter talks to.
    fn provider(&self) -> ProviderKey;

    /// Submit a generation task; returns the provider task id.
    async fn create_task(&self, request: &AdapterRequest) -> ProviderResult<String>;

    /// Poll the task status once.
    async fn poll_status(&self, task_id: &str) -> ProviderResult<TaskStatus>;

    /// Pull the media URL out of a completion payload.
    fn extract_result(&self, payload: &Value) -> Option<String>;
}

/// Polling bounds for adapter calls.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between status polls
    pub interval: Duration,
    /// Maximum number of polls before the call times out
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            // 5s x 120 attempts: a hard ~10 minute ceiling per adapter call
            interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

/// Poll a task until it completes, fails, or the attempt budget runs out.
///
/// Exceeding the bound is a terminal timeout for this adapter call, not
/// a crash; the orchestrator moves on to the next candidate.
pub async fn poll_until_complete(
    adapter: &dyn VideoAdapter,
    task_id: &str,
    config: &PollConfig,
) -> ProviderResult<Value> {
    let provider = adapter.provider();

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        match adapter.poll_status(task_id).await {
            Ok(TaskStatus::Complete(payload)) => {
                debug!(%provider, task_id, attempt, "Task complete");
                return Ok(payload);
            }
            Ok(TaskStatus::Failed(reason)) => {
                return Err(ProviderError::TaskFailed { provider, reason });
            }
            Ok(TaskStatus::Queued) | Ok(TaskStatus::Running) => {
                debug!(%provider, task_id, attempt, "Task still in progress");
            }
            Err(e) => {
                // Transient poll errors are tolerated; the attempt budget
                // still bounds the total wait.
                warn!(%provider, task_id, attempt, "Poll error: {}", e);
            }
        }
    }

    Err(ProviderError::PollTimeout {
        provider,
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedAdapter {
        polls_until_complete: u32,
        polls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl VideoAdapter for ScriptedAdapter {
        fn provider(&self) -> ProviderKey {
            ProviderKey::Kling
        }

        async fn create_task(&self, _request: &AdapterRequest) -> ProviderResult<String> {
            Ok("task-1".to_string())
        }

        async fn poll_status(&self, _task_id: &str) -> ProviderResult<TaskStatus> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Ok(TaskStatus::Failed("content policy".into()));
            }
            if n >= self.polls_until_complete {
                Ok(TaskStatus::Complete(
                    serde_json::json!({"video": {"url": "https://cdn.example.com/a.mp4"}}),
                ))
            } else {
                Ok(TaskStatus::Running)
            }
        }

        fn extract_result(&self, payload: &Value) -> Option<String> {
            payload["video"]["url"].as_str().map(String::from)
        }
    }

    fn fast_config(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_poll_until_complete_returns_payload() {
        let adapter = ScriptedAdapter {
            polls_until_complete: 3,
            polls: AtomicU32::new(0),
            fail: false,
        };
        let payload = poll_until_complete(&adapter, "task-1", &fast_config(10))
            .await
            .unwrap();
        assert_eq!(adapter.polls.load(Ordering::SeqCst), 3);
        assert!(adapter.extract_result(&payload).is_some());
    }

    #[tokio::test]
    async fn test_poll_timeout_is_terminal_not_a_panic() {
        let adapter = ScriptedAdapter {
            polls_until_complete: 100,
            polls: AtomicU32::new(0),
            fail: false,
        };
        let err = poll_until_complete(&adapter, "task-1", &fast_config(4))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::PollTimeout { attempts: 4, .. }
        ));
    }

    #[tokio::test]
    async fn test_task_failure_short_circuits() {
        let adapter = ScriptedAdapter {
            polls_until_complete: 100,
            polls: AtomicU32::new(0),
            fail: true,
        };
        let err = poll_until_complete(&adapter, "task-1", &fast_config(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::TaskFailed { .. }));
        assert_eq!(adapter.polls.load(Ordering::SeqCst), 1);
    }
}
