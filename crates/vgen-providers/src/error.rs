//! Provider error types.

use thiserror::Error;
use vgen_models::ProviderKey;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing credentials. Fatal, never retried.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API returned {status}: {body}")]
    Api {
        provider: ProviderKey,
        status: u16,
        body: String,
    },

    #[error("{0} did not return a task id")]
    NoTaskId(ProviderKey),

    #[error("{0} completed without an extractable media URL")]
    NoMediaUrl(ProviderKey),

    #[error("{provider} task failed: {reason}")]
    TaskFailed {
        provider: ProviderKey,
        reason: String,
    },

    #[error("{provider} polling timed out after {attempts} attempts")]
    PollTimeout {
        provider: ProviderKey,
        attempts: u32,
    },

    #[error("all providers failed for {scene_type} scene (last error: {last_error})")]
    AllProvidersFailed {
        scene_type: String,
        last_error: String,
    },

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    /// Configuration errors are fatal; everything else is absorbed by
    /// the orchestrator's fallback loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::NotConfigured(_))
    }
}
