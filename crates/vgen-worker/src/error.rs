//! Worker error types.

use thiserror::Error;

use vgen_models::TransitionError;
use vgen_providers::ProviderError;
use vgen_store::StoreError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid job transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WorkerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
