//! Generation job worker.
//!
//! Polls the job store, drives pending jobs through the provider
//! orchestrator, and broadcasts lifecycle events.

pub mod config;
pub mod error;
pub mod events;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use events::{EventBus, JobEvent};
pub use worker::GenerationWorker;
