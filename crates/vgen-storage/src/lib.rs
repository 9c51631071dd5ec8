//! Durable object storage for generated media.
//!
//! Generated clips are re-hosted here so downstream assembly never
//! depends on ephemeral provider URLs.

pub mod error;
pub mod r2;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use r2::{R2Config, R2Store};
pub use store::ObjectStore;
