//! The `ObjectStore` trait.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Durable storage seam: put bytes under a key, get a public URL back.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under a deterministic key and return the public URL.
    async fn put(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<String>;
}
