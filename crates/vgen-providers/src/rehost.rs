//! Re-hosting of provider result URLs.
//!
//! Provider CDN URLs expire, some within hours. Successful results are
//! copied into our own object storage so downstream assembly and
//! delivery never depend on a provider link staying alive. Re-hosting
//! is best-effort: on any failure the original URL is returned and the
//! pipeline continues.

use std::sync::Arc;

use tracing::{info, warn};

use vgen_models::ProviderKey;
use vgen_storage::ObjectStore;

/// Copy a provider result into object storage.
///
/// Returns the durable URL on success, or the original provider URL if
/// the download or upload fails.
pub async fn rehost_result(
    store: &Arc<dyn ObjectStore>,
    provider: ProviderKey,
    task_id: &str,
    media_url: &str,
) -> String {
    match download_and_store(store, provider, task_id, media_url).await {
        Ok(durable_url) => {
            info!(%provider, task_id, "Re-hosted provider result");
            durable_url
        }
        Err(e) => {
            warn!(%provider, task_id, "Re-host failed, keeping provider URL: {}", e);
            media_url.to_string()
        }
    }
}

async fn download_and_store(
    store: &Arc<dyn ObjectStore>,
    provider: ProviderKey,
    task_id: &str,
    media_url: &str,
) -> anyhow::Result<String> {
    let response = reqwest::get(media_url).await?.error_for_status()?;
    let bytes = response.bytes().await?.to_vec();

    let key = format!("generated/{}/{}.mp4", provider, task_id);
    let url = store.put(bytes, &key, "video/mp4").await?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use vgen_storage::{StorageError, StorageResult};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct RecordingStore {
        keys: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put(
            &self,
            _data: Vec<u8>,
            key: &str,
            _content_type: &str,
        ) -> StorageResult<String> {
            if self.fail {
                return Err(StorageError::upload_failed("bucket unavailable"));
            }
            self.keys.lock().unwrap().push(key.to_string());
            Ok(format!("https://media.example.com/{key}"))
        }
    }

    #[tokio::test]
    async fn test_rehost_stores_under_provider_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4".to_vec()))
            .mount(&server)
            .await;

        let store: Arc<dyn ObjectStore> = Arc::new(RecordingStore {
            keys: Mutex::new(Vec::new()),
            fail: false,
        });

        let url = rehost_result(
            &store,
            ProviderKey::Kling,
            "task-9",
            &format!("{}/clip.mp4", server.uri()),
        )
        .await;

        assert_eq!(url, "https://media.example.com/generated/kling/task-9.mp4");
    }

    #[tokio::test]
    async fn test_rehost_failure_keeps_provider_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake-mp4".to_vec()))
            .mount(&server)
            .await;

        let store: Arc<dyn ObjectStore> = Arc::new(RecordingStore {
            keys: Mutex::new(Vec::new()),
            fail: true,
        });

        let original = format!("{}/clip.mp4", server.uri());
        let url = rehost_result(&store, ProviderKey::Luma, "task-10", &original).await;
        assert_eq!(url, original);
    }

    #[tokio::test]
    async fn test_unreachable_download_keeps_provider_url() {
        let store: Arc<dyn ObjectStore> = Arc::new(RecordingStore {
            keys: Mutex::new(Vec::new()),
            fail: false,
        });

        let url = rehost_result(
            &store,
            ProviderKey::Runway,
            "task-11",
            "http://127.0.0.1:1/gone.mp4",
        )
        .await;
        assert_eq!(url, "http://127.0.0.1:1/gone.mp4");
    }
}
