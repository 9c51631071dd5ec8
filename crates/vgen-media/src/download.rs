//! Asset fetching for assembly inputs.

use std::path::Path;

use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Whether a source URL or path points at a still image.
pub fn is_image_source(source: &str) -> bool {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    let ext = path.rsplit('.').next().unwrap_or_default().to_lowercase();
    matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "webp" | "bmp")
}

/// Fetch a remote URL or copy a local file to `dest`.
pub async fn fetch_asset(source: &str, dest: impl AsRef<Path>) -> MediaResult<()> {
    let dest = dest.as_ref();

    if source.starts_with("http://") || source.starts_with("https://") {
        debug!(source, dest = %dest.display(), "Downloading asset");
        let response = reqwest::get(source).await?;
        if !response.status().is_success() {
            return Err(MediaError::download_failed(format!(
                "{} returned {}",
                source,
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;
        return Ok(());
    }

    let local = Path::new(source);
    if !local.exists() {
        return Err(MediaError::FileNotFound(local.to_path_buf()));
    }
    tokio::fs::copy(local, dest).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_source_detection() {
        assert!(is_image_source("https://cdn.example.com/product.png"));
        assert!(is_image_source("https://cdn.example.com/shot.jpeg?sig=abc"));
        assert!(is_image_source("/tmp/frame.webp"));
        assert!(!is_image_source("https://cdn.example.com/clip.mp4"));
        assert!(!is_image_source("clip"));
    }

    #[tokio::test]
    async fn test_fetch_local_asset() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.mp4");
        let dst = dir.path().join("out.mp4");
        tokio::fs::write(&src, b"data").await.unwrap();

        fetch_asset(&src.to_string_lossy(), &dst).await.unwrap();
        assert_eq!(tokio::fs::read(&dst).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_fetch_missing_local_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = fetch_asset("/nonexistent/in.mp4", dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
