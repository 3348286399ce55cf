use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::constants::MEDIA_IMAGE_DIR;
use crate::database::error::ApiError;

/// Stores a base64 image payload under `media_root` and returns its stable
/// relative reference. Accepts both `data:image/<ext>;base64,<data>` URLs
/// and bare base64 strings; the decoded bytes are written as-is, the
/// payload is never inspected or re-encoded. File names are derived from
/// the content hash, so re-uploading the same payload is idempotent.
pub async fn store_image(payload: &str, media_root: &Path) -> Result<String, ApiError> {
    let (meta, data) = match payload.split_once(";base64,") {
        Some((meta, data)) => (meta, data),
        None => ("", payload),
    };

    let extension = meta
        .strip_prefix("data:image/")
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("png");

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| ApiError::Validation(format!("Invalid image payload: {e}")))?;

    let name = format!("{:x}.{extension}", Sha256::digest(&bytes));
    let dir = media_root.join(MEDIA_IMAGE_DIR);

    fs::create_dir_all(&dir).await.map_err(|e| {
        log::error!("failed to create media directory: {e}");
        ApiError::Internal(format!("{e}"))
    })?;
    fs::write(dir.join(&name), &bytes).await.map_err(|e| {
        log::error!("failed to store image {name}: {e}");
        ApiError::Internal(format!("{e}"))
    })?;

    Ok(format!("{MEDIA_IMAGE_DIR}/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[tokio::test]
    async fn test_store_data_url() {
        let root = std::env::temp_dir().join("tastebook-media-test");
        let payload = format!("data:image/png;base64,{PIXEL}");
        let reference = store_image(&payload, &root).await.unwrap();
        assert!(reference.starts_with("recipes/images/"));
        assert!(reference.ends_with(".png"));
        assert!(root.join(&reference).exists());
    }

    #[tokio::test]
    async fn test_store_bare_payload_is_idempotent() {
        let root = std::env::temp_dir().join("tastebook-media-test");
        let first = store_image(PIXEL, &root).await.unwrap();
        let second = store_image(PIXEL, &root).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_payload_rejected() {
        let root = std::env::temp_dir().join("tastebook-media-test");
        let error = store_image("not base64!!!", &root).await.unwrap_err();
        assert_eq!(error.status_code(), 400);
    }
}
