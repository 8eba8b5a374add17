use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{error::AppError, storage::ImageStore};

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// A file received from a multipart form.
pub struct UploadItem {
    pub file_name: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded.")]
    Empty,
    #[error("Invalid file type. Only JPG, PNG, WEBP allowed.")]
    UnsupportedType,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Internal(inner) => AppError::Internal(inner),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// Lowercased extension if it is one we accept.
pub fn image_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().copied().find(|allowed| *allowed == ext)
}

/// Checks the upload without touching storage.
pub fn check_upload(item: &UploadItem) -> Result<&'static str, UploadError> {
    if item.body.is_empty() {
        return Err(UploadError::Empty);
    }
    item.file_name
        .as_deref()
        .and_then(image_extension)
        .ok_or(UploadError::UnsupportedType)
}

/// Stores the file under a fresh random name, keeping only its extension.
pub async fn store_image(store: &dyn ImageStore, item: UploadItem) -> Result<StoredImage, UploadError> {
    let ext = check_upload(&item)?;
    let name = format!("{}.{}", Uuid::new_v4(), ext);
    let url = store.put_image(&name, item.body).await?;
    debug!(%name, "image stored");
    Ok(StoredImage { name, url })
}

/// Removes an image that ended up unused; failures are only logged.
pub async fn discard_image(store: &dyn ImageStore, image: &StoredImage) {
    if let Err(e) = store.delete_image(&image.name).await {
        warn!(error = %e, name = %image.name, "failed to remove unused image");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalImageStore;

    fn item(name: &str, body: &'static [u8]) -> UploadItem {
        UploadItem {
            file_name: Some(name.into()),
            body: Bytes::from_static(body),
        }
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("cake.jpg"), Some("jpg"));
        assert_eq!(image_extension("cake.JPEG"), Some("jpeg"));
        assert_eq!(image_extension("my.cake.png"), Some("png"));
        assert_eq!(image_extension("cake.webp"), Some("webp"));
        assert_eq!(image_extension("cake.gif"), None);
        assert_eq!(image_extension("cake"), None);
        assert_eq!(image_extension("cake.png.exe"), None);
    }

    #[test]
    fn check_upload_rejects_empty_and_unknown() {
        assert!(matches!(check_upload(&item("a.png", b"")), Err(UploadError::Empty)));
        assert!(matches!(check_upload(&item("a.svg", b"x")), Err(UploadError::UnsupportedType)));
        let nameless = UploadItem { file_name: None, body: Bytes::from_static(b"x") };
        assert!(matches!(check_upload(&nameless), Err(UploadError::UnsupportedType)));
        assert_eq!(check_upload(&item("a.PNG", b"x")).unwrap(), "png");
    }

    #[tokio::test]
    async fn store_and_discard_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("recipeshare-upload-{}", Uuid::new_v4()));
        let store = LocalImageStore::new(&dir, "").await.unwrap();

        let stored = store_image(&store, item("Photo.JPG", b"jpeg-bytes")).await.unwrap();
        assert!(stored.name.ends_with(".jpg"));
        assert_eq!(stored.url, format!("/images/{}", stored.name));
        assert!(dir.join(&stored.name).exists());

        discard_image(&store, &stored).await;
        assert!(!dir.join(&stored.name).exists());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn upload_errors_are_bad_requests() {
        use axum::http::StatusCode;
        assert_eq!(AppError::from(UploadError::Empty).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(UploadError::UnsupportedType).status(), StatusCode::BAD_REQUEST);
    }
}
