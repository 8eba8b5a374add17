use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Where uploaded recipe images end up.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `body` under `name` and returns the URL clients should use.
    async fn put_image(&self, name: &str, body: Bytes) -> anyhow::Result<String>;
    /// Removes a previously stored image; missing files are not an error.
    async fn delete_image(&self, name: &str) -> anyhow::Result<()>;
}

/// Plain filesystem storage, served back by the static file route.
#[derive(Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

/// Route prefix under which `LocalImageStore` files are served.
pub const IMAGES_ROUTE: &str = "/images";

impl LocalImageStore {
    pub async fn new(root: impl Into<PathBuf>, public_base_url: &str) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self {
            root,
            base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}{}/{}", self.base_url, IMAGES_ROUTE, name)
    }

    fn path_for(&self, name: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            !name.is_empty() && !name.contains(&['/', '\\'][..]) && name != "." && name != "..",
            "invalid image name {name:?}"
        );
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put_image(&self, name: &str, body: Bytes) -> anyhow::Result<String> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write image {}", path.display()))?;
        Ok(self.url_for(name))
    }

    async fn delete_image(&self, name: &str) -> anyhow::Result<()> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove image {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("recipeshare-test-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn put_then_delete_image() {
        let dir = scratch_dir();
        let store = LocalImageStore::new(&dir, "http://localhost:8080/").await.unwrap();

        let url = store.put_image("a.png", Bytes::from_static(b"png")).await.unwrap();
        assert_eq!(url, "http://localhost:8080/images/a.png");
        assert_eq!(tokio::fs::read(dir.join("a.png")).await.unwrap(), b"png");

        store.delete_image("a.png").await.unwrap();
        assert!(!dir.join("a.png").exists());
        // second delete is a no-op
        store.delete_image("a.png").await.unwrap();

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn relative_urls_without_base() {
        let dir = scratch_dir();
        let store = LocalImageStore::new(&dir, "").await.unwrap();
        assert_eq!(store.url_for("x.jpg"), "/images/x.jpg");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = scratch_dir();
        let store = LocalImageStore::new(&dir, "").await.unwrap();
        assert!(store.put_image("../evil.png", Bytes::new()).await.is_err());
        assert!(store.put_image("..", Bytes::new()).await.is_err());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
