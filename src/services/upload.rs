//! Local filesystem storage for uploaded images.
//!
//! Files get random hex names so uploads can never collide with or
//! overwrite each other, and served paths are validated against traversal.

use rand::Rng;
use std::path::{Path, PathBuf};

use crate::types::{ApiError, Result};

/// Maps upload content types to file extensions. Anything else is refused.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

/// Content type for a stored file, derived from its extension.
pub fn content_type_for_file(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Store `data` under a fresh random name, returning the public URL path.
    pub async fn save(&self, data: &[u8], extension: &str) -> Result<String> {
        let mut name_bytes = [0u8; 8];
        rand::thread_rng().fill(&mut name_bytes);
        let file_name = format!("{}.{}", hex::encode(name_bytes), extension);

        tokio::fs::write(self.root.join(&file_name), data).await?;

        Ok(format!("/uploads/{}", file_name))
    }

    /// Read a stored file by its bare name.
    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        let safe_name = Self::sanitize(file_name)?;
        match tokio::fs::read(self.root.join(safe_name)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ApiError::NotFound(format!("File '{}'", file_name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored file, returning whether it existed.
    pub async fn delete(&self, file_name: &str) -> Result<bool> {
        let safe_name = Self::sanitize(file_name)?;
        match tokio::fs::remove_file(self.root.join(safe_name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Reject names that could escape the upload directory.
    fn sanitize(file_name: &str) -> Result<&str> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return Err(ApiError::BadRequest("Invalid file name".to_string()));
        }
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.ensure_root().await.unwrap();

        let url = store.save(b"fake-png-bytes", "png").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let name = url.strip_prefix("/uploads/").unwrap();
        assert_eq!(store.read(name).await.unwrap(), b"fake-png-bytes");

        assert!(store.delete(name).await.unwrap());
        assert!(!store.delete(name).await.unwrap());
        assert!(matches!(
            store.read(name).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_names_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        store.ensure_root().await.unwrap();

        let a = store.save(b"one", "jpg").await.unwrap();
        let b = store.save(b"two", "jpg").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        for name in ["../etc/passwd", "a/b.png", "..", ""] {
            assert!(matches!(
                store.read(name).await,
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(extension_for_content_type("image/png"), Some("png"));
        assert_eq!(extension_for_content_type("application/zip"), None);
        assert_eq!(content_type_for_file("abc123.webp"), "image/webp");
        assert_eq!(content_type_for_file("noext"), "application/octet-stream");
    }
}
