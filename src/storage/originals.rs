use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use super::{sanitize_filename, PhotoUpload, StorageError};

/// Private directory for pre-watermark uploads. Never mounted on a public route.
#[derive(Debug, Clone)]
pub struct OriginalsVault {
    root: PathBuf,
}

impl OriginalsVault {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write the raw upload to `album_<id>/<uuid>_<name>` and return that key.
    pub async fn keep(&self, upload: &PhotoUpload<'_>) -> Result<String, StorageError> {
        let key = format!(
            "album_{}/{}_{}",
            upload.album_id,
            Uuid::new_v4().simple(),
            sanitize_filename(upload.original_filename)
        );
        let path = self.resolve(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, upload.bytes).await?;

        tracing::debug!("Original retained as {}", key);
        Ok(key)
    }

    pub async fn open(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Map a stored key to a path under the vault root. Keys that could escape
    /// the root are refused.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}
