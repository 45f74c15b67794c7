use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{sanitize_filename, OriginalsVault, PhotoStore, PhotoUpload, StorageError};
use crate::config::NamingStrategy;
use crate::constants::GALLERY_ROUTE;
use crate::utils::sha256_hex;

/// Writes stamped photos into a directory served under the gallery route.
#[derive(Debug)]
pub struct LocalStore {
    gallery_dir: PathBuf,
    base_url: String,
    naming: NamingStrategy,
    originals: Option<OriginalsVault>,
}

impl LocalStore {
    pub fn new(
        gallery_dir: PathBuf,
        public_base_url: &str,
        naming: NamingStrategy,
        originals: Option<OriginalsVault>,
    ) -> Self {
        Self {
            gallery_dir,
            base_url: public_base_url.trim_end_matches('/').to_string(),
            naming,
            originals,
        }
    }

    /// Filename for stamped bytes. Stored content is always JPEG.
    pub fn key_for(&self, upload: &PhotoUpload<'_>) -> String {
        match self.naming {
            NamingStrategy::ContentHash => format!("{}.jpg", sha256_hex(upload.bytes)),
            NamingStrategy::Original => {
                let name = sanitize_filename(upload.original_filename);
                let stem = Path::new(&name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or(name);
                format!("{}.jpg", stem)
            }
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}{}/{}", self.base_url, GALLERY_ROUTE, key)
    }
}

#[async_trait]
impl PhotoStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn store(&self, upload: &PhotoUpload<'_>) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.gallery_dir).await?;

        let key = self.key_for(upload);
        let path = self.gallery_dir.join(&key);

        if self.naming == NamingStrategy::Original && tokio::fs::try_exists(&path).await? {
            tracing::warn!("Overwriting existing gallery file {}", key);
        }

        tokio::fs::write(&path, upload.bytes).await?;
        Ok(self.url_for(&key))
    }

    async fn retain_original(
        &self,
        upload: &PhotoUpload<'_>,
    ) -> Result<Option<String>, StorageError> {
        match &self.originals {
            Some(vault) => vault.keep(upload).await.map(Some),
            None => Ok(None),
        }
    }

    async fn open_original(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        match &self.originals {
            Some(vault) => vault.open(key).await,
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    fn public_dir(&self) -> Option<&Path> {
        Some(&self.gallery_dir)
    }
}
