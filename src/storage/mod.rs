//! Photo persistence.
//!
//! A `PhotoStore` takes stamped bytes and returns the URL the photo will be
//! served from. Which backend is used is a deployment choice.

mod cloudinary;
mod local;
mod originals;
pub mod premium;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Config, StorageBackend};

pub use cloudinary::CloudinaryStore;
pub use local::LocalStore;
pub use originals::OriginalsVault;
pub use premium::{NoPayments, PaymentGate};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote store rejected upload: {0}")]
    Remote(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("storage misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::Remote(e.to_string())
    }
}

/// Bytes to persist for one uploaded photo.
#[derive(Debug, Clone, Copy)]
pub struct PhotoUpload<'a> {
    pub album_id: i64,
    pub original_filename: &'a str,
    pub bytes: &'a [u8],
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Persist stamped bytes and return their retrieval URL.
    async fn store(&self, upload: &PhotoUpload<'_>) -> Result<String, StorageError>;

    /// Keep the unstamped bytes somewhere private. Returns the key, or `None`
    /// when retention is disabled.
    async fn retain_original(
        &self,
        _upload: &PhotoUpload<'_>,
    ) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn open_original(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound(key.to_string()))
    }

    /// Directory served at the gallery route, for backends that write locally.
    fn public_dir(&self) -> Option<&Path> {
        None
    }
}

/// Strip directory components and anything unsafe from an uploaded filename.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    // Windows clients may send backslash-separated paths.
    let base = base.rsplit('\\').next().unwrap_or_default();

    let cleaned: String = base
        .trim_start_matches('.')
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "foto".to_string()
    } else {
        cleaned
    }
}

pub fn build_store(
    config: &Config,
    gallery_dir: PathBuf,
    originals_dir: PathBuf,
) -> Result<Arc<dyn PhotoStore>, StorageError> {
    let vault = config
        .storage
        .keep_originals
        .then(|| OriginalsVault::new(originals_dir));

    match config.storage.backend {
        StorageBackend::Local => Ok(Arc::new(LocalStore::new(
            gallery_dir,
            &config.server.public_base_url,
            config.storage.naming,
            vault,
        ))),
        StorageBackend::Cloudinary => Ok(Arc::new(CloudinaryStore::new(
            config.cloudinary.clone(),
            vault,
        )?)),
    }
}
