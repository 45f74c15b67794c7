use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

use super::{sanitize_filename, OriginalsVault, PhotoStore, PhotoUpload, StorageError};
use crate::config::{CloudinaryConfig, SignatureAlgorithm};
use crate::utils::{sha1_hex, sha256_hex};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<RemoteError>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    message: String,
}

/// Uploads stamped photos to Cloudinary with a signed request.
#[derive(Debug)]
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    http_client: reqwest::Client,
    originals: Option<OriginalsVault>,
}

impl CloudinaryStore {
    pub fn new(
        config: CloudinaryConfig,
        originals: Option<OriginalsVault>,
    ) -> Result<Self, StorageError> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(StorageError::Config(
                "cloud_name, api_key and api_secret are required".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            originals,
        })
    }

    pub fn folder_for(&self, album_id: i64) -> String {
        format!("{}/album_{}", self.config.folder_prefix, album_id)
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Signed parameters are sorted by name and joined as a query string,
    /// then the secret is appended.
    pub fn sign(&self, folder: &str, timestamp: i64) -> String {
        let payload = format!(
            "folder={}&timestamp={}{}",
            folder, timestamp, self.config.api_secret
        );
        match self.config.signature_algorithm {
            SignatureAlgorithm::Sha1 => sha1_hex(payload),
            SignatureAlgorithm::Sha256 => sha256_hex(payload),
        }
    }
}

#[async_trait]
impl PhotoStore for CloudinaryStore {
    fn backend(&self) -> &'static str {
        "cloudinary"
    }

    async fn store(&self, upload: &PhotoUpload<'_>) -> Result<String, StorageError> {
        let folder = self.folder_for(upload.album_id);
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.sign(&folder, timestamp);

        let file = Part::bytes(upload.bytes.to_vec())
            .file_name(sanitize_filename(upload.original_filename))
            .mime_str("image/jpeg")?;

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", folder)
            .text("signature", signature);
        // SHA-1 is the server default and needs no marker.
        if self.config.signature_algorithm == SignatureAlgorithm::Sha256 {
            form = form.text("signature_algorithm", "sha256");
        }

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Remote(format!("unreadable response ({}): {}", status, e)))?;

        if !status.is_success() {
            let message = body
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            return Err(StorageError::Remote(message));
        }

        body.secure_url
            .ok_or_else(|| StorageError::Remote("response had no secure_url".to_string()))
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
}
