use crate::constants::{
    DEFAULT_FONT_DIVISOR, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_UPLOAD_MB, DEFAULT_SESSION_COOKIE,
    DEFAULT_SESSION_LIFETIME_DAYS, DEFAULT_WATERMARK_OPACITY, DEFAULT_WATERMARK_TEXT,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix for photo URLs returned by the local store, e.g. `https://fotos.example.com`.
    /// Empty keeps URLs relative.
    #[serde(default)]
    pub public_base_url: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    /// Allowed CORS origins. Empty allows any origin without credentials.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> String {
    "./public".to_string()
}

fn default_max_upload_mb() -> usize {
    DEFAULT_MAX_UPLOAD_MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: String::new(),
            static_dir: default_static_dir(),
            max_upload_mb: default_max_upload_mb(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_password")]
    pub password: String,
    /// Argon2 PHC string. Takes precedence over `password` when set.
    #[serde(default)]
    pub password_hash: Option<String>,
}

fn default_admin_password() -> String {
    "change-me".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: default_admin_password(),
            password_hash: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_lifetime_days")]
    pub lifetime_days: i64,
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_cookie_name() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

fn default_lifetime_days() -> i64 {
    DEFAULT_SESSION_LIFETIME_DAYS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            lifetime_days: default_lifetime_days(),
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    #[serde(default = "default_watermark_text")]
    pub text: String,
    #[serde(default)]
    pub font_path: Option<String>,
    /// Font size is the image width divided by this value.
    #[serde(default = "default_font_divisor")]
    pub font_divisor: u32,
    /// Text alpha out of 255.
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_watermark_text() -> String {
    DEFAULT_WATERMARK_TEXT.to_string()
}

fn default_font_divisor() -> u32 {
    DEFAULT_FONT_DIVISOR
}

fn default_opacity() -> u8 {
    DEFAULT_WATERMARK_OPACITY
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: default_watermark_text(),
            font_path: None,
            font_divisor: default_font_divisor(),
            opacity: default_opacity(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Local,
    Cloudinary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// `<sha256 of stamped bytes>.jpg`
    #[default]
    ContentHash,
    /// Reuse the uploaded filename. Same-named uploads overwrite each other.
    Original,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub naming: NamingStrategy,
    #[serde(default)]
    pub keep_originals: bool,
}

/// Digest used to sign upload requests. Must match the account's setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_folder_prefix")]
    pub folder_prefix: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,
}

fn default_api_base() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

fn default_folder_prefix() -> String {
    "portafolio".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder_prefix: default_folder_prefix(),
            timeout_seconds: default_timeout_seconds(),
            api_base: default_api_base(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
}

pub fn load_config(config_path: &Path) -> Config {
    let mut config = if !config_path.exists() {
        Config::default()
    } else {
        match fs::read_to_string(config_path) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Invalid config at {:?}, using defaults: {}", config_path, e);
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Secrets can be supplied through the environment instead of the config file.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(password) = non_empty("PORTFOLIO_ADMIN_PASSWORD") {
        config.admin.password = password;
    }
    if let Some(cloud_name) = non_empty("CLOUD_NAME") {
        config.cloudinary.cloud_name = cloud_name;
    }
    if let Some(api_key) = non_empty("CLOUD_API_KEY") {
        config.cloudinary.api_key = api_key;
    }
    if let Some(api_secret) = non_empty("CLOUD_API_SECRET") {
        config.cloudinary.api_secret = api_secret;
    }
}

pub fn save_default_config(config_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).map_err(|e| std::io::Error::other(e.to_string()))?;
    fs::write(config_path, yaml)
}
