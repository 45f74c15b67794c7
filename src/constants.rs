use once_cell::sync::Lazy;
use std::path::PathBuf;

pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("PORTFOLIO_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"))
});

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("config.yaml"));
pub static DATABASE_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("database.sqlite"));
pub static GALLERY_DIR: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("galeria"));
pub static ORIGINALS_DIR: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("originals"));

/// Public route prefix under which locally stored photos are served.
pub const GALLERY_ROUTE: &str = "/galeria";

/// Locations probed for a scalable watermark font when none is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub const DEFAULT_WATERMARK_TEXT: &str = "PORTFOLIO";
pub const DEFAULT_FONT_DIVISOR: u32 = 12;
pub const DEFAULT_WATERMARK_OPACITY: u8 = 100;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 7;
pub const DEFAULT_SESSION_COOKIE: &str = "portfolio_session";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;
