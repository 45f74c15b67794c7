#![cfg(test)]

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use axum_test::TestServer;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::json;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::app::create_app;
use crate::auth::AppState;
use crate::config::Config;
use crate::database::{init_database, DbPool};
use crate::processor::{WatermarkFont, WatermarkOptions, Watermarker};
use crate::storage::{build_store, NoPayments, PhotoStore, PhotoUpload, StorageError};

pub const TEST_ADMIN_PASSWORD: &str = "maradona10";

/// Create an in-memory SQLite database pool with full schema applied
pub fn create_test_db() -> DbPool {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(())
    });

    // A single connection: every in-memory connection is its own database.
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("Failed to create test database pool");

    let conn = pool.get().expect("Failed to get connection from pool");
    init_database(&conn).expect("Failed to initialize test database schema");

    pool
}

/// A gradient JPEG of the given size.
pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 96])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg)
        .expect("Failed to encode sample JPEG");
    buf.into_inner()
}

/// A PNG whose alpha channel fades from transparent to opaque.
pub fn sample_png_with_alpha(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        Rgba([200, 40, 40, (x * 255 / width.max(1)) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode sample PNG");
    buf.into_inner()
}

/// A store whose uploads always fail.
pub struct FailingStore;

#[async_trait]
impl PhotoStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn store(&self, _upload: &PhotoUpload<'_>) -> Result<String, StorageError> {
        Err(StorageError::Remote("store unavailable".to_string()))
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub pool: DbPool,
    pub config: Arc<Config>,
    dir: TempDir,
}

impl TestApp {
    pub fn static_dir(&self) -> PathBuf {
        self.dir.path().join("static")
    }

    /// Log in as admin and return the `Cookie` header value to send back.
    pub async fn login(&self) -> HeaderValue {
        let response = self
            .server
            .post("/login")
            .json(&json!({ "password": TEST_ADMIN_PASSWORD }))
            .await;
        response.assert_status_ok();

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login did not set a cookie")
            .to_str()
            .expect("cookie is not ASCII")
            .to_string();
        let pair = set_cookie.split(';').next().unwrap_or_default();

        HeaderValue::from_str(pair).expect("invalid cookie pair")
    }

    pub fn photo_count(&self) -> i64 {
        self.count("SELECT COUNT(*) FROM photos")
    }

    pub fn album_count(&self) -> i64 {
        self.count("SELECT COUNT(*) FROM albums")
    }

    fn count(&self, sql: &str) -> i64 {
        let conn = self.pool.get().expect("Failed to get connection");
        conn.query_row(sql, [], |row| row.get(0))
            .expect("Failed to count rows")
    }
}

fn build_test_app<F>(store: Option<Arc<dyn PhotoStore>>, configure: F) -> TestApp
where
    F: FnOnce(&mut Config),
{
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let static_dir = dir.path().join("static");
    std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");

    let mut config = Config::default();
    config.admin.password = TEST_ADMIN_PASSWORD.to_string();
    config.server.static_dir = static_dir.to_string_lossy().to_string();
    config.storage.keep_originals = true;
    configure(&mut config);
    let config = Arc::new(config);

    let store = match store {
        Some(store) => store,
        None => build_store(
            &config,
            dir.path().join("galeria"),
            dir.path().join("originals"),
        )
        .expect("Failed to build test store"),
    };

    let pool = create_test_db();
    let state = AppState {
        config: Arc::clone(&config),
        pool: pool.clone(),
        store,
        watermarker: Arc::new(Watermarker::new(
            WatermarkFont::Bitmap,
            WatermarkOptions::default(),
        )),
        payments: Arc::new(NoPayments),
    };

    let server = TestServer::new(create_app(state)).expect("Failed to start test server");

    TestApp {
        server,
        pool,
        config,
        dir,
    }
}

/// Test app backed by a local store in a temp dir, originals retained.
pub fn spawn_test_app() -> TestApp {
    build_test_app(None, |_| {})
}

pub fn spawn_test_app_with_config<F>(configure: F) -> TestApp
where
    F: FnOnce(&mut Config),
{
    build_test_app(None, configure)
}

pub fn spawn_test_app_with_store(store: Arc<dyn PhotoStore>) -> TestApp {
    build_test_app(Some(store), |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_db() {
        let pool = create_test_db();
        let conn = pool.get().expect("Failed to get connection");

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('albums', 'photos', 'sessions')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(tables, 3);
    }

    #[test]
    fn test_sample_images_decode() {
        let jpeg = image::load_from_memory(&sample_jpeg(12, 8)).unwrap();
        assert_eq!((jpeg.width(), jpeg.height()), (12, 8));

        let png = image::load_from_memory(&sample_png_with_alpha(5, 5)).unwrap();
        assert!(png.color().has_alpha());
    }

    #[tokio::test]
    async fn test_spawned_app_answers() {
        let app = spawn_test_app();
        assert_eq!(app.album_count(), 0);
        app.server.get("/check-auth").await.assert_status_ok();
    }
}
