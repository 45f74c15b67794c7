use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::auth::AppState;
use crate::config::ServerConfig;
use crate::constants::{DATA_DIR, GALLERY_ROUTE};
use crate::logging::request_logger;
use crate::routes::api_router;
use crate::VERSION;

#[derive(Serialize)]
struct HealthcheckResponse {
    status: String,
    version: String,
}

async fn healthcheck() -> Json<HealthcheckResponse> {
    Json(HealthcheckResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
    })
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    // Credentialed CORS needs explicit lists, wildcards are rejected by browsers.
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Resolves symlinks for the part of `path` that exists and appends the rest.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => resolve(parent).join(name),
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// True when serving `static_dir` would publish anything under `private_dir`.
pub fn exposes_path(static_dir: &Path, private_dir: &Path) -> bool {
    match static_dir.canonicalize() {
        Ok(root) => resolve(private_dir).starts_with(root),
        Err(_) => false,
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    let server = &config.server;
    let body_limit = server.max_upload_mb.saturating_mul(1024 * 1024);

    let mut app = Router::new()
        .route("/healthcheck", get(healthcheck))
        .merge(api_router());

    if let Some(gallery_dir) = state.store.public_dir() {
        app = app.nest_service(GALLERY_ROUTE, ServeDir::new(gallery_dir));
    }

    let static_dir = Path::new(&server.static_dir);
    if exposes_path(static_dir, &DATA_DIR) {
        tracing::error!(
            "Static dir {:?} contains the data dir {:?}, not serving static files",
            static_dir,
            *DATA_DIR
        );
    } else {
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(cors_layer(server))
            .layer(middleware::from_fn(request_logger))
            .layer(DefaultBodyLimit::max(body_limit)),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::exposes_path;
    use crate::config::ServerConfig;
    use crate::test_utils::{spawn_test_app, spawn_test_app_with_config};
    use axum::http::{header, HeaderValue, StatusCode};
    use serde_json::Value;

    #[tokio::test]
    async fn test_healthcheck() {
        let app = spawn_test_app();

        let body: Value = app.server.get("/healthcheck").await.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_index_served_from_static_dir() {
        let app = spawn_test_app();
        std::fs::write(app.static_dir().join("index.html"), "<h1>Portfolio</h1>").unwrap();

        let response = app.server.get("/").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "<h1>Portfolio</h1>");
    }

    #[tokio::test]
    async fn test_missing_gallery_file_is_not_found() {
        let app = spawn_test_app();

        app.server
            .get("/galeria/nope.jpg")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_configured_origin_allows_credentials() {
        let app = spawn_test_app_with_config(|config| {
            config.server.cors_origins = vec!["https://fotos.example.com".to_string()];
        });

        let response = app
            .server
            .get("/check-auth")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("https://fotos.example.com"),
            )
            .await;

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://fotos.example.com"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[test]
    fn test_exposes_path() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(&public).unwrap();

        assert!(exposes_path(dir.path(), &dir.path().join("data")));
        assert!(exposes_path(dir.path(), &dir.path().join("data/config.yaml")));
        assert!(!exposes_path(&public, &dir.path().join("data")));
        assert!(!exposes_path(&dir.path().join("missing"), &dir.path().join("missing/data")));
    }

    #[tokio::test]
    async fn test_default_static_dir_hides_private_files() {
        let app = spawn_test_app_with_config(|config| {
            config.server.static_dir = ServerConfig::default().static_dir;
        });

        app.server
            .get("/data/config.yaml")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .get("/Cargo.toml")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_dir_holding_data_dir_is_not_served() {
        let app = spawn_test_app_with_config(|config| {
            config.server.static_dir = ".".to_string();
        });

        app.server
            .get("/Cargo.toml")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .get("/healthcheck")
            .await
            .assert_status_ok();
    }
}
