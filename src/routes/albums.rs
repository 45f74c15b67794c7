use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::auth::{AppState, RequireAdmin};
use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::models::{AlbumCreateRequest, AlbumCreateResponse, AlbumWithPhotos};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crear-album", post(create_album))
        .route("/obtener-datos", get(list_albums))
}

async fn create_album(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(request): Json<AlbumCreateRequest>,
) -> AppResult<Json<AlbumCreateResponse>> {
    let conn = state.pool.get().map_err(AppError::Pool)?;
    let id = catalog::create_album(
        &conn,
        request.titulo.as_deref(),
        request.categoria.as_deref(),
    )?;

    tracing::info!("Album {} created", id);

    Ok(Json(AlbumCreateResponse {
        id,
        mensaje: "Álbum creado".to_string(),
    }))
}

async fn list_albums(State(state): State<AppState>) -> AppResult<Json<Vec<AlbumWithPhotos>>> {
    let conn = state.pool.get().map_err(AppError::Pool)?;
    Ok(Json(catalog::list_albums(&conn)?))
}
