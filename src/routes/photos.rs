use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::auth::{Access, AppState, RequireAdmin};
use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::models::PhotoUploadResponse;
use crate::storage::{PhotoUpload, StorageError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subir-foto", post(upload_photo))
        .route("/original/:photo_id", get(download_original))
}

struct UploadForm {
    filename: String,
    bytes: Vec<u8>,
    album_id: i64,
}

async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut album_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "foto" => {
                let filename = field.file_name().unwrap_or("foto.jpg").to_string();
                let bytes = field.bytes().await?;
                file = Some((filename, bytes.to_vec()));
            }
            "album_id" => album_id = Some(field.text().await?),
            _ => {}
        }
    }

    let (filename, bytes) = file
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::Validation("No archivo".to_string()))?;

    let album_id = album_id
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::Validation("Falta album_id".to_string()))?
        .parse::<i64>()
        .map_err(|_| AppError::Validation("album_id inválido".to_string()))?;

    Ok(UploadForm {
        filename,
        bytes,
        album_id,
    })
}

async fn upload_photo(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<Json<PhotoUploadResponse>> {
    let form = read_upload_form(multipart).await?;

    {
        let conn = state.pool.get().map_err(AppError::Pool)?;
        if !catalog::album_exists(&conn, form.album_id)? {
            return Err(AppError::UnknownAlbum(form.album_id));
        }
    }

    let watermarker = Arc::clone(&state.watermarker);
    let text = state.config.watermark.text.clone();
    let (raw, stamped) = tokio::task::spawn_blocking(move || {
        let stamped = watermarker.stamp(&form.bytes, &text);
        (form.bytes, stamped)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Watermark task failed: {}", e)))?;
    let stamped = stamped?;

    let url = state
        .store
        .store(&PhotoUpload {
            album_id: form.album_id,
            original_filename: &form.filename,
            bytes: &stamped,
        })
        .await?;

    let original_key = state
        .store
        .retain_original(&PhotoUpload {
            album_id: form.album_id,
            original_filename: &form.filename,
            bytes: &raw,
        })
        .await?;

    let conn = state.pool.get().map_err(AppError::Pool)?;
    let photo_id = catalog::add_photo(&conn, form.album_id, &url, original_key.as_deref())?;

    tracing::info!(
        "Photo {} stored in album {} via {}",
        photo_id,
        form.album_id,
        state.store.backend()
    );

    Ok(Json(PhotoUploadResponse {
        mensaje: "Foto subida".to_string(),
        url,
    }))
}

async fn download_original(
    State(state): State<AppState>,
    access: Access,
    Path(photo_id): Path<i64>,
) -> AppResult<Response> {
    let photo = {
        let conn = state.pool.get().map_err(AppError::Pool)?;
        catalog::get_photo(&conn, photo_id)?
    }
    .ok_or_else(|| AppError::NotFound("Foto no encontrada".to_string()))?;

    if !access.capability.is_admin() && !state.payments.is_paid(&access, &photo) {
        return Err(AppError::PaymentRequired(
            "El original requiere pago".to_string(),
        ));
    }

    let key = photo
        .original_key
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Original no disponible".to_string()))?;

    let bytes = state.store.open_original(key).await.map_err(|e| match e {
        StorageError::NotFound(_) => AppError::NotFound("Original no disponible".to_string()),
        other => AppError::Storage(other),
    })?;

    let mime_type = mime_guess::from_path(key).first_or_octet_stream().to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
