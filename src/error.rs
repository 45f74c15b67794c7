use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::processor::WatermarkError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown album: {0}")]
    UnknownAlbum(i64),

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Watermark error: {0}")]
    Watermark(#[from] WatermarkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UnknownAlbum(id) => {
                (StatusCode::BAD_REQUEST, format!("El álbum {} no existe", id))
            }
            AppError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Watermark(e) => {
                tracing::error!("Watermark error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Fallo al procesar imagen".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Fallo al guardar la foto".to_string(),
                )
            }
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {}", e);
                (e.status(), "Formulario inválido".to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Connection pool error".to_string(),
                )
            }
        };

        let body = match self {
            AppError::Authentication(_) => Json(json!({ "success": false, "error": message })),
            _ => Json(json!({ "error": message })),
        };
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
