use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use headers::{Cookie, HeaderMapExt};
use std::sync::Arc;

use crate::auth::session::{resolve_capability, Capability};
use crate::config::Config;
use crate::database::DbPool;
use crate::error::AppError;
use crate::processor::Watermarker;
use crate::storage::{PaymentGate, PhotoStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: DbPool,
    pub store: Arc<dyn PhotoStore>,
    pub watermarker: Arc<Watermarker>,
    pub payments: Arc<dyn PaymentGate>,
}

/// The caller's capability, resolved from the session cookie.
#[derive(Clone, Debug, Default)]
pub struct Access {
    pub capability: Capability,
    /// Raw session token presented by the client, if any.
    pub token: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Access
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = parts
            .headers
            .typed_get::<Cookie>()
            .and_then(|cookies| {
                cookies
                    .get(&app_state.config.session.cookie_name)
                    .map(str::to_string)
            })
            .filter(|t| !t.is_empty());

        let capability = match token.as_deref() {
            Some(token) => {
                let conn = app_state.pool.get().map_err(AppError::Pool)?;
                resolve_capability(&conn, token)?
            }
            None => Capability::Guest,
        };

        Ok(Access { capability, token })
    }
}

// Admin extractor
pub struct RequireAdmin(pub Access);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let access = Access::from_request_parts(parts, state).await?;

        if !access.capability.is_admin() {
            return Err(AppError::Authorization("No autorizado".to_string()));
        }

        Ok(RequireAdmin(access))
    }
}
