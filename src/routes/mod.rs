mod albums;
mod auth;
mod photos;

use axum::Router;

use crate::auth::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(albums::router())
        .merge(photos::router())
}
