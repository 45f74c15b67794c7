use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};

use crate::auth::{
    create_admin_session, purge_expired_sessions, revoke_session, verify_admin_password, Access,
    AppState,
};
use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CheckAuthResponse, LoginRequest, LoginResponse, LogoutResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/check-auth", get(check_auth))
        .route("/logout", post(logout))
}

fn session_cookie(session: &SessionConfig, token: &str, max_age_seconds: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.cookie_name, token, max_age_seconds
    );
    if session.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

async fn login(
    State(state): State<AppState>,
    access: Access,
    Json(request): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let password = request.password.unwrap_or_default();
    if !verify_admin_password(&password, &state.config.admin) {
        tracing::warn!("Rejected admin login attempt");
        return Err(AppError::Authentication(
            "Contraseña incorrecta".to_string(),
        ));
    }

    let conn = state.pool.get().map_err(AppError::Pool)?;
    if let Some(previous) = access.token.as_deref() {
        revoke_session(&conn, previous)?;
    }
    let purged = purge_expired_sessions(&conn)?;
    if purged > 0 {
        tracing::info!("Purged {} expired sessions", purged);
    }

    let session = &state.config.session;
    let created = create_admin_session(&conn, session.lifetime_days)?;
    let cookie = session_cookie(session, &created.token, session.lifetime_days * 86_400);

    tracing::info!("Admin session opened, expires {}", created.expires_at);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            success: true,
            mensaje: "Sesión iniciada".to_string(),
        }),
    ))
}

async fn check_auth(access: Access) -> Json<CheckAuthResponse> {
    Json(CheckAuthResponse {
        is_admin: access.capability.is_admin(),
    })
}

async fn logout(State(state): State<AppState>, access: Access) -> AppResult<impl IntoResponse> {
    if let Some(token) = access.token.as_deref() {
        let conn = state.pool.get().map_err(AppError::Pool)?;
        revoke_session(&conn, token)?;
    }

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie(&state.config.session, "", 0))]),
        Json(LogoutResponse { success: true }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{spawn_test_app, TEST_ADMIN_PASSWORD};
    use axum::http::{header::COOKIE, HeaderValue, StatusCode};
    use serde_json::{json, Value};

    #[test]
    fn test_session_cookie_attributes() {
        let mut session = SessionConfig::default();
        let cookie = session_cookie(&session, "abc", 604_800);
        assert_eq!(
            cookie,
            "portfolio_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800"
        );

        session.secure_cookie = true;
        assert!(session_cookie(&session, "abc", 1).ends_with("; Secure"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = spawn_test_app();

        let response = app
            .server
            .post("/login")
            .json(&json!({ "password": "wrong" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_missing_password_is_unauthorized() {
        let app = spawn_test_app();

        let response = app.server.post("/login").json(&json!({})).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_sets_week_long_cookie() {
        let app = spawn_test_app();

        let response = app
            .server
            .post("/login")
            .json(&json!({ "password": TEST_ADMIN_PASSWORD }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);

        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("portfolio_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[tokio::test]
    async fn test_check_auth_follows_login_and_logout() {
        let app = spawn_test_app();

        let guest: Value = app.server.get("/check-auth").await.json();
        assert_eq!(guest, json!({ "isAdmin": false }));

        let cookie = app.login().await;
        let admin: Value = app
            .server
            .get("/check-auth")
            .add_header(COOKIE, cookie.clone())
            .await
            .json();
        assert_eq!(admin, json!({ "isAdmin": true }));

        let response = app
            .server
            .post("/logout")
            .add_header(COOKIE, cookie.clone())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "success": true }));
        assert!(response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        // The old token no longer grants anything.
        let after: Value = app
            .server
            .get("/check-auth")
            .add_header(COOKIE, cookie)
            .await
            .json();
        assert_eq!(after, json!({ "isAdmin": false }));
    }

    #[tokio::test]
    async fn test_logout_without_session_succeeds() {
        let app = spawn_test_app();

        let response = app.server.post("/logout").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "success": true }));
    }

    #[tokio::test]
    async fn test_relogin_replaces_previous_session() {
        let app = spawn_test_app();
        let first = app.login().await;

        let response = app
            .server
            .post("/login")
            .add_header(COOKIE, first.clone())
            .json(&json!({ "password": TEST_ADMIN_PASSWORD }))
            .await;
        response.assert_status_ok();

        let stale: Value = app
            .server
            .get("/check-auth")
            .add_header(COOKIE, first)
            .await
            .json();
        assert_eq!(stale, json!({ "isAdmin": false }));
    }

    #[tokio::test]
    async fn test_login_purges_expired_sessions() {
        let app = spawn_test_app();
        {
            let conn = app.pool.get().unwrap();
            crate::auth::create_admin_session(&conn, -1).unwrap();
            crate::auth::create_admin_session(&conn, -2).unwrap();
        }

        app.login().await;

        let conn = app.pool.get().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_unknown_cookie_is_guest() {
        let app = spawn_test_app();

        let body: Value = app
            .server
            .get("/check-auth")
            .add_header(COOKIE, HeaderValue::from_static("portfolio_session=forged"))
            .await
            .json();
        assert_eq!(body, json!({ "isAdmin": false }));
    }
}
