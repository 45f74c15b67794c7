//! Server-side sessions keyed by an opaque cookie token.
//!
//! Only the SHA-256 of a token is stored. A session row exists only for a
//! successful admin login; logging out deletes it.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;

use crate::database::{execute_query, fetch_one, queries, DbConn};
use crate::error::AppResult;
use crate::utils::sha256_hex;

const TOKEN_LENGTH: usize = 43;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    #[default]
    Guest,
    Admin,
}

impl Capability {
    pub fn is_admin(self) -> bool {
        self == Capability::Admin
    }
}

pub struct NewSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn create_admin_session(conn: &DbConn, lifetime_days: i64) -> AppResult<NewSession> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::days(lifetime_days);

    execute_query(
        conn,
        queries::sessions::INSERT,
        &[&sha256_hex(&token), &1i64, &timestamp(expires_at)],
    )?;

    Ok(NewSession { token, expires_at })
}

/// Unknown, expired and logged-out tokens all resolve to `Guest`.
pub fn resolve_capability(conn: &DbConn, token: &str) -> AppResult<Capability> {
    let is_admin = fetch_one(
        conn,
        queries::sessions::SELECT_ACTIVE,
        &[&sha256_hex(token), &timestamp(Utc::now())],
        |row| row.get::<_, i64>(0),
    )?;

    Ok(match is_admin {
        Some(flag) if flag != 0 => Capability::Admin,
        _ => Capability::Guest,
    })
}

pub fn revoke_session(conn: &DbConn, token: &str) -> AppResult<()> {
    execute_query(conn, queries::sessions::DELETE, &[&sha256_hex(token)])?;
    Ok(())
}

pub fn purge_expired_sessions(conn: &DbConn) -> AppResult<usize> {
    execute_query(
        conn,
        queries::sessions::DELETE_EXPIRED,
        &[&timestamp(Utc::now())],
    )
}
