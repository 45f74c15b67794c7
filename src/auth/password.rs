use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::config::AdminConfig;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_argon2(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check a candidate against the shared admin secret.
///
/// A configured Argon2 hash wins over the plain password.
pub fn verify_admin_password(candidate: &str, admin: &AdminConfig) -> bool {
    match admin.password_hash.as_deref().filter(|h| !h.is_empty()) {
        Some(hash) => verify_argon2(candidate, hash),
        None => {
            !admin.password.is_empty()
                && constant_time_eq(candidate.as_bytes(), admin.password.as_bytes())
        }
    }
}
