use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-1 of `bytes`.
pub fn sha1_hex(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes.as_ref());
    hex_encode(hasher.finalize())
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    hex_encode(hasher.finalize())
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    bytes
        .as_ref()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
