pub mod hash;

pub use hash::{sha1_hex, sha256_hex};
