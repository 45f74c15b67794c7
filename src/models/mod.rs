mod album;
mod auth;
mod photo;

pub use album::*;
pub use auth::*;
pub use photo::*;
