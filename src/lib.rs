pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod processor;
pub mod routes;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
