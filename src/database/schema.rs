use crate::database::DbConn;
use crate::error::AppResult;

const SCHEMA: &str = include_str!("../../schema.sql");

/// Create every table and index if missing. Safe to run on each startup.
pub fn init_database(conn: &DbConn) -> AppResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
