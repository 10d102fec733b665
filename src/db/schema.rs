// src/db/schema.rs
//
// Store schema bootstrap
//
// PRINCIPLES:
// - Idempotent: safe to run against an already initialized store
// - No versioning, no upgrades

use log::info;
use rusqlite::Connection;

use crate::error::DataResult;

/// Create the `genre` and `movie` tables if they do not exist yet.
pub fn initialize_schema(conn: &Connection) -> DataResult<()> {
    let schema = include_str!("../../schema.sql");

    conn.execute_batch(schema)?;

    info!("Movie store schema is in place");
    Ok(())
}
