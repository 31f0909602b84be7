//! Small key/value table for schema bookkeeping (schema version today;
//! available for future rebuild/housekeeping markers).

use rusqlite::{params, Connection, OptionalExtension};

use kb_core::error::{Fault, Result};

pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(|e| Fault::storage(format!("failed to read metadata key {key}: {e}")))
}

pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(|e| Fault::storage(format!("failed to write metadata key {key}: {e}")))?;
    Ok(())
}
