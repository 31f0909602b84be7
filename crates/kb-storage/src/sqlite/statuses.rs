//! The status registry: a fixed set seeded at schema creation,
//! read-only at the public surface thereafter.

use rusqlite::{params, Connection, OptionalExtension};

use kb_core::error::{Fault, Result};
use kb_core::registry::Status;

pub fn list(conn: &Connection) -> Result<Vec<Status>> {
    let mut stmt = conn
        .prepare("SELECT id, name, is_closed FROM statuses ORDER BY id")
        .map_err(|e| Fault::storage(format!("failed to prepare status listing: {e}")))?;
    let rows = stmt
        .query_map([], scan_status)
        .map_err(|e| Fault::storage(format!("failed to list statuses: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan status row: {e}")))?);
    }
    Ok(out)
}

pub fn get_by_name(conn: &Connection, name: &str) -> Result<Status> {
    conn.query_row(
        "SELECT id, name, is_closed FROM statuses WHERE name = ?1",
        params![name],
        scan_status,
    )
    .optional()
    .map_err(|e| Fault::storage(format!("failed to read status {name}: {e}")))?
    .ok_or_else(|| Fault::not_found("status", name))
}

pub fn exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM statuses WHERE name = ?1", params![name], |row| row.get(0))
        .map_err(|e| Fault::storage(format!("failed to check status {name}: {e}")))?;
    Ok(count > 0)
}

fn scan_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<Status> {
    let is_closed: i64 = row.get("is_closed")?;
    Ok(Status {
        id: row.get("id")?,
        name: row.get("name")?,
        is_closed: is_closed != 0,
    })
}
