//! The per-type sequence allocator: guarantees a numeric id is
//! never reused, even across deletions, and survives a crash between
//! allocation and file write because the allocating transaction and
//! the caller's write both go through the same connection lock.

use rusqlite::{params, Connection, OptionalExtension};

use kb_core::enums::BaseKind;
use kb_core::error::{Fault, Result};

/// Allocates the next id for `type_name` and persists the new high-water
/// mark in the same statement, so two concurrent allocations can never
/// observe the same value (the single `Mutex<Connection>` already
/// serializes callers, but this keeps the invariant correct even if that
/// changes later).
pub fn next(conn: &Connection, type_name: &str) -> Result<i64> {
    let affected = conn
        .execute(
            "UPDATE sequences SET current_value = current_value + 1 WHERE type = ?1",
            params![type_name],
        )
        .map_err(|e| Fault::storage(format!("failed to advance sequence for {type_name}: {e}")))?;
    if affected == 0 {
        return Err(Fault::not_found("type", type_name));
    }
    conn.query_row(
        "SELECT current_value FROM sequences WHERE type = ?1",
        params![type_name],
        |row| row.get(0),
    )
    .map_err(|e| Fault::storage(format!("failed to read sequence for {type_name}: {e}")))
}

pub fn current_value(conn: &Connection, type_name: &str) -> Result<i64> {
    conn.query_row(
        "SELECT current_value FROM sequences WHERE type = ?1",
        params![type_name],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| Fault::storage(format!("failed to read sequence for {type_name}: {e}")))?
    .ok_or_else(|| Fault::not_found("type", type_name))
}

/// Raises the stored high-water mark to `at_least` if it is currently
/// lower. Used by `rebuild` to reconcile the sequence table against the
/// highest numeric id actually present on disk, so a rebuild after manual
/// file edits never reissues an id already in use.
pub fn reconcile(conn: &Connection, type_name: &str, at_least: i64, base_kind: BaseKind) -> Result<()> {
    conn.execute(
        "INSERT INTO sequences (type, current_value, base_kind) VALUES (?1, ?2, ?3)
         ON CONFLICT(type) DO UPDATE SET current_value = MAX(current_value, excluded.current_value)",
        params![type_name, at_least, base_kind.as_str()],
    )
    .map_err(|e| Fault::storage(format!("failed to reconcile sequence for {type_name}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;

    #[test]
    fn next_is_monotonic_and_never_reused() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                assert_eq!(next(conn, "issues")?, 1);
                assert_eq!(next(conn, "issues")?, 2);
                assert_eq!(next(conn, "issues")?, 3);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn reconcile_only_raises_the_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                next(conn, "issues")?;
                reconcile(conn, "issues", 10, BaseKind::Tasks)?;
                assert_eq!(current_value(conn, "issues")?, 10);
                reconcile(conn, "issues", 3, BaseKind::Tasks)?;
                assert_eq!(current_value(conn, "issues")?, 10);
                Ok(())
            })
            .unwrap();
    }
}
