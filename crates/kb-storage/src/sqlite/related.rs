//! The `related_items` table: an ordered, de-duplicated
//! adjacency list from one item to others, stored by position so the
//! front-matter `related:` array's order round-trips exactly.

use rusqlite::{params, Connection};

use kb_core::error::{Fault, Result};

pub fn set_related(conn: &Connection, type_name: &str, id: &str, related: &[String]) -> Result<()> {
    conn.execute(
        "DELETE FROM related_items WHERE source_type = ?1 AND source_id = ?2",
        params![type_name, id],
    )
    .map_err(|e| Fault::storage(format!("failed to clear related references for {type_name}-{id}: {e}")))?;

    for (position, reference) in related.iter().enumerate() {
        let (target_type, target_id) = kb_core::id::parse_reference(reference)
            .ok_or_else(|| Fault::validation(format!("malformed reference: {reference}")))?;
        conn.execute(
            "INSERT INTO related_items (source_type, source_id, target_type, target_id, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![type_name, id, target_type, target_id, position as i64],
        )
        .map_err(|e| Fault::storage(format!("failed to insert related reference {reference}: {e}")))?;
    }
    Ok(())
}

pub fn related_for_item(conn: &Connection, type_name: &str, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT target_type, target_id FROM related_items
             WHERE source_type = ?1 AND source_id = ?2 ORDER BY position",
        )
        .map_err(|e| Fault::storage(format!("failed to prepare related lookup: {e}")))?;
    let rows = stmt
        .query_map(params![type_name, id], |row| {
            let target_type: String = row.get(0)?;
            let target_id: String = row.get(1)?;
            Ok(format!("{target_type}-{target_id}"))
        })
        .map_err(|e| Fault::storage(format!("failed to read related references for {type_name}-{id}: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan related row: {e}")))?);
    }
    Ok(out)
}

/// Items that reference `(type_name, id)`, used by `delete_item`'s dangling
/// reference report and by `rebuild`'s anomaly scan.
pub fn referrers(conn: &Connection, type_name: &str, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT source_type, source_id FROM related_items
             WHERE target_type = ?1 AND target_id = ?2 ORDER BY source_type, source_id",
        )
        .map_err(|e| Fault::storage(format!("failed to prepare referrer lookup: {e}")))?;
    let rows = stmt
        .query_map(params![type_name, id], |row| {
            let source_type: String = row.get(0)?;
            let source_id: String = row.get(1)?;
            Ok(format!("{source_type}-{source_id}"))
        })
        .map_err(|e| Fault::storage(format!("failed to read referrers for {type_name}-{id}: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan referrer row: {e}")))?);
    }
    Ok(out)
}

/// Rewrites every `related_items` row that points *at* `old_type-old_id` to
/// instead point at `new_type-new_id`, used by `change_type` to repoint
/// inbound references after an item is reassigned to a new type and id.
///
/// The moved item's own outbound edges are not touched here: `change_type`
/// re-inserts them under the new `(type, id)` via `set_related` when it
/// persists the moved row, so rewriting the source side here would race
/// that insert and collide on the `related_items` primary key.
pub fn retarget(conn: &Connection, old_type: &str, old_id: &str, new_type: &str, new_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE related_items SET target_type = ?1, target_id = ?2 WHERE target_type = ?3 AND target_id = ?4",
        params![new_type, new_id, old_type, old_id],
    )
    .map_err(|e| Fault::storage(format!("failed to retarget references to {old_type}-{old_id}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;

    fn seed_item(conn: &Connection, type_name: &str, id: &str) {
        conn.execute(
            "INSERT INTO items (type, id, title, created_at, updated_at) VALUES (?1, ?2, 't', 'now', 'now')",
            params![type_name, id],
        )
        .unwrap();
    }

    #[test]
    fn set_and_read_preserves_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed_item(conn, "issues", "1");
                seed_item(conn, "docs", "2");
                seed_item(conn, "docs", "3");
                set_related(conn, "issues", "1", &["docs-2".to_string(), "docs-3".to_string()])?;
                let related = related_for_item(conn, "issues", "1")?;
                assert_eq!(related, vec!["docs-2", "docs-3"]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn referrers_finds_incoming_links() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed_item(conn, "issues", "1");
                seed_item(conn, "docs", "2");
                set_related(conn, "issues", "1", &["docs-2".to_string()])?;
                let referrers = referrers(conn, "docs", "2")?;
                assert_eq!(referrers, vec!["issues-1"]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn retarget_rewrites_inbound_references_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                seed_item(conn, "issues", "1");
                seed_item(conn, "docs", "2");
                seed_item(conn, "knowledge", "7");
                set_related(conn, "issues", "1", &["docs-2".to_string()])?;
                retarget(conn, "docs", "2", "knowledge", "7")?;
                assert_eq!(referrers(conn, "docs", "2")?, Vec::<String>::new());
                assert_eq!(referrers(conn, "knowledge", "7")?, vec!["issues-1"]);
                assert_eq!(related_for_item(conn, "issues", "1")?, vec!["knowledge-7"]);
                Ok(())
            })
            .unwrap();
    }
}
