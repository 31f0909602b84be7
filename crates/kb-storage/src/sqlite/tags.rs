//! The tag registry: interns tag names, links them to items, and
//! supports substring search over tag names.

use rusqlite::{params, Connection, OptionalExtension};

use kb_core::error::{Fault, Result};
use kb_core::registry::Tag;

/// Interns `name`, returning its id whether or not it already existed.
pub fn ensure(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])
        .map_err(|e| Fault::storage(format!("failed to intern tag {name}: {e}")))?;
    conn.query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
        .map_err(|e| Fault::storage(format!("failed to read tag id for {name}: {e}")))
}

/// Replaces the full tag set attached to an item.
pub fn set_item_tags(conn: &Connection, type_name: &str, id: &str, tags: &[String]) -> Result<()> {
    conn.execute(
        "DELETE FROM item_tags WHERE type = ?1 AND id = ?2",
        params![type_name, id],
    )
    .map_err(|e| Fault::storage(format!("failed to clear tags for {type_name}-{id}: {e}")))?;
    for tag in tags {
        let tag_id = ensure(conn, tag)?;
        conn.execute(
            "INSERT OR IGNORE INTO item_tags (type, id, tag_id) VALUES (?1, ?2, ?3)",
            params![type_name, id, tag_id],
        )
        .map_err(|e| Fault::storage(format!("failed to tag {type_name}-{id} with {tag}: {e}")))?;
    }
    Ok(())
}

pub fn tags_for_item(conn: &Connection, type_name: &str, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT tags.name FROM tags
             JOIN item_tags ON item_tags.tag_id = tags.id
             WHERE item_tags.type = ?1 AND item_tags.id = ?2
             ORDER BY tags.name",
        )
        .map_err(|e| Fault::storage(format!("failed to prepare tag lookup: {e}")))?;
    let rows = stmt
        .query_map(params![type_name, id], |row| row.get::<_, String>(0))
        .map_err(|e| Fault::storage(format!("failed to read tags for {type_name}-{id}: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan tag row: {e}")))?);
    }
    Ok(out)
}

/// Deletes a tag from the registry. `force` also removes every
/// `item_tags` row referencing it; without `force`, deletion fails if the
/// tag is still in use.
pub fn delete(conn: &Connection, name: &str, force: bool) -> Result<()> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
        .optional()
        .map_err(|e| Fault::storage(format!("failed to look up tag {name}: {e}")))?;
    let Some(id) = id else {
        return Err(Fault::not_found("tag", name));
    };

    if !force {
        let in_use: i64 = conn
            .query_row("SELECT COUNT(*) FROM item_tags WHERE tag_id = ?1", params![id], |row| row.get(0))
            .map_err(|e| Fault::storage(format!("failed to check tag usage: {e}")))?;
        if in_use > 0 {
            return Err(Fault::conflict(format!(
                "tag '{name}' is attached to {in_use} item(s); use force to delete anyway"
            )));
        }
    }

    conn.execute("DELETE FROM tags WHERE id = ?1", params![id])
        .map_err(|e| Fault::storage(format!("failed to delete tag {name}: {e}")))?;
    Ok(())
}

/// Tags whose name contains `pattern`, case-insensitive substring match
/// (SQLite's default `LIKE` is already case-insensitive for ASCII).
pub fn search(conn: &Connection, pattern: &str) -> Result<Vec<Tag>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM tags WHERE name LIKE ?1 ORDER BY name")
        .map_err(|e| Fault::storage(format!("failed to prepare tag search: {e}")))?;
    let rows = stmt
        .query_map(params![format!("%{pattern}%")], |row| {
            Ok(Tag { id: row.get(0)?, name: row.get(1)? })
        })
        .map_err(|e| Fault::storage(format!("failed to run tag search: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan tag row: {e}")))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;

    #[test]
    fn ensure_interns_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let a = ensure(conn, "bug")?;
                let b = ensure(conn, "bug")?;
                assert_eq!(a, b);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn delete_without_force_fails_when_in_use() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO items (type, id, title, created_at, updated_at) VALUES ('issues','1','t','now','now')",
                    [],
                )
                .unwrap();
                set_item_tags(conn, "issues", "1", &["bug".to_string()])?;
                let err = delete(conn, "bug", false).unwrap_err();
                assert!(matches!(err, Fault::Conflict { .. }));
                delete(conn, "bug", true)?;
                Ok(())
            })
            .unwrap();
    }
}
