//! The `current_state` singleton row.
//!
//! `related`/`tags` are stored as JSON arrays (the crate's usual wire
//! representation for string lists, per the ambient `serde_json` use)
//! rather than a second junction table, since there is exactly one row.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use kb_core::error::{Fault, Result};
use kb_core::frontmatter::{format_timestamp, parse_timestamp};
use kb_core::item::CurrentState;

pub fn get(conn: &Connection) -> Result<Option<CurrentState>> {
    conn.query_row(
        "SELECT content, related, tags, updated_by, updated_at FROM current_state WHERE id = 1",
        [],
        scan_row,
    )
    .optional()
    .map_err(|e| Fault::storage(format!("failed to read current_state: {e}")))
}

pub fn set(conn: &Connection, state: &CurrentState) -> Result<()> {
    let related = serde_json::to_string(&state.related)
        .map_err(|e| Fault::internal(format!("failed to encode current_state.related: {e}")))?;
    let tags = serde_json::to_string(&state.tags)
        .map_err(|e| Fault::internal(format!("failed to encode current_state.tags: {e}")))?;
    conn.execute(
        "INSERT INTO current_state (id, content, related, tags, updated_by, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            content = excluded.content,
            related = excluded.related,
            tags = excluded.tags,
            updated_by = excluded.updated_by,
            updated_at = excluded.updated_at",
        params![state.content, related, tags, state.updated_by, format_timestamp(state.updated_at)],
    )
    .map_err(|e| Fault::storage(format!("failed to write current_state: {e}")))?;
    Ok(())
}

fn scan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CurrentState> {
    let related_json: String = row.get("related")?;
    let tags_json: String = row.get("tags")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(CurrentState {
        content: row.get("content")?,
        related: serde_json::from_str(&related_json).unwrap_or_default(),
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        updated_by: row.get("updated_by")?,
        updated_at: parse_timestamp(&updated_at).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;

    #[test]
    fn absent_until_first_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        let got = store.with_conn(get).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let state = CurrentState {
            content: "working on auth".into(),
            related: vec!["issues-1".into()],
            tags: vec!["focus".into()],
            updated_by: Some("agent".into()),
            updated_at: Utc::now(),
        };
        store
            .with_conn(|conn| {
                set(conn, &state)?;
                let got = get(conn)?.unwrap();
                assert_eq!(got.content, "working on auth");
                assert_eq!(got.related, vec!["issues-1".to_string()]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn set_overwrites_without_history() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                set(
                    conn,
                    &CurrentState {
                        content: "first".into(),
                        related: vec![],
                        tags: vec![],
                        updated_by: None,
                        updated_at: Utc::now(),
                    },
                )?;
                set(
                    conn,
                    &CurrentState {
                        content: "second".into(),
                        related: vec![],
                        tags: vec![],
                        updated_by: None,
                        updated_at: Utc::now(),
                    },
                )?;
                assert_eq!(get(conn)?.unwrap().content, "second");
                Ok(())
            })
            .unwrap();
    }
}
