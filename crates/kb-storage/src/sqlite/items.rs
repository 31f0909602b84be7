//! The `items` table and its `items_fts` shadow index.
//!
//! This module only knows about rows: the repository crate is the one that
//! assembles an [`ItemRow`] plus its tags and related references into a
//! full `kb_core::item::Item`. Keeping the split here means a row function
//! never has to reach into the tag/related tables to do its job.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use kb_core::error::{Fault, Result};
use kb_core::frontmatter::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub type_name: String,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str =
    "type, id, title, description, content, priority, status, start_date, end_date, created_at, updated_at";

fn scan_row(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(ItemRow {
        type_name: row.get("type")?,
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        content: row.get("content")?,
        priority: row.get("priority")?,
        status: row.get("status")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
        updated_at: parse_timestamp(&updated_at).unwrap_or_else(Utc::now),
    })
}

pub fn insert_item(conn: &Connection, row: &ItemRow) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO items ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            row.type_name,
            row.id,
            row.title,
            row.description,
            row.content,
            row.priority,
            row.status,
            row.start_date,
            row.end_date,
            format_timestamp(row.created_at),
            format_timestamp(row.updated_at),
        ],
    )
    .map_err(|e| Fault::storage(format!("failed to insert item {}-{}: {e}", row.type_name, row.id)))?;
    Ok(())
}

/// Replaces every column of an existing row (the repository always loads
/// the current item before patching it, so a full replace is simpler than
/// a dynamic `SET` clause and just as correct).
pub fn replace_item(conn: &Connection, row: &ItemRow) -> Result<()> {
    let affected = conn
        .execute(
            "UPDATE items SET title = ?1, description = ?2, content = ?3, priority = ?4,
             status = ?5, start_date = ?6, end_date = ?7, updated_at = ?8
             WHERE type = ?9 AND id = ?10",
            params![
                row.title,
                row.description,
                row.content,
                row.priority,
                row.status,
                row.start_date,
                row.end_date,
                format_timestamp(row.updated_at),
                row.type_name,
                row.id,
            ],
        )
        .map_err(|e| Fault::storage(format!("failed to update item {}-{}: {e}", row.type_name, row.id)))?;
    if affected == 0 {
        return Err(Fault::not_found("item", format!("{}-{}", row.type_name, row.id)));
    }
    Ok(())
}

pub fn delete_item(conn: &Connection, type_name: &str, id: &str) -> Result<()> {
    let affected = conn
        .execute("DELETE FROM items WHERE type = ?1 AND id = ?2", params![type_name, id])
        .map_err(|e| Fault::storage(format!("failed to delete item {type_name}-{id}: {e}")))?;
    if affected == 0 {
        return Err(Fault::not_found("item", format!("{type_name}-{id}")));
    }
    Ok(())
}

pub fn get_item_row(conn: &Connection, type_name: &str, id: &str) -> Result<ItemRow> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM items WHERE type = ?1 AND id = ?2"),
        params![type_name, id],
        scan_row,
    )
    .optional()
    .map_err(|e| Fault::storage(format!("failed to read item {type_name}-{id}: {e}")))?
    .ok_or_else(|| Fault::not_found("item", format!("{type_name}-{id}")))
}

pub struct ListFilter<'a> {
    pub type_name: Option<&'a str>,
    pub status: Option<&'a str>,
    pub limit: Option<i64>,
}

pub fn list_item_rows(conn: &Connection, filter: &ListFilter<'_>) -> Result<Vec<ItemRow>> {
    let mut where_clauses = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(type_name) = filter.type_name {
        where_clauses.push("type = ?".to_string());
        values.push(Box::new(type_name.to_string()));
    }
    if let Some(status) = filter.status {
        where_clauses.push("status = ?".to_string());
        values.push(Box::new(status.to_string()));
    }

    let where_sql = if where_clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clauses.join(" AND "))
    };
    let limit_sql = filter.limit.map(|l| format!(" LIMIT {l}")).unwrap_or_default();
    let sql = format!("SELECT {COLUMNS} FROM items {where_sql} ORDER BY type, id{limit_sql}");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Fault::storage(format!("failed to prepare list query: {e}")))?;
    let rows = stmt
        .query_map(param_refs.as_slice(), scan_row)
        .map_err(|e| Fault::storage(format!("failed to run list query: {e}")))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan item row: {e}")))?);
    }
    Ok(out)
}

/// Rewrites this item's `items_fts` row. `fts5` has no in-place update, so
/// this deletes the old row (if any) before inserting the new one.
pub fn upsert_fts(
    conn: &Connection,
    type_name: &str,
    id: &str,
    title: &str,
    description: Option<&str>,
    content: Option<&str>,
    tags_joined: &str,
) -> Result<()> {
    delete_fts(conn, type_name, id)?;
    conn.execute(
        "INSERT INTO items_fts (type_name, item_id, title, description, content, tags_joined)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![type_name, id, title, description, content, tags_joined],
    )
    .map_err(|e| Fault::storage(format!("failed to index item {type_name}-{id}: {e}")))?;
    Ok(())
}

pub fn delete_fts(conn: &Connection, type_name: &str, id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM items_fts WHERE type_name = ?1 AND item_id = ?2",
        params![type_name, id],
    )
    .map_err(|e| Fault::storage(format!("failed to remove index entry for {type_name}-{id}: {e}")))?;
    Ok(())
}

pub fn clear_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM items; DELETE FROM items_fts; DELETE FROM item_tags; DELETE FROM related_items;",
    )
    .map_err(|e| Fault::storage(format!("failed to clear index before rebuild: {e}")))?;
    Ok(())
}
