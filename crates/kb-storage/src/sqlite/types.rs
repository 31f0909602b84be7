//! The type registry: which item types exist and what base kind
//! each one has.

use rusqlite::{params, Connection, OptionalExtension};

use kb_core::enums::BaseKind;
use kb_core::error::{Fault, Result};
use kb_core::registry::{TypeInfo, BUILTIN_TYPES, RESERVED_TYPE_NAMES};

pub fn create(conn: &Connection, name: &str, base_kind: BaseKind, description: Option<&str>) -> Result<()> {
    if RESERVED_TYPE_NAMES.contains(&name) {
        return Err(Fault::validation(format!("'{name}' is a reserved type name")));
    }
    let exists: bool = conn
        .query_row("SELECT COUNT(*) FROM type_registry WHERE name = ?1", params![name], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| Fault::storage(format!("failed to check type existence: {e}")))?
        > 0;
    if exists {
        return Err(Fault::conflict(format!("type '{name}' already exists")));
    }

    conn.execute(
        "INSERT INTO type_registry (name, base_kind, description) VALUES (?1, ?2, ?3)",
        params![name, base_kind.as_str(), description],
    )
    .map_err(|e| Fault::storage(format!("failed to create type {name}: {e}")))?;
    conn.execute(
        "INSERT INTO sequences (type, current_value, base_kind) VALUES (?1, 0, ?2)",
        params![name, base_kind.as_str()],
    )
    .map_err(|e| Fault::storage(format!("failed to initialize sequence for {name}: {e}")))?;
    Ok(())
}

/// Removes a type from the registry. Built-in types (`sessions`,
/// `dailies`) can never be deleted.
pub fn delete(conn: &Connection, name: &str) -> Result<()> {
    if BUILTIN_TYPES.iter().any(|(n, _)| *n == name) {
        return Err(Fault::validation(format!("'{name}' is a built-in type and cannot be deleted")));
    }
    let in_use: i64 = conn
        .query_row("SELECT COUNT(*) FROM items WHERE type = ?1", params![name], |row| row.get(0))
        .map_err(|e| Fault::storage(format!("failed to check type usage: {e}")))?;
    if in_use > 0 {
        return Err(Fault::conflict(format!("type '{name}' still has {in_use} item(s)")));
    }
    let affected = conn
        .execute("DELETE FROM type_registry WHERE name = ?1", params![name])
        .map_err(|e| Fault::storage(format!("failed to delete type {name}: {e}")))?;
    if affected == 0 {
        return Err(Fault::not_found("type", name));
    }
    conn.execute("DELETE FROM sequences WHERE type = ?1", params![name])
        .map_err(|e| Fault::storage(format!("failed to delete sequence for {name}: {e}")))?;
    Ok(())
}

pub fn get(conn: &Connection, name: &str) -> Result<TypeInfo> {
    conn.query_row(
        "SELECT name, base_kind, description FROM type_registry WHERE name = ?1",
        params![name],
        scan_type,
    )
    .optional()
    .map_err(|e| Fault::storage(format!("failed to read type {name}: {e}")))?
    .ok_or_else(|| Fault::not_found("type", name))
}

pub fn list(conn: &Connection) -> Result<Vec<TypeInfo>> {
    let mut stmt = conn
        .prepare("SELECT name, base_kind, description FROM type_registry ORDER BY name")
        .map_err(|e| Fault::storage(format!("failed to prepare type listing: {e}")))?;
    let rows = stmt
        .query_map([], scan_type)
        .map_err(|e| Fault::storage(format!("failed to list types: {e}")))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| Fault::storage(format!("failed to scan type row: {e}")))?);
    }
    Ok(out)
}

fn scan_type(row: &rusqlite::Row<'_>) -> rusqlite::Result<TypeInfo> {
    let base_kind_str: String = row.get("base_kind")?;
    let base_kind = base_kind_str.parse().unwrap_or(BaseKind::Documents);
    Ok(TypeInfo {
        name: row.get("name")?,
        base_kind,
        description: row.get("description")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;

    #[test]
    fn create_and_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                create(conn, "specs", BaseKind::Documents, None)?;
                let info = get(conn, "specs")?;
                assert_eq!(info.base_kind, BaseKind::Documents);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn duplicate_create_is_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                create(conn, "specs", BaseKind::Documents, None)?;
                let err = create(conn, "specs", BaseKind::Documents, None).unwrap_err();
                assert!(matches!(err, Fault::Conflict { .. }));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn builtin_type_cannot_be_deleted() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let err = delete(conn, "sessions").unwrap_err();
                assert!(matches!(err, Fault::Validation { .. }));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn reserved_name_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let err = create(conn, "current_state", BaseKind::Documents, None).unwrap_err();
                assert!(matches!(err, Fault::Validation { .. }));
                Ok(())
            })
            .unwrap();
    }
}
