//! DDL statements for the SQLite index.
//!
//! The index is a rebuildable projection of the Markdown+YAML store, so its
//! table layout is our own choice, not dictated by any on-disk format.
//! Timestamps are stored as TEXT in ISO-8601 (millisecond) form; `items_fts`
//! is an `fts5` virtual table kept in sync by the repository crate in the
//! same transaction as `items`, not by SQL triggers.

/// Bumped whenever DDL changes; tracked in `metadata` under `schema_version`
/// so a future migration can tell which statements still need to run.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS type_registry (
        name        TEXT PRIMARY KEY,
        base_kind   TEXT NOT NULL,
        description TEXT
    )",
    "CREATE TABLE IF NOT EXISTS statuses (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        name      TEXT NOT NULL UNIQUE,
        is_closed INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sequences (
        type          TEXT PRIMARY KEY,
        current_value INTEGER NOT NULL,
        base_kind     TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )",
    r#"
    CREATE TABLE IF NOT EXISTS items (
        type       TEXT NOT NULL,
        id         TEXT NOT NULL,
        title      TEXT NOT NULL,
        description TEXT,
        content    TEXT,
        priority   TEXT,
        status     TEXT,
        start_date TEXT,
        end_date   TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (type, id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_items_status ON items(status)",
    "CREATE INDEX IF NOT EXISTS idx_items_priority ON items(priority)",
    "CREATE INDEX IF NOT EXISTS idx_items_updated_at ON items(updated_at)",
    "CREATE TABLE IF NOT EXISTS item_tags (
        type   TEXT NOT NULL,
        id     TEXT NOT NULL,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (type, id, tag_id),
        FOREIGN KEY (type, id) REFERENCES items(type, id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id)",
    "CREATE TABLE IF NOT EXISTS related_items (
        source_type TEXT NOT NULL,
        source_id   TEXT NOT NULL,
        target_type TEXT NOT NULL,
        target_id   TEXT NOT NULL,
        position    INTEGER NOT NULL,
        PRIMARY KEY (source_type, source_id, position),
        FOREIGN KEY (source_type, source_id) REFERENCES items(type, id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_related_items_target ON related_items(target_type, target_id)",
    "CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(
        type_name,
        item_id UNINDEXED,
        title,
        description,
        content,
        tags_joined
    )",
    "CREATE TABLE IF NOT EXISTS current_state (
        id         INTEGER PRIMARY KEY CHECK (id = 1),
        content    TEXT NOT NULL,
        related    TEXT NOT NULL,
        tags       TEXT NOT NULL,
        updated_by TEXT,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
];

/// Default statuses and built-in/default types, inserted once on first
/// schema creation. `INSERT OR IGNORE` so a later rebuild never resurrects
/// a row an operator has since removed from the registry.
pub fn seed_statements() -> Vec<String> {
    let mut statements = Vec::new();

    for (name, is_closed) in kb_core::registry::DEFAULT_STATUSES {
        statements.push(format!(
            "INSERT OR IGNORE INTO statuses (name, is_closed) VALUES ('{name}', {})",
            *is_closed as i32
        ));
    }

    let all_types = kb_core::registry::BUILTIN_TYPES
        .iter()
        .chain(kb_core::registry::DEFAULT_TYPES.iter());
    for (name, base_kind) in all_types {
        statements.push(format!(
            "INSERT OR IGNORE INTO type_registry (name, base_kind, description) VALUES ('{name}', '{}', NULL)",
            base_kind.as_str()
        ));
        statements.push(format!(
            "INSERT OR IGNORE INTO sequences (type, current_value, base_kind) VALUES ('{name}', 0, '{}')",
            base_kind.as_str()
        ));
    }

    statements
}
