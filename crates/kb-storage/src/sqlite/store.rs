//! [`SqliteStore`] -- the embedded index's connection owner.
//!
//! A single `Mutex<Connection>` backs the whole store: one coarse write
//! lock per data root rather than a connection pool, since
//! writes already go file-first and only then touch the index.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use kb_core::error::{Fault, Result};

use crate::sqlite::schema;

pub struct SqliteStore {
    pub(crate) conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the index database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(?path, "opening index database");
        let conn = Connection::open(path)
            .map_err(|e| Fault::storage(format!("failed to open {}: {e}", path.display())))?;
        let store = Self { conn: Mutex::new(conn) };
        store.configure_connection()?;
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory database. Used by tests and by `rebuild`'s
    /// rebuild-into-a-fresh-database step.
    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory index database");
        let conn = Connection::open_in_memory()
            .map_err(|e| Fault::storage(format!("failed to open in-memory db: {e}")))?;
        let store = Self { conn: Mutex::new(conn) };
        store.configure_connection()?;
        store.init_schema()?;
        Ok(store)
    }

    fn configure_connection(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| Fault::storage(format!("failed to set pragmas: {e}")))?;
        Ok(())
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let version: std::result::Result<i64, _> = conn.query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| {
                let v: String = row.get(0)?;
                Ok(v.parse::<i64>().unwrap_or(0))
            },
        );
        if matches!(&version, Ok(v) if *v >= schema::CURRENT_SCHEMA_VERSION) {
            debug!("schema already at current version, skipping init");
            return Ok(());
        }

        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt)
                .map_err(|e| Fault::storage(format!("schema init failed: {e}\nstatement: {}", truncate(stmt, 160))))?;
        }
        for stmt in schema::seed_statements() {
            conn.execute_batch(&stmt)
                .map_err(|e| Fault::storage(format!("seed insert failed: {e}")))?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            rusqlite::params![schema::CURRENT_SCHEMA_VERSION.to_string()],
        )
        .map_err(|e| Fault::storage(format!("failed to record schema version: {e}")))?;

        info!(version = schema::CURRENT_SCHEMA_VERSION, "index schema initialized");
        Ok(())
    }

    pub(crate) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Fault::internal(format!("index lock poisoned: {e}")))
    }

    /// Runs `f` inside a single SQLite transaction, committing on `Ok` and
    /// rolling back (via drop) on `Err`. This is the only write path every
    /// index mutation goes through.
    pub fn run_in_transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Fault::storage(format!("failed to begin transaction: {e}")))?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| Fault::storage(format!("failed to commit transaction: {e}")))?;
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs `f` with read-only access to the connection, outside of any
    /// explicit transaction (SQLite still gives a consistent snapshot).
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock_conn()?;
        f(&conn)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}...", &s[..max])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_seeds_builtin_types() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM type_registry", [], |row| row.get(0))
            .unwrap();
        assert!(count >= kb_core::registry::BUILTIN_TYPES.len() as i64);
    }

    #[test]
    fn schema_version_recorded() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let version: String = conn
            .query_row("SELECT value FROM metadata WHERE key = 'schema_version'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, schema::CURRENT_SCHEMA_VERSION.to_string());
    }

    #[test]
    fn reopening_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result: Result<()> = store.run_in_transaction(|conn| {
            conn.execute("INSERT INTO tags (name) VALUES ('temp')", []).unwrap();
            Err(Fault::internal("forced rollback"))
        });
        assert!(result.is_err());
        let count: i64 = store
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM tags", [], |r| r.get(0)).unwrap()))
            .unwrap();
        assert_eq!(count, 0);
    }
}
