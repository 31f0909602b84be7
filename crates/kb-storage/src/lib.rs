//! The embedded SQLite index for the knowledge-base engine.
//!
//! [`SqliteStore`] owns the one `Mutex<Connection>` per data root; the
//! `sqlite::*` submodules are plain functions over `&Connection` so the
//! repository crate can compose several of them inside one
//! [`SqliteStore::run_in_transaction`] call without going through a trait
//! object -- this crate has exactly one consumer, so that indirection
//! would add nothing.

pub mod sqlite;

pub use sqlite::SqliteStore;
