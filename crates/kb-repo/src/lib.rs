//! Joins the front-matter store and the SQLite index into the operations
//! the knowledge-base engine exposes.
//!
//! Every service here shares one [`Context`]: the data root, the index
//! store, and the injected clock. Keeping them on a small `Clone` struct
//! avoids threading three parameters through every function.

pub mod current_state;
pub mod rebuild;
pub mod repo;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;

use kb_core::clock::{Clock, SystemClock};
use kb_storage::SqliteStore;

#[derive(Clone)]
pub struct Context {
    pub data_root: PathBuf,
    pub store: Arc<SqliteStore>,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(data_root: impl Into<PathBuf>, store: SqliteStore) -> Self {
        Self {
            data_root: data_root.into(),
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

pub use current_state::CurrentStateStore;
pub use rebuild::RebuildCoordinator;
pub use repo::ItemRepository;
pub use search::SearchService;
