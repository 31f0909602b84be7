//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds everything a command handler needs to reach
//! the engine: resolved configuration, the opened index store, and the
//! data-root path, all built once in `main` before dispatch.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use kb_config::Config;
use kb_repo::Context as EngineContext;
use kb_storage::SqliteStore;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
pub struct RuntimeContext {
    /// Resolved configuration (data root, index path, pool/timeout options).
    pub config: Config,

    /// Shared handle to the engine's stores and clock.
    pub engine: EngineContext,

    /// Whether to produce JSON output.
    pub json: bool,
}

impl RuntimeContext {
    /// Resolves configuration for `global` against the current directory and
    /// opens the index store at the resolved `index_path`.
    pub fn build(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let explicit_path = global.config.as_ref().map(PathBuf::from);
        let config = Config::load(explicit_path.as_deref(), &cwd).context("failed to load configuration")?;

        std::fs::create_dir_all(&config.data_root)
            .with_context(|| format!("failed to create data root {}", config.data_root.display()))?;
        if let Some(parent) = config.index_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let store = SqliteStore::open(&config.index_path)
            .with_context(|| format!("failed to open index at {}", config.index_path.display()))?;
        let engine = EngineContext::new(config.data_root.clone(), store);

        Ok(Self { config, engine, json: global.json })
    }

    pub fn data_root(&self) -> &Path {
        &self.config.data_root
    }
}
