//! `kb init` -- create a data root and its index in the current directory.

use std::path::PathBuf;

use anyhow::{Context, Result};

use kb_config::discovery::ensure_config_dir;
use kb_storage::SqliteStore;

use crate::cli::{GlobalArgs, InitArgs};
use crate::output::output_json;

pub fn run(global: &GlobalArgs, args: &InitArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let data_root = match &args.path {
        Some(path) => PathBuf::from(path),
        None => cwd.clone(),
    };

    std::fs::create_dir_all(&data_root).with_context(|| format!("failed to create {}", data_root.display()))?;

    let config_dir = ensure_config_dir(&data_root).context("failed to create .kb directory")?;
    let config_path = config_dir.join("config.yaml");
    if !config_path.exists() {
        std::fs::write(&config_path, format!("data_root: {}\n", data_root.display()))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
    }

    let index_path = data_root.join("search.db");
    SqliteStore::open(&index_path).with_context(|| format!("failed to create index at {}", index_path.display()))?;

    if global.json {
        output_json(&serde_json::json!({
            "data_root": data_root,
            "index_path": index_path,
        }));
    } else {
        println!("initialized knowledge base at {}", data_root.display());
    }
    Ok(())
}
