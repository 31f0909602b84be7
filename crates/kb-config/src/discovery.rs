//! Discovery of the `.kb/` marker directory.
//!
//! Walking up from the working directory looking for a `.kb/` directory is
//! the same marker-directory convention version-control tools use to find
//! their metadata root; it lets a command run from any subdirectory of a
//! knowledge base and still find its configuration.

use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".kb";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Walks up from `start` looking for a `.kb/` directory, returning the path
/// to its `config.yaml` (which may or may not exist) if one is found.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;
    let mut current = start.as_path();
    loop {
        let candidate = current.join(CONFIG_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate.join(CONFIG_FILE_NAME));
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }

    None
}

/// Ensures a `.kb/` directory exists under `path` (or is `path` itself if
/// already named `.kb`), creating it and any parents if necessary.
pub fn ensure_config_dir(path: &Path) -> std::io::Result<PathBuf> {
    let dir = if path.ends_with(CONFIG_DIR_NAME) { path.to_path_buf() } else { path.join(CONFIG_DIR_NAME) };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
