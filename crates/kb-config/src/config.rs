//! Configuration loading and the option-resolution chain.
//!
//! Options are resolved in priority order: an explicit path argument, then
//! the `KB_CONFIG` environment variable, then directory discovery walking
//! up from the working directory for a `.kb/config.yaml`, falling back to
//! built-in defaults when no file is found. Any recognized option can
//! additionally be overridden by a `KB_<OPTION>` environment variable,
//! applied after the file is loaded and before defaults fill in anything
//! still unset.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use kb_core::error::{Fault, Result};

use crate::discovery::find_config_file;

const CONFIG_ENV: &str = "KB_CONFIG";
const INDEX_FILE_NAME: &str = "search.db";

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connection_pool_min() -> u32 {
    1
}

fn default_connection_pool_max() -> u32 {
    4
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_request_deadline_ms() -> u64 {
    30000
}

/// Configuration as read from YAML: every field is optional so a file can
/// set only the options it cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawConfig {
    data_root: Option<PathBuf>,
    index_path: Option<PathBuf>,
    log_level: Option<String>,
    connection_pool_min: Option<u32>,
    connection_pool_max: Option<u32>,
    busy_timeout_ms: Option<u64>,
    request_deadline_ms: Option<u64>,
}

/// Fully resolved configuration: every recognized option has a concrete
/// value, whether it came from a file, an environment override, or a
/// built-in default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_root: PathBuf,
    pub index_path: PathBuf,
    pub log_level: String,
    pub connection_pool_min: u32,
    pub connection_pool_max: u32,
    pub busy_timeout_ms: u64,
    pub request_deadline_ms: u64,
}

impl Config {
    /// Resolves configuration for a process running with working directory
    /// `cwd`. `explicit_path`, when given, takes priority over every other
    /// source (normally the binary's `--config` flag).
    pub fn load(explicit_path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let (raw, discovered_root) = load_raw(explicit_path, cwd)?;
        Ok(resolve(raw, discovered_root, cwd))
    }
}

fn load_raw(explicit_path: Option<&Path>, cwd: &Path) -> Result<(RawConfig, Option<PathBuf>)> {
    if let Some(path) = explicit_path {
        return Ok((read_raw(path)?, path.parent().map(Path::to_path_buf)));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        let parent = path.parent().map(Path::to_path_buf);
        return Ok((read_raw(&path)?, parent));
    }
    if let Some(path) = find_config_file(cwd) {
        if path.exists() {
            let data_root = path.parent().and_then(Path::parent).map(Path::to_path_buf);
            return Ok((read_raw(&path)?, data_root));
        }
        let data_root = path.parent().and_then(Path::parent).map(Path::to_path_buf);
        return Ok((RawConfig::default(), data_root));
    }
    Ok((RawConfig::default(), None))
}

fn read_raw(path: &Path) -> Result<RawConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Fault::storage(format!("failed to read config file {}: {e}", path.display())))?;
    if content.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| Fault::validation(format!("invalid config file {}: {e}", path.display())))
}

fn resolve(mut raw: RawConfig, discovered_root: Option<PathBuf>, cwd: &Path) -> Config {
    apply_env_overrides(&mut raw);

    let data_root = raw.data_root.unwrap_or_else(|| discovered_root.unwrap_or_else(|| cwd.to_path_buf()));
    let index_path = raw.index_path.unwrap_or_else(|| data_root.join(INDEX_FILE_NAME));

    Config {
        data_root,
        index_path,
        log_level: raw.log_level.unwrap_or_else(default_log_level),
        connection_pool_min: raw.connection_pool_min.unwrap_or_else(default_connection_pool_min),
        connection_pool_max: raw.connection_pool_max.unwrap_or_else(default_connection_pool_max),
        busy_timeout_ms: raw.busy_timeout_ms.unwrap_or_else(default_busy_timeout_ms),
        request_deadline_ms: raw.request_deadline_ms.unwrap_or_else(default_request_deadline_ms),
    }
}

fn apply_env_overrides(raw: &mut RawConfig) {
    if let Ok(v) = env::var("KB_DATA_ROOT") {
        raw.data_root = Some(PathBuf::from(v));
    }
    if let Ok(v) = env::var("KB_INDEX_PATH") {
        raw.index_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = env::var("KB_LOG_LEVEL") {
        raw.log_level = Some(v);
    }
    if let Some(n) = env::var("KB_CONNECTION_POOL_MIN").ok().and_then(|v| v.parse().ok()) {
        raw.connection_pool_min = Some(n);
    }
    if let Some(n) = env::var("KB_CONNECTION_POOL_MAX").ok().and_then(|v| v.parse().ok()) {
        raw.connection_pool_max = Some(n);
    }
    if let Some(n) = env::var("KB_BUSY_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()) {
        raw.busy_timeout_ms = Some(n);
    }
    if let Some(n) = env::var("KB_REQUEST_DEADLINE_MS").ok().and_then(|v| v.parse().ok()) {
        raw.request_deadline_ms = Some(n);
    }
}
