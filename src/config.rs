use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TaskboardError;

pub const DEFAULT_DATA_DIR: &str = ".taskboard";
pub const DATA_DIR_ENV: &str = "TASKBOARD_DIR";
pub const DB_FILE: &str = "taskboard.db";
pub const CONFIG_FILE: &str = "config.json";

/// Settings read from `<data-dir>/config.json`. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key the whole task collection is stored under.
    pub canonical_key: String,
    /// Number of backup snapshots kept.
    pub backup_retention: usize,
    /// Quiet period before a deferred save runs.
    pub debounce_ms: u64,
    /// Capacity of the primary store in bytes. `null` disables the limit.
    pub quota_bytes: Option<usize>,
    /// Save synchronously after every mutation, in addition to the debounce.
    pub immediate_save: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canonical_key: "todo-app-tasks-v1".to_string(),
            backup_retention: 10,
            debounce_ms: 500,
            quota_bytes: Some(5 * 1024 * 1024),
            immediate_save: true,
        }
    }
}

impl Config {
    /// Load from `<data_dir>/config.json`, or defaults when the file is absent.
    pub fn load(data_dir: &Path) -> Result<Self, TaskboardError> {
        let path = config_path(data_dir);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        info!(path = %path.display(), "loading config");
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, TaskboardError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            TaskboardError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            TaskboardError::config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TaskboardError> {
        if self.canonical_key.trim().is_empty() {
            return Err(TaskboardError::config("canonical_key must not be empty"));
        }
        if self.backup_retention == 0 {
            return Err(TaskboardError::config(
                "backup_retention must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Resolve the data directory: explicit flag, then `TASKBOARD_DIR`, then
/// `./.taskboard`.
pub fn data_dir(flag: Option<&Path>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    match env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_DATA_DIR),
    }
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}
