//! Durable task storage with backup rotation and an in-process fallback tier.
//!
//! Load order: canonical key, then the fallback cache, then the default seed
//! tasks. Saves overwrite the canonical key, refresh the fallback cache and
//! write a timestamped backup; if the canonical write fails only the fallback
//! cache is updated. Neither `load` nor `save` ever returns an error.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::TaskboardError;
use crate::models::{default_tasks, now_millis, Task};

use super::codec;
use super::kv::KeyValueStore;

/// Secondary key holding a JSON object `{ <canonical key>: [tasks] }`.
pub const MEMORY_STORE_KEY: &str = "todo-app-memory-store";

/// Width of the millisecond stamp in backup keys, so that lexicographic order
/// is chronological order.
const STAMP_WIDTH: usize = 13;

/// An exported copy of the canonical payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub file_name: String,
    pub contents: String,
}

/// Where a save landed. Both outcomes count as saved: a fallback-only save is
/// still returned by `load` for the rest of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Primary,
    FallbackOnly,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Primary | Self::FallbackOnly)
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Primary)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    /// Size of the canonical payload in bytes.
    pub primary_size: usize,
    /// Collections held by the fallback cache.
    pub cache_entries: usize,
    pub backup_count: usize,
    pub has_data: bool,
}

pub struct DurableStore<S: KeyValueStore> {
    kv: S,
    canonical_key: String,
    backup_prefix: String,
    retention: usize,
    cache: HashMap<String, Vec<Task>>,
    /// Set when the last save only reached the fallback cache, so the
    /// canonical entry is older than the cache.
    primary_stale: bool,
    /// Set when the mirror key may not match the cache.
    mirror_dirty: bool,
    last_backup_ms: i64,
}

impl<S: KeyValueStore> DurableStore<S> {
    pub fn new(kv: S, config: &Config) -> Self {
        let canonical_key = config.canonical_key.clone();
        let mut store = Self {
            kv,
            backup_prefix: format!("{canonical_key}-backup-"),
            canonical_key,
            retention: config.backup_retention.max(1),
            cache: HashMap::new(),
            primary_stale: false,
            mirror_dirty: false,
            last_backup_ms: 0,
        };
        store.load_mirror();
        store.last_backup_ms = store.newest_backup_stamp();
        store
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn canonical_key(&self) -> &str {
        &self.canonical_key
    }

    /// Last collection held by the fallback tier, if any.
    pub fn cached(&self) -> Option<&[Task]> {
        self.cache.get(&self.canonical_key).map(Vec::as_slice)
    }

    pub fn load(&mut self) -> Vec<Task> {
        let now = now_millis();
        if self.primary_stale {
            if let Some(tasks) = self.cache.get(&self.canonical_key) {
                info!(count = tasks.len(), "primary store is behind, using fallback cache");
                return tasks.clone();
            }
        }
        match self.read_primary(now) {
            Ok(Some(tasks)) => {
                debug!(count = tasks.len(), "loaded tasks from primary store");
                self.remember(&tasks);
                return tasks;
            }
            Ok(None) => debug!(key = %self.canonical_key, "no stored tasks"),
            Err(e) => warn!(error = %e, "failed to load tasks from primary store"),
        }

        if let Some(tasks) = self.cache.get(&self.canonical_key) {
            info!(count = tasks.len(), "using fallback cache");
            return tasks.clone();
        }

        info!("no stored tasks anywhere, starting from defaults");
        default_tasks(now)
    }

    /// Persist the full collection and report which tier took it.
    pub fn save(&mut self, tasks: &[Task]) -> SaveOutcome {
        match self.write_primary(tasks) {
            Ok(()) => {
                self.primary_stale = false;
                info!(count = tasks.len(), "saved tasks");
                SaveOutcome::Primary
            }
            Err(e) => {
                warn!(error = %e, "primary write failed, saving to fallback cache only");
                self.remember(tasks);
                self.primary_stale = true;
                info!(count = tasks.len(), "saved tasks to fallback cache only");
                SaveOutcome::FallbackOnly
            }
        }
    }

    /// Copy the newest backup over the canonical key. Returns the backup key.
    /// In-memory state is not reloaded.
    pub fn restore_from_latest_backup(&mut self) -> Result<String, TaskboardError> {
        let keys = self.backup_keys()?;
        let Some(latest) = keys.last() else {
            return Err(TaskboardError::no_backup_found());
        };
        let payload = match self.kv.get(latest)? {
            Some(p) if !p.trim().is_empty() => p,
            _ => return Err(TaskboardError::corrupt_backup(latest)),
        };
        self.kv.set(&self.canonical_key, &payload)?;
        self.primary_stale = false;
        info!(backup = %latest, "restored tasks from backup");
        Ok(latest.clone())
    }

    /// Remove the canonical entry, the fallback copy and every backup.
    pub fn clear(&mut self) -> Result<(), TaskboardError> {
        self.kv.remove(&self.canonical_key)?;
        self.cache.remove(&self.canonical_key);
        self.primary_stale = false;
        self.persist_mirror()?;
        for key in self.backup_keys()? {
            self.kv.remove(&key)?;
        }
        info!("cleared all task data");
        Ok(())
    }

    /// Clear everything so the next load starts from the default tasks.
    pub fn reset_to_defaults(&mut self) -> Result<(), TaskboardError> {
        self.clear()
    }

    pub fn export_snapshot(&self) -> Result<Snapshot, TaskboardError> {
        let contents = match self.kv.get(&self.canonical_key)? {
            Some(data) if !data.is_empty() => data,
            _ => return Err(TaskboardError::no_data_to_export()),
        };
        Ok(Snapshot {
            file_name: format!("todo-app-data-{}.json", Utc::now().format("%Y-%m-%d")),
            contents,
        })
    }

    /// Replace the canonical payload with any JSON document. Records are not
    /// validated here; `load` tolerates malformed ones.
    pub fn import_snapshot(&mut self, contents: &str) -> Result<(), TaskboardError> {
        let value: Value =
            serde_json::from_str(contents).map_err(|_| TaskboardError::invalid_format())?;
        let payload = serde_json::to_string(&value)?;
        self.kv.set(&self.canonical_key, &payload)?;
        self.primary_stale = false;
        info!(bytes = payload.len(), "imported task data");
        Ok(())
    }

    /// Backup keys, oldest first.
    pub fn backup_keys(&self) -> Result<Vec<String>, TaskboardError> {
        self.kv.keys_with_prefix(&self.backup_prefix)
    }

    pub fn backup_count(&self) -> usize {
        self.backup_keys().map(|k| k.len()).unwrap_or(0)
    }

    /// Human-readable size of the canonical payload.
    pub fn data_size(&self) -> String {
        match self.kv.get(&self.canonical_key) {
            Ok(Some(data)) if !data.is_empty() => {
                format!("{:.2} KB", data.len() as f64 / 1024.0)
            }
            Ok(_) => "0 KB".to_string(),
            Err(_) => "Unknown".to_string(),
        }
    }

    pub fn storage_info(&self) -> StorageInfo {
        let primary_size = match self.kv.get(&self.canonical_key) {
            Ok(data) => data.map_or(0, |d| d.len()),
            Err(e) => {
                warn!(error = %e, "failed to read storage info");
                return StorageInfo::default();
            }
        };
        let cache_entries = self.cache.len();
        StorageInfo {
            primary_size,
            cache_entries,
            backup_count: self.backup_count(),
            has_data: primary_size > 0 || cache_entries > 0,
        }
    }

    fn read_primary(
        &self,
        now: chrono::DateTime<Utc>,
    ) -> Result<Option<Vec<Task>>, TaskboardError> {
        let Some(raw) = self.kv.get(&self.canonical_key)? else {
            return Ok(None);
        };
        codec::decode_tasks(&raw, now).map(Some)
    }

    fn write_primary(&mut self, tasks: &[Task]) -> Result<(), TaskboardError> {
        let payload = codec::encode_tasks(tasks)?;
        self.kv.set(&self.canonical_key, &payload)?;
        self.remember(tasks);

        let backup_key = self.next_backup_key();
        if let Err(e) = self.kv.set(&backup_key, &payload) {
            warn!(key = %backup_key, error = %e, "failed to write backup");
        }
        if let Err(e) = self.prune_backups() {
            warn!(error = %e, "failed to prune backups");
        }
        Ok(())
    }

    fn prune_backups(&mut self) -> Result<(), TaskboardError> {
        let keys = self.backup_keys()?;
        if keys.len() <= self.retention {
            return Ok(());
        }
        let excess = keys.len() - self.retention;
        for key in &keys[..excess] {
            self.kv.remove(key)?;
        }
        debug!(removed = excess, "pruned old backups");
        Ok(())
    }

    fn next_backup_key(&mut self) -> String {
        let stamp = Utc::now().timestamp_millis().max(self.last_backup_ms + 1);
        self.last_backup_ms = stamp;
        format!("{}{:0width$}", self.backup_prefix, stamp, width = STAMP_WIDTH)
    }

    fn newest_backup_stamp(&self) -> i64 {
        self.backup_keys()
            .ok()
            .and_then(|keys| keys.last().cloned())
            .and_then(|key| key[self.backup_prefix.len()..].parse().ok())
            .unwrap_or(0)
    }

    /// Update the fallback cache and mirror it into the store. The mirror is
    /// only rewritten when the cache changed or an earlier mirror write failed.
    /// A failed mirror write leaves the in-process copy in place.
    fn remember(&mut self, tasks: &[Task]) {
        let unchanged = self
            .cache
            .get(&self.canonical_key)
            .is_some_and(|cached| cached.as_slice() == tasks);
        if unchanged && !self.mirror_dirty {
            return;
        }
        if !unchanged {
            self.cache
                .insert(self.canonical_key.clone(), tasks.to_vec());
        }
        if let Err(e) = self.persist_mirror() {
            warn!(error = %e, "failed to mirror fallback cache");
        }
    }

    fn persist_mirror(&mut self) -> Result<(), TaskboardError> {
        let raw = serde_json::to_string(&self.cache)?;
        let result = self.kv.set(MEMORY_STORE_KEY, &raw);
        self.mirror_dirty = result.is_err();
        result
    }

    fn load_mirror(&mut self) {
        let raw = match self.kv.get(MEMORY_STORE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "failed to read fallback mirror");
                return;
            }
        };
        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(entries)) => entries,
            Ok(_) => {
                warn!("fallback mirror is not an object, ignoring");
                return;
            }
            Err(e) => {
                warn!(error = %e, "fallback mirror is unreadable, ignoring");
                return;
            }
        };
        let now = now_millis();
        for (key, value) in entries {
            match codec::decode_value(&value, now) {
                Ok(tasks) => {
                    self.cache.insert(key, tasks);
                }
                Err(e) => warn!(%key, error = %e, "skipping fallback mirror entry"),
            }
        }
    }
}
