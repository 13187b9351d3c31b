use std::collections::BTreeMap;

use crate::error::TaskboardError;

/// Synchronous string key-value store with a capacity limit.
///
/// Writes fail with `StorageUnavailable` when the store is full or disabled;
/// callers decide whether that is fatal.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, TaskboardError>;

    /// Overwrites any existing value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), TaskboardError>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), TaskboardError>;

    fn keys(&self) -> Result<Vec<String>, TaskboardError>;

    /// Keys starting with `prefix`, sorted ascending.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, TaskboardError> {
        let mut keys: Vec<String> = self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Bytes an entry occupies against the quota.
pub fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Fails when replacing `key` with `value` would push usage past `quota`.
/// `used_by_others` is the usage of every entry except `key`.
pub fn check_quota(
    key: &str,
    value: &str,
    used_by_others: usize,
    quota: Option<usize>,
) -> Result<(), TaskboardError> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let needed = used_by_others + entry_size(key, value);
    if needed > quota {
        return Err(TaskboardError::quota_exceeded(key, needed, quota));
    }
    Ok(())
}

/// In-process store. Failure switches simulate a disabled or broken backend.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| entry_size(k, v)).sum()
    }

    fn check_readable(&self) -> Result<(), TaskboardError> {
        if self.fail_reads {
            return Err(TaskboardError::storage("storage is disabled"));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), TaskboardError> {
        if self.fail_writes {
            return Err(TaskboardError::storage("storage is disabled"));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, TaskboardError> {
        self.check_readable()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TaskboardError> {
        self.check_writable()?;
        let existing = self.entries.get(key).map_or(0, |v| entry_size(key, v));
        check_quota(key, value, self.used_bytes() - existing, self.quota)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TaskboardError> {
        self.check_writable()?;
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, TaskboardError> {
        self.check_readable()?;
        Ok(self.entries.keys().cloned().collect())
    }
}
