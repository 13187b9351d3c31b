use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::TaskboardError;

use super::kv::{check_quota, KeyValueStore};

/// Key-value store backed by a single SQLite table.
pub struct SqliteKv {
    conn: Connection,
    quota: Option<usize>,
}

impl SqliteKv {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path, quota: Option<usize>) -> Result<Self, TaskboardError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskboardError::storage(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        configure_connection(&conn)?;
        run_migrations(&conn)?;
        Ok(Self { conn, quota })
    }

    pub fn open_in_memory(quota: Option<usize>) -> Result<Self, TaskboardError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn, quota })
    }

    pub fn used_bytes(&self) -> Result<usize, TaskboardError> {
        self.usage_excluding(None)
    }

    fn usage_excluding(&self, key: Option<&str>) -> Result<usize, TaskboardError> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM kv WHERE ?1 IS NULL OR key != ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as usize)
    }
}

fn configure_connection(conn: &Connection) -> Result<(), TaskboardError> {
    // journal_mode returns a row, so it cannot go through execute_batch.
    conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
    conn.execute_batch("PRAGMA busy_timeout=5000;")?;
    Ok(())
}

fn run_migrations(conn: &Connection) -> Result<(), TaskboardError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, TaskboardError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TaskboardError> {
        if self.quota.is_some() {
            let used = self.usage_excluding(Some(key))?;
            check_quota(key, value, used, self.quota)?;
        }
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TaskboardError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, TaskboardError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, TaskboardError> {
        // substr comparison avoids LIKE wildcard escaping in the prefix.
        let mut stmt = self.conn.prepare(
            "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key ASC",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
