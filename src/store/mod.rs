pub mod codec;
pub mod durable;
pub mod kv;
pub mod sqlite;

pub use durable::{DurableStore, SaveOutcome, Snapshot, StorageInfo, MEMORY_STORE_KEY};
pub use kv::{KeyValueStore, MemoryKv};
pub use sqlite::SqliteKv;
