//! Local task board with resilient key-value persistence.
//!
//! [`store::DurableStore`] keeps the task collection in a capacity-limited
//! key-value store with rotating backups and an in-process fallback tier.
//! [`board::TaskBoard`] owns the session's collection and decides when to save.

pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod store;

pub use board::{SessionSignal, TaskBoard};
pub use config::Config;
pub use error::{ErrorCode, TaskboardError};
pub use models::{NewTask, Priority, Task, TaskPatch, TaskStatus};
pub use store::{DurableStore, KeyValueStore, MemoryKv, SaveOutcome, SqliteKv};
