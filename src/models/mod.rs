pub mod seed;
pub mod task;

pub use seed::default_tasks;
pub use task::*;
