pub mod filter;
pub mod scheduler;
pub mod task_board;

pub use filter::{dashboard, Dashboard, DueFilter, TaskFilter};
pub use scheduler::SaveScheduler;
pub use task_board::{SessionSignal, TaskBoard};
