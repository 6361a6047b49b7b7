//! Task module - defines tasks, subtasks, priorities, and statuses.
//!
//! Pure data: all scheduling and ordering logic lives in `crate::view` and
//! `crate::reminder`; everything here is plain serializable records.

mod subtask;
mod task;

pub use subtask::Subtask;
pub use task::{Priority, Task, TaskStatus, UNRANKED};
