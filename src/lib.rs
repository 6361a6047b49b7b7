//! # SuperTask
//!
//! AI-assisted personal task manager: smart ordering, free-text task
//! capture, and due-date reminders.
//!
//! This library provides:
//! - A task store persisted as a single JSON snapshot
//! - A pure ordering engine for the task list view
//! - A reminder scheduler that fires at most one notification per task
//! - An assistant gateway (Gemini) for parsing, decomposition, ranking, and advice
//!
//! ## Control Flow
//!
//! ```text
//!            ┌────────────────┐
//!            │   Task Store   │  (source of truth, persist-on-mutation)
//!            └───┬────────┬───┘
//!       snapshot │        │ snapshot + batched notified-flag writes
//!                ▼        ▼
//!     ┌───────────────┐  ┌────────────────────┐
//!     │ Ordering      │  │ Reminder Scheduler │
//!     │ Engine (pure) │  │ (interval scan)    │
//!     └───────────────┘  └────────────────────┘
//! ```
//!
//! The assistant gateway is invoked from the mutation handlers (add task,
//! smart prioritize, decompose) and its results are merged back into the
//! store keyed by task id; a task deleted while a call is in flight makes
//! the merge a no-op.
//!
//! ## Modules
//! - `task`: task and subtask records
//! - `store`: storage backends
//! - `view`: ordering engine
//! - `reminder`: due-date reminder scheduler
//! - `assistant`: external assistant gateway
//! - `api`: HTTP surface

pub mod api;
pub mod assistant;
pub mod config;
pub mod reminder;
pub mod store;
pub mod task;
pub mod view;

pub use config::Config;
pub use task::{Priority, Subtask, Task, TaskStatus};
pub use view::{compute_view, SortMode, StatusFilter};
