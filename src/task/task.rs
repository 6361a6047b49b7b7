//! Core task record.
//!
//! # Invariants
//! - `id` is unique within the store for the task's lifetime
//! - `notified` transitions false -> true at most once and is never reset,
//!   even if the due date is later edited to the future or the task is
//!   reopened from done

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::subtask::Subtask;

/// Rank given to every task the assistant did not place when a smart
/// ordering is applied. Ranked tasks sort before it.
///
/// Known limitation: a ranked list with 9999 or more entries would collide
/// with this sentinel.
pub const UNRANKED: u32 = 9999;

/// Task priority. Sort order is critical(0) < high(1) < medium(2) < low(3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Numeric sort key; lower sorts first.
    pub fn sort_key(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

/// A user-visible unit of work.
///
/// Every optional field defaults on decode so that snapshots written by older
/// versions hydrate without failing the whole load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Calendar due date, no time component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Position assigned by the last smart-ordering request. Meaningful only
    /// while the view sort mode is smart; may be stale otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Whether the due-date reminder has already fired.
    #[serde(default)]
    pub notified: bool,
}

fn default_category() -> String {
    "general".to_string()
}

impl Task {
    /// Create a task with default fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            category: default_category(),
            tags: Vec::new(),
            created_at: Utc::now(),
            due_date: None,
            subtasks: Vec::new(),
            rank: None,
            notified: false,
        }
    }

    /// Effective rank for smart ordering; unranked tasks sort last.
    pub fn effective_rank(&self) -> u32 {
        self.rank.unwrap_or(UNRANKED)
    }

    /// Whether the task's due date is on or before `today`.
    ///
    /// Tasks without a due date are never due.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.due_date.map(|d| d <= today).unwrap_or(false)
    }

    /// Whether the reminder scheduler should fire for this task on `today`.
    pub fn needs_reminder(&self, today: NaiveDate) -> bool {
        !self.status.is_done() && !self.notified && self.is_due(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_sort_keys_match_fixed_order() {
        assert_eq!(Priority::Critical.sort_key(), 0);
        assert_eq!(Priority::High.sort_key(), 1);
        assert_eq!(Priority::Medium.sort_key(), 2);
        assert_eq!(Priority::Low.sort_key(), 3);
    }

    #[test]
    fn new_task_has_defaults() {
        let task = Task::new("buy milk");
        assert_eq!(task.title, "buy milk");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, "general");
        assert!(task.tags.is_empty());
        assert!(task.rank.is_none());
        assert!(!task.notified);
    }

    #[test]
    fn due_predicate_covers_past_today_and_future() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut task = Task::new("report");

        assert!(!task.is_due(today), "no due date is never due");

        task.due_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(task.is_due(today));

        task.due_date = NaiveDate::from_ymd_opt(2024, 1, 2);
        assert!(task.is_due(today));

        task.due_date = NaiveDate::from_ymd_opt(2099, 1, 1);
        assert!(!task.is_due(today));
    }

    #[test]
    fn needs_reminder_respects_status_and_flag() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut task = Task::new("report");
        task.due_date = NaiveDate::from_ymd_opt(2024, 1, 1);

        assert!(task.needs_reminder(today));

        task.notified = true;
        assert!(!task.needs_reminder(today));

        task.notified = false;
        task.status = TaskStatus::Done;
        assert!(!task.needs_reminder(today));
    }

    #[test]
    fn tolerant_decode_defaults_missing_fields() {
        // Minimal record, as an older snapshot might contain.
        let json = r#"{"id":"7f1f6b1e-6a1e-4a3c-9f66-2b8f4a0f1234","title":"old task"}"#;
        let task: Task = serde_json::from_str(json).expect("minimal record should decode");
        assert_eq!(task.title, "old task");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, "general");
        assert!(task.subtasks.is_empty());
        assert!(!task.notified);
    }
}
