//! Checklist items owned by a task.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A checklist item belonging to exactly one task.
///
/// # Invariants
/// - `id` is unique within the parent task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    /// Create an uncompleted subtask with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subtasks_get_distinct_ids() {
        let a = Subtask::new("draft outline");
        let b = Subtask::new("draft outline");
        assert_ne!(a.id, b.id);
        assert!(!a.completed);
    }
}
