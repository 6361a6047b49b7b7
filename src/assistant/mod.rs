//! Assistant gateway: the external text-understanding oracle.
//!
//! This module provides a trait-based abstraction over the assistant, with
//! Gemini as the primary implementation. The gateway is never assumed
//! reliable: every operation has a documented local fallback and callers
//! absorb failures at the boundary instead of surfacing them.

mod error;
mod gemini;

pub use error::{classify_http_status, AssistantError, AssistantErrorKind, RetryConfig};
pub use gemini::GeminiClient;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{Priority, Task, TaskStatus};

/// Static advice used when the assistant is unreachable.
pub const FALLBACK_ADVICE: &str = "Sort out your priorities for a productive day.";

/// Structured fields extracted from free-text task input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

fn default_category() -> String {
    "general".to_string()
}

impl ParsedTask {
    /// Local fallback when parsing fails: the raw input becomes the title and
    /// every other field takes its default.
    pub fn fallback(input: &str) -> Self {
        Self {
            title: input.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            category: default_category(),
            tags: Vec::new(),
            due_date: None,
        }
    }

    /// Build a full task record from the parsed fields.
    pub fn into_task(self) -> Task {
        let mut task = Task::new(self.title);
        task.description = if self.description.is_empty() {
            None
        } else {
            Some(self.description)
        };
        task.priority = self.priority;
        task.category = self.category;
        task.tags = self.tags;
        task.due_date = self.due_date;
        task
    }
}

/// Slice of a task sent with a smart-ordering request.
#[derive(Debug, Clone, Serialize)]
pub struct RankCandidate {
    pub id: Uuid,
    pub title: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Task> for RankCandidate {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            priority: task.priority,
            due_date: task.due_date,
            description: task.description.clone(),
        }
    }
}

/// Slice of a task sent with an advice request.
#[derive(Debug, Clone, Serialize)]
pub struct AdviceCandidate {
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
}

impl From<&Task> for AdviceCandidate {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            priority: task.priority,
            status: task.status,
        }
    }
}

/// Trait for assistant clients.
///
/// Implementations may fail or return partial results; the contracts below
/// state the fallback each caller applies.
#[async_trait]
pub trait AssistantGateway: Send + Sync {
    /// Extract structured task fields from free text.
    ///
    /// On failure callers fall back to [`ParsedTask::fallback`].
    async fn parse(&self, input: &str) -> Result<ParsedTask, AssistantError>;

    /// Suggest 3-5 actionable subtask titles (count not guaranteed).
    ///
    /// On failure callers fall back to an empty list.
    async fn decompose(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Vec<String>, AssistantError>;

    /// Recommend an execution order: a permutation or subset of the input
    /// ids, first to do first.
    ///
    /// On failure callers fall back to an empty list, which leaves every task
    /// unranked and degrades smart ordering to the priority/date comparator.
    async fn rank(&self, candidates: &[RankCandidate]) -> Result<Vec<Uuid>, AssistantError>;

    /// Short coaching string for the given tasks.
    ///
    /// On failure callers substitute [`FALLBACK_ADVICE`].
    async fn advise(&self, candidates: &[AdviceCandidate]) -> Result<String, AssistantError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gateway double that fails every call, for exercising fallbacks.
    pub struct FailingGateway;

    #[async_trait]
    impl AssistantGateway for FailingGateway {
        async fn parse(&self, _input: &str) -> Result<ParsedTask, AssistantError> {
            Err(AssistantError::network_error("connection refused".into()))
        }

        async fn decompose(
            &self,
            _title: &str,
            _description: Option<&str>,
        ) -> Result<Vec<String>, AssistantError> {
            Err(AssistantError::network_error("connection refused".into()))
        }

        async fn rank(&self, _candidates: &[RankCandidate]) -> Result<Vec<Uuid>, AssistantError> {
            Err(AssistantError::network_error("connection refused".into()))
        }

        async fn advise(
            &self,
            _candidates: &[AdviceCandidate],
        ) -> Result<String, AssistantError> {
            Err(AssistantError::network_error("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn parse_failure_falls_back_to_raw_input() {
        let gateway = FailingGateway;
        let parsed = gateway
            .parse("buy milk")
            .await
            .unwrap_or_else(|_| ParsedTask::fallback("buy milk"));

        assert_eq!(parsed.title, "buy milk");
        assert_eq!(parsed.priority, Priority::Medium);
        assert_eq!(parsed.category, "general");
        assert!(parsed.tags.is_empty());
        assert!(parsed.due_date.is_none());
        assert!(parsed.description.is_empty());
    }

    #[test]
    fn parsed_task_builds_full_record() {
        let parsed = ParsedTask {
            title: "file taxes".into(),
            description: "before the deadline".into(),
            priority: Priority::Critical,
            category: "finance".into(),
            tags: vec!["paperwork".into()],
            due_date: NaiveDate::from_ymd_opt(2024, 4, 15),
        };
        let task = parsed.into_task();
        assert_eq!(task.title, "file taxes");
        assert_eq!(task.description.as_deref(), Some("before the deadline"));
        assert_eq!(task.priority, Priority::Critical);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 4, 15));
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(!task.notified);
    }
}
