//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::reminder::Permission;
use crate::task::Task;
use crate::view::{SortMode, StatusFilter};

/// Request to create a task from free text.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    /// Free-text description of the task ("buy milk tomorrow, urgent")
    pub input: String,
}

/// Query parameters for the task list view.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub filter: StatusFilter,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: SortMode,
}

/// Statistics response.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Total number of tasks in the store
    pub total: usize,

    /// Number of tasks not yet done
    pub active: usize,

    /// Number of done tasks
    pub completed: usize,

    /// Completion percentage, rounded (0-100)
    pub progress: u32,
}

/// Response for a smart-prioritize request.
#[derive(Debug, Clone, Serialize)]
pub struct PrioritizeResponse {
    /// Whether the assistant returned a usable ordering
    pub ranked: bool,

    /// The resulting smart-ordered active view
    pub tasks: Vec<Task>,
}

/// Response for a decompose request.
#[derive(Debug, Clone, Serialize)]
pub struct DecomposeResponse {
    /// Subtask titles suggested by the assistant (may be empty on failure)
    pub suggestions: Vec<String>,

    /// The updated task, or `None` if it was deleted while the assistant
    /// call was in flight (the merge is then a no-op)
    pub task: Option<Task>,
}

/// Advice response.
#[derive(Debug, Clone, Serialize)]
pub struct AdviceResponse {
    pub advice: String,
}

/// Notification permission state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionState {
    pub permission: Permission,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether the task store survives restarts
    pub persistent: bool,
}
