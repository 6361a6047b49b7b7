//! Task storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `file`: single JSON snapshot rewritten wholesale after every mutation
//!
//! The store is the sole owner of task records. Invariant violations
//! (duplicate id on add, update/delete of a missing id) are logged no-ops,
//! never surfaced to the user-visible flow.

mod file;
mod memory;

pub use file::FileTaskStore;
pub use memory::InMemoryTaskStore;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::task::Task;

/// Errors from storage backends.
///
/// In-memory state stays authoritative when persistence fails; backends log
/// and absorb persist errors rather than returning them from mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Task store trait - implemented by all storage backends.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Read-only copy of every task, in no particular order.
    async fn snapshot(&self) -> Vec<Task>;

    /// Get a single task by id.
    async fn get(&self, id: Uuid) -> Option<Task>;

    /// Insert a new task. A duplicate id is dropped silently.
    async fn add(&self, task: Task) -> Result<(), StoreError>;

    /// Replace a task by id with the full merged record. No partial-field
    /// patching: callers supply the complete task. Returns `false` (a no-op)
    /// if the id is no longer present.
    async fn update(&self, task: Task) -> Result<bool, StoreError>;

    /// Delete a task. Returns `false` if the id was already gone.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Apply a smart-ordering result in one transaction: mapped tasks get
    /// their rank, every unmapped task gets [`crate::task::UNRANKED`], and
    /// map entries whose task was deleted in the interim are dropped.
    async fn bulk_assign_rank(&self, ranks: &HashMap<Uuid, u32>) -> Result<(), StoreError>;

    /// Set the notified flag on the given tasks in one batched write.
    ///
    /// Done tasks are skipped and the flag is never cleared.
    async fn mark_notified(&self, ids: &[Uuid]) -> Result<(), StoreError>;
}

/// Task store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStoreType {
    Memory,
    #[default]
    File,
}

impl TaskStoreType {
    /// Parse from environment variable value.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" => Self::Memory,
            "file" | "json" => Self::File,
            _ => Self::default(),
        }
    }
}

/// Create a task store based on type and configuration.
pub async fn create_task_store(
    store_type: TaskStoreType,
    base_dir: PathBuf,
) -> Result<Box<dyn TaskStore>, StoreError> {
    match store_type {
        TaskStoreType::Memory => Ok(Box::new(InMemoryTaskStore::new())),
        TaskStoreType::File => {
            let store = FileTaskStore::new(base_dir).await?;
            Ok(Box::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskStatus, UNRANKED};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("write tests");
        let id = task.id;

        store.add(task).await.unwrap();
        let fetched = store.get(id).await.expect("task should exist");
        assert_eq!(fetched.title, "write tests");
    }

    #[tokio::test]
    async fn duplicate_add_is_a_noop() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("original");
        let id = task.id;
        store.add(task.clone()).await.unwrap();

        let mut dup = task;
        dup.title = "impostor".to_string();
        store.add(dup).await.unwrap();

        assert_eq!(store.get(id).await.unwrap().title, "original");
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_task_is_a_noop() {
        let store = InMemoryTaskStore::new();
        let ghost = Task::new("never added");
        let replaced = store.update(ghost).await.unwrap();
        assert!(!replaced);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_the_full_record() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("draft");
        let id = task.id;
        store.add(task.clone()).await.unwrap();

        let mut edited = task;
        edited.status = TaskStatus::Done;
        edited.due_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert!(store.update(edited).await.unwrap());

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.status, TaskStatus::Done);
        assert_eq!(fetched.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("short lived");
        let id = task.id;
        store.add(task).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn bulk_assign_rank_maps_and_defaults() {
        let store = InMemoryTaskStore::new();
        let a = Task::new("a");
        let b = Task::new("b");
        let c = Task::new("c");
        let (ida, idb, idc) = (a.id, b.id, c.id);
        for t in [a, b, c] {
            store.add(t).await.unwrap();
        }

        // Assistant returned [b, a]; c unmapped. A deleted id in the map is
        // dropped without error.
        let mut ranks = HashMap::new();
        ranks.insert(idb, 0);
        ranks.insert(ida, 1);
        ranks.insert(Uuid::new_v4(), 2);
        store.bulk_assign_rank(&ranks).await.unwrap();

        assert_eq!(store.get(idb).await.unwrap().rank, Some(0));
        assert_eq!(store.get(ida).await.unwrap().rank, Some(1));
        assert_eq!(store.get(idc).await.unwrap().rank, Some(UNRANKED));
    }

    #[tokio::test]
    async fn mark_notified_skips_done_and_never_clears() {
        let store = InMemoryTaskStore::new();
        let pending = Task::new("pending");
        let mut done = Task::new("done");
        done.status = TaskStatus::Done;
        let (idp, idd) = (pending.id, done.id);
        store.add(pending).await.unwrap();
        store.add(done).await.unwrap();

        store.mark_notified(&[idp, idd]).await.unwrap();
        assert!(store.get(idp).await.unwrap().notified);
        assert!(!store.get(idd).await.unwrap().notified);

        // A second batch never resets the flag.
        store.mark_notified(&[idp]).await.unwrap();
        assert!(store.get(idp).await.unwrap().notified);
    }
}
