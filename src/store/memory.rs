//! In-memory task store (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore};
use crate::task::{Task, UNRANKED};

#[derive(Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    async fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    async fn add(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            tracing::warn!("Ignoring add with duplicate task id {}", task.id);
            return Ok(());
        }
        tasks.insert(task.id, task);
        Ok(())
    }

    async fn update(&self, task: Task) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task;
                Ok(true)
            }
            None => {
                tracing::debug!("Ignoring update for unknown task id {}", task.id);
                Ok(false)
            }
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }

    async fn bulk_assign_rank(&self, ranks: &HashMap<Uuid, u32>) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        for (id, task) in tasks.iter_mut() {
            task.rank = Some(ranks.get(id).copied().unwrap_or(UNRANKED));
        }
        Ok(())
    }

    async fn mark_notified(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        for id in ids {
            if let Some(task) = tasks.get_mut(id) {
                if !task.status.is_done() && !task.notified {
                    task.notified = true;
                }
            }
        }
        Ok(())
    }
}
