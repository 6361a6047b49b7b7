//! JSON file-based task store.
//!
//! The whole collection lives under one namespaced file
//! (`supertask-tasks.json`), hydrated wholesale at startup and rewritten
//! wholesale after every mutation. Writes go through a temp file plus rename
//! so a crash mid-write never leaves a truncated snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{StoreError, TaskStore};
use crate::task::{Task, UNRANKED};

const SNAPSHOT_FILE: &str = "supertask-tasks.json";

#[derive(Debug, Serialize, Deserialize, Default)]
struct TaskSnapshot {
    tasks: HashMap<Uuid, Task>,
}

#[derive(Clone)]
pub struct FileTaskStore {
    path: PathBuf,
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
    persist_lock: Arc<Mutex<()>>,
}

impl FileTaskStore {
    /// Open (or create) the store under `base_dir`, hydrating any existing
    /// snapshot. An unparseable snapshot is logged and replaced with an empty
    /// store rather than failing startup.
    pub async fn new(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| StoreError::Read {
                path: base_dir.display().to_string(),
                source: e,
            })?;
        let path = base_dir.join(SNAPSHOT_FILE);
        let snapshot = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<TaskSnapshot>(&bytes) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!("Failed to parse task snapshot {}: {}", path.display(), e);
                    TaskSnapshot::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => TaskSnapshot::default(),
            Err(err) => {
                tracing::warn!("Failed to read task snapshot {}: {}", path.display(), err);
                TaskSnapshot::default()
            }
        };

        Ok(Self {
            path,
            tasks: Arc::new(RwLock::new(snapshot.tasks)),
            persist_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Persist the full snapshot. Called synchronously from every mutation;
    /// a failed write keeps in-memory state authoritative and the next
    /// mutation retries, so errors here are warned and absorbed.
    async fn persist(&self) {
        if let Err(e) = self.try_persist().await {
            tracing::warn!(
                "Failed to persist task snapshot {}: {} (in-memory state kept)",
                self.path.display(),
                e
            );
        }
    }

    async fn try_persist(&self) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = TaskSnapshot {
            tasks: self.tasks.read().await.clone(),
        };
        let data = serde_json::to_vec_pretty(&snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data)
            .await
            .map_err(|e| StoreError::Write {
                path: tmp_path.display().to_string(),
                source: e,
            })?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StoreError::Write {
                path: self.path.display().to_string(),
                source: e,
            })?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for FileTaskStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    async fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&id).cloned()
    }

    async fn add(&self, task: Task) -> Result<(), StoreError> {
        {
            let mut tasks = self.tasks.write().await;
            if tasks.contains_key(&task.id) {
                tracing::warn!("Ignoring add with duplicate task id {}", task.id);
                return Ok(());
            }
            tasks.insert(task.id, task);
        }
        self.persist().await;
        Ok(())
    }

    async fn update(&self, task: Task) -> Result<bool, StoreError> {
        let replaced = {
            let mut tasks = self.tasks.write().await;
            match tasks.get_mut(&task.id) {
                Some(slot) => {
                    *slot = task;
                    true
                }
                None => {
                    tracing::debug!("Ignoring update for unknown task id {}", task.id);
                    false
                }
            }
        };
        if replaced {
            self.persist().await;
        }
        Ok(replaced)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.tasks.write().await.remove(&id).is_some();
        if removed {
            self.persist().await;
        }
        Ok(removed)
    }

    async fn bulk_assign_rank(&self, ranks: &HashMap<Uuid, u32>) -> Result<(), StoreError> {
        {
            let mut tasks = self.tasks.write().await;
            for (id, task) in tasks.iter_mut() {
                task.rank = Some(ranks.get(id).copied().unwrap_or(UNRANKED));
            }
        }
        self.persist().await;
        Ok(())
    }

    async fn mark_notified(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let mut changed = false;
        {
            let mut tasks = self.tasks.write().await;
            for id in ids {
                if let Some(task) = tasks.get_mut(id) {
                    if !task.status.is_done() && !task.notified {
                        task.notified = true;
                        changed = true;
                    }
                }
            }
        }
        if changed {
            self.persist().await;
        }
        Ok(())
    }
}
