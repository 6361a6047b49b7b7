//! Reminder scheduler: fires a reminder at most once per task when it
//! becomes due.
//!
//! Cooperative polling model: a full scan of the store runs immediately on
//! start and then on a fixed interval. Newly due tasks are batched into a
//! single store update. The scheduler only runs while notification delivery
//! is authorized; a transition to granted re-arms it with an immediate
//! evaluation.
//!
//! Per-task state machine, projected from `status` and `notified`:
//!
//! ```text
//! PENDING --(due on tick)--> NOTIFIED   (terminal, never re-notified)
//! PENDING --(status toggle)--> DONE     (terminal, no notification fires)
//! ```
//!
//! `notified` is never reset, even if the due date is later moved to the
//! future or the task is reopened from done past its due date.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::store::TaskStore;
use crate::task::Task;

/// Default evaluation interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Authorization state of the external notification subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

/// Error from notification dispatch.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

/// Boundary capability that delivers reminders.
///
/// Delivery is at-most-once: a dispatch failure is not retried and the
/// task's notified flag is set regardless.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, task: &Task) -> Result<(), NotifyError>;
}

/// Notifier that writes reminders to the log. Used when no desktop
/// notification channel is wired up.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, task: &Task) -> Result<(), NotifyError> {
        tracing::info!(
            "Reminder: '{}' is due{}",
            task.title,
            task.due_date
                .map(|d| format!(" since {}", d))
                .unwrap_or_default()
        );
        Ok(())
    }
}

/// Tasks that need a reminder on `today`. Pure projection of the due
/// predicate over a snapshot.
pub fn due_tasks(tasks: &[Task], today: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|t| t.needs_reminder(today)).collect()
}

/// Periodic evaluator over the task store.
pub struct ReminderScheduler {
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn Notifier>,
    permission: watch::Receiver<Permission>,
    interval: Duration,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn TaskStore>,
        notifier: Arc<dyn Notifier>,
        permission: watch::Receiver<Permission>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            permission,
            interval,
        }
    }

    /// Run the evaluation loop until the permission channel closes.
    ///
    /// While authorization is anything other than `Granted` the scheduler
    /// neither evaluates nor mutates; it parks on the permission channel.
    pub async fn run(mut self) {
        loop {
            if *self.permission.borrow() == Permission::Granted {
                self.evaluate_once(Utc::now().date_naive()).await;
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    changed = self.permission.changed() => {
                        if changed.is_err() {
                            tracing::debug!("Permission channel closed, stopping scheduler");
                            return;
                        }
                    }
                }
            } else if self.permission.changed().await.is_err() {
                tracing::debug!("Permission channel closed, stopping scheduler");
                return;
            }
        }
    }

    /// One full scan: notify every newly due task, then set their flags in a
    /// single batched store update. Returns how many reminders fired.
    pub async fn evaluate_once(&self, today: NaiveDate) -> usize {
        let snapshot = self.store.snapshot().await;
        let due = due_tasks(&snapshot, today);
        if due.is_empty() {
            return 0;
        }

        for task in &due {
            if let Err(e) = self.notifier.notify(task).await {
                // At-most-once delivery: no retry, the flag is set below.
                tracing::warn!("Notification dispatch failed for task {}: {}", task.id, e);
            }
        }

        let ids: Vec<Uuid> = due.iter().map(|t| t.id).collect();
        if let Err(e) = self.store.mark_notified(&ids).await {
            tracing::warn!("Failed to record notified flags: {}", e);
        }
        tracing::debug!("Reminder scan fired {} notification(s)", ids.len());
        due.len()
    }
}
