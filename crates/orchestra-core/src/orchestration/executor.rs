use std::sync::Arc;

use chrono::Utc;

use crate::agents::AgentRegistry;
use crate::models::{TaskId, TaskStatus, TaskUpdate};
use crate::persistence::{PersistenceResult, RecordStore, run_blocking};

/// Drives one task through its lifecycle: pending, in_progress, then exactly
/// one of completed or failed. Never panics the worker; every failure path
/// lands in the record or the log.
pub struct TaskExecutor {
    registry: AgentRegistry,
    store: Arc<dyn RecordStore>,
}

impl TaskExecutor {
    pub fn new(registry: AgentRegistry, store: Arc<dyn RecordStore>) -> Self {
        Self { registry, store }
    }

    pub async fn execute(&self, id: TaskId) {
        let store = Arc::clone(&self.store);
        let record = match run_blocking("read_task", move || store.read_task(id)).await {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(task_id = %id, %error, "cannot load task for execution");
                self.fail_without_execution(id, format!("task could not be loaded: {error}"))
                    .await;
                return;
            }
        };

        // Terminal records are immutable; a task already picked up by
        // another worker is not re-run.
        if record.status != TaskStatus::Pending {
            tracing::warn!(
                task_id = %id,
                status = %record.status,
                "skipping task that is not pending"
            );
            return;
        }

        if let Err(error) = self.persist_update(id, TaskUpdate::in_progress(Utc::now())).await {
            tracing::error!(task_id = %id, %error, "failed to mark task in progress");
            self.fail_without_execution(
                id,
                format!("task could not be marked in progress: {error}"),
            )
            .await;
            return;
        }

        tracing::info!(
            task_id = %id,
            agent_type = %record.agent_type,
            action = %record.action,
            "executing task"
        );

        let outcome = self
            .registry
            .execute(record.agent_type, &record.action, &record.parameters)
            .await;

        let update = match outcome {
            Ok(result) => TaskUpdate::completed(result, Utc::now()),
            Err(error) => {
                tracing::warn!(task_id = %id, %error, "task execution failed");
                TaskUpdate::failed(error.to_string(), Utc::now())
            }
        };

        if let Err(error) = self.persist_update(id, update).await {
            tracing::error!(task_id = %id, %error, "failed to persist terminal task status");
        }
    }

    /// Last-resort transition for a task whose agent never ran, so the
    /// record does not stay pending forever. If this write fails too the
    /// record keeps its current status and the failure is logged.
    async fn fail_without_execution(&self, id: TaskId, message: String) {
        if let Err(error) = self
            .persist_update(id, TaskUpdate::failed(message, Utc::now()))
            .await
        {
            tracing::error!(task_id = %id, %error, "failed to persist failure status");
        }
    }

    async fn persist_update(&self, id: TaskId, update: TaskUpdate) -> PersistenceResult<()> {
        let store = Arc::clone(&self.store);
        run_blocking("update_task", move || store.update_task(id, &update)).await
    }
}
