use std::sync::Arc;

use crate::models::{AgentType, CoreError, Parameters, Priority, TaskId, TaskRecord};
use crate::orchestration::{TaskSubmission, WorkerQueue};
use crate::persistence::{RecordStore, run_blocking};

/// Entry point for task submission and status queries. The record is
/// durably created before its id is handed to the queue, so a published id
/// always resolves.
pub struct DispatchGateway {
    store: Arc<dyn RecordStore>,
    queue: WorkerQueue,
}

impl DispatchGateway {
    pub fn new(store: Arc<dyn RecordStore>, queue: WorkerQueue) -> Self {
        Self { store, queue }
    }

    /// Untyped dispatch surface. An unknown agent type fails here, before
    /// anything is persisted.
    pub async fn dispatch(
        &self,
        agent_type: &str,
        action: &str,
        parameters: Parameters,
        priority: Priority,
    ) -> Result<TaskId, CoreError> {
        let agent_type = agent_type.parse::<AgentType>()?;
        self.enqueue(TaskSubmission::new(agent_type, action, parameters, priority))
            .await
    }

    pub async fn enqueue(&self, submission: TaskSubmission) -> Result<TaskId, CoreError> {
        let record = TaskRecord::new(
            submission.agent_type,
            submission.action,
            submission.parameters,
            submission.priority,
        );
        let id = record.id;

        let store = Arc::clone(&self.store);
        run_blocking("create_task", move || store.create_task(&record)).await?;

        tracing::info!(task_id = %id, "task created");
        self.queue.publish(id).await?;
        Ok(id)
    }

    pub async fn status(&self, id: TaskId) -> Result<TaskRecord, CoreError> {
        let store = Arc::clone(&self.store);
        run_blocking("read_task", move || store.read_task(id)).await
    }

    pub async fn recent_tasks(&self, limit: usize) -> Result<Vec<TaskRecord>, CoreError> {
        let store = Arc::clone(&self.store);
        run_blocking("list_recent_tasks", move || store.list_recent_tasks(limit)).await
    }
}
