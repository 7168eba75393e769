use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{
    ActivityLogRecord, CoreError, PaymentRecord, TaskId, TaskRecord, TaskUpdate,
};
use crate::persistence::{ActivityLogStore, PaymentStore, PersistenceResult, TaskStore};

/// Process-local store used by tests and single-process deployments that do
/// not need durability across restarts.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    tasks: HashMap<TaskId, TaskRecord>,
    task_order: Vec<TaskId>,
    payments: Vec<PaymentRecord>,
    logs: Vec<ActivityLogRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> PersistenceResult<std::sync::MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| CoreError::persistence("in_memory", "store mutex poisoned"))
    }
}

impl TaskStore for InMemoryStore {
    fn create_task(&self, task: &TaskRecord) -> PersistenceResult<()> {
        let mut state = self.lock_state()?;
        if state.tasks.insert(task.id, task.clone()).is_some() {
            return Err(CoreError::persistence(
                "create_task",
                format!("task id '{}' already exists", task.id),
            ));
        }
        state.task_order.push(task.id);
        Ok(())
    }

    fn update_task(&self, id: TaskId, update: &TaskUpdate) -> PersistenceResult<()> {
        let mut state = self.lock_state()?;
        let task = state.tasks.get_mut(&id).ok_or(CoreError::NotFound(id))?;
        task.apply(update);
        Ok(())
    }

    fn read_task(&self, id: TaskId) -> PersistenceResult<TaskRecord> {
        let state = self.lock_state()?;
        state.tasks.get(&id).cloned().ok_or(CoreError::NotFound(id))
    }

    fn list_recent_tasks(&self, limit: usize) -> PersistenceResult<Vec<TaskRecord>> {
        let state = self.lock_state()?;
        Ok(state
            .task_order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }
}

impl PaymentStore for InMemoryStore {
    fn record_payment(&self, payment: &PaymentRecord) -> PersistenceResult<()> {
        let mut state = self.lock_state()?;
        state.payments.push(payment.clone());
        Ok(())
    }

    fn list_recent_payments(&self, limit: usize) -> PersistenceResult<Vec<PaymentRecord>> {
        let state = self.lock_state()?;
        Ok(state.payments.iter().rev().take(limit).cloned().collect())
    }

    fn list_payments(&self) -> PersistenceResult<Vec<PaymentRecord>> {
        let state = self.lock_state()?;
        Ok(state.payments.iter().rev().cloned().collect())
    }
}

impl ActivityLogStore for InMemoryStore {
    fn append_log(&self, entry: &ActivityLogRecord) -> PersistenceResult<()> {
        let mut state = self.lock_state()?;
        state.logs.push(entry.clone());
        Ok(())
    }

    fn list_recent_logs(&self, limit: usize) -> PersistenceResult<Vec<ActivityLogRecord>> {
        let state = self.lock_state()?;
        Ok(state.logs.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentType, Parameters, Priority, TaskStatus, TaskUpdate};
    use chrono::Utc;

    fn sample_task() -> TaskRecord {
        TaskRecord::new(
            AgentType::Finance,
            "analyze_financials",
            Parameters::new(),
            Priority::Medium,
        )
    }

    #[test]
    fn create_then_read_round_trips() {
        let store = InMemoryStore::new();
        let task = sample_task();
        store.create_task(&task).unwrap();
        assert_eq!(store.read_task(task.id).unwrap(), task);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let store = InMemoryStore::new();
        let task = sample_task();
        store.create_task(&task).unwrap();
        assert!(store.create_task(&task).is_err());
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let store = InMemoryStore::new();
        let id = TaskId::new();
        let error = store
            .update_task(id, &TaskUpdate::in_progress(Utc::now()))
            .unwrap_err();
        assert_eq!(error, CoreError::NotFound(id));
    }

    #[test]
    fn list_recent_tasks_returns_newest_first() {
        let store = InMemoryStore::new();
        let first = sample_task();
        let second = sample_task();
        store.create_task(&first).unwrap();
        store.create_task(&second).unwrap();

        let recent = store.list_recent_tasks(1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, second.id);
    }

    #[test]
    fn partial_update_preserves_untouched_fields() {
        let store = InMemoryStore::new();
        let task = sample_task();
        store.create_task(&task).unwrap();

        store
            .update_task(task.id, &TaskUpdate::in_progress(Utc::now()))
            .unwrap();
        let read = store.read_task(task.id).unwrap();
        assert_eq!(read.status, TaskStatus::InProgress);
        assert_eq!(read.action, task.action);
        assert_eq!(read.created_at, task.created_at);
        assert!(read.completed_at.is_none());
    }
}
