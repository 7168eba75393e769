pub mod in_memory;

pub use in_memory::InMemoryStore;

use crate::models::{
    ActivityLogRecord, CoreError, PaymentRecord, TaskId, TaskRecord, TaskUpdate,
};

pub type PersistenceResult<T> = Result<T, CoreError>;

/// CRUD surface for task records. Implementations are synchronous; async
/// callers go through [`run_blocking`] so store I/O never stalls the runtime.
pub trait TaskStore: Send + Sync {
    fn create_task(&self, task: &TaskRecord) -> PersistenceResult<()>;

    fn update_task(&self, id: TaskId, update: &TaskUpdate) -> PersistenceResult<()>;

    fn read_task(&self, id: TaskId) -> PersistenceResult<TaskRecord>;

    fn list_recent_tasks(&self, limit: usize) -> PersistenceResult<Vec<TaskRecord>>;
}

pub trait PaymentStore: Send + Sync {
    fn record_payment(&self, payment: &PaymentRecord) -> PersistenceResult<()>;

    fn list_recent_payments(&self, limit: usize) -> PersistenceResult<Vec<PaymentRecord>>;

    /// Every recorded payment, newest first.
    fn list_payments(&self) -> PersistenceResult<Vec<PaymentRecord>>;
}

pub trait ActivityLogStore: Send + Sync {
    fn append_log(&self, entry: &ActivityLogRecord) -> PersistenceResult<()>;

    fn list_recent_logs(&self, limit: usize) -> PersistenceResult<Vec<ActivityLogRecord>>;
}

/// Union of the store capabilities the orchestration core depends on.
pub trait RecordStore: TaskStore + PaymentStore + ActivityLogStore {}

impl<T: TaskStore + PaymentStore + ActivityLogStore> RecordStore for T {}

/// Runs a blocking store operation off the async runtime, mapping join
/// failures into [`CoreError::Internal`].
pub async fn run_blocking<T, F>(operation: &'static str, f: F) -> PersistenceResult<T>
where
    F: FnOnce() -> PersistenceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|join_error| {
            CoreError::Internal(format!("'{operation}' join failure: {join_error}"))
        })?
}
