pub mod activity_log;
pub mod error;
pub mod payment;
pub mod task;

pub use activity_log::{ActivityLogLevel, ActivityLogRecord};
pub use error::CoreError;
pub use payment::{PaymentRecord, PaymentStatus};
pub use task::{AgentType, Parameters, Priority, TaskId, TaskRecord, TaskStatus, TaskUpdate};
