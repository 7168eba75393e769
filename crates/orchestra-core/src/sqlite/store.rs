use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    ActivityLogLevel, ActivityLogRecord, AgentType, CoreError, Parameters, PaymentRecord,
    PaymentStatus, Priority, TaskId, TaskRecord, TaskStatus, TaskUpdate,
};
use crate::persistence::{ActivityLogStore, PaymentStore, PersistenceResult, TaskStore};
use crate::sqlite::migrations::{SqliteMigration, current_schema_version, migration, migrations};

const MIGRATIONS_TABLE: &str = "orchestra_schema_migrations";

/// File-backed store. Connections are opened per operation; callers running
/// on the async runtime wrap calls in `persistence::run_blocking`.
pub struct SqliteStore {
    database_path: PathBuf,
}

impl SqliteStore {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn planned_migrations(&self, from_version: i64) -> Vec<&'static SqliteMigration> {
        migrations()
            .iter()
            .filter(|entry| entry.version > from_version)
            .collect()
    }

    pub fn current_version(&self) -> PersistenceResult<i64> {
        self.with_connection("current_version", |connection| {
            ensure_migrations_table(connection)?;
            read_current_version(connection)
        })
    }

    pub fn migrate_to_latest(&self) -> PersistenceResult<()> {
        self.apply_migration(current_schema_version())
    }

    pub fn apply_migration(&self, target_version: i64) -> PersistenceResult<()> {
        if target_version < 0 || target_version > current_schema_version() {
            return Err(storage_error_text(
                "apply_migration",
                format!("invalid migration target version '{target_version}'"),
            ));
        }

        if target_version > 0 && migration(target_version).is_none() {
            return Err(storage_error_text(
                "apply_migration",
                format!("migration version '{target_version}' is not defined"),
            ));
        }

        self.with_connection("apply_migration", |connection| {
            ensure_migrations_table(connection)?;
            let current_version = read_current_version(connection)?;

            if target_version == current_version {
                // Re-apply all DDL to handle corrupted state where the
                // migration version was recorded but tables are missing.
                // All DDL uses CREATE TABLE/INDEX IF NOT EXISTS, so this
                // is idempotent.
                for version in 1..=target_version {
                    let m = migration(version).expect("validated migration version must exist");
                    connection.execute_batch(m.up_sql)?;
                }
                return Ok(());
            }

            if target_version > current_version {
                for version in (current_version + 1)..=target_version {
                    let migration =
                        migration(version).expect("validated migration version must exist");
                    apply_up_migration(connection, migration)?;
                }
            } else {
                for version in ((target_version + 1)..=current_version).rev() {
                    let migration =
                        migration(version).expect("validated migration version must exist");
                    apply_down_migration(connection, migration)?;
                }
            }

            Ok(())
        })
    }

    fn with_connection<T>(
        &self,
        operation_name: &str,
        operation: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> PersistenceResult<T> {
        let mut connection = open_connection(&self.database_path)
            .map_err(|error| storage_error(operation_name, error))?;
        operation(&mut connection).map_err(|error| storage_error(operation_name, error))
    }
}

impl TaskStore for SqliteStore {
    fn create_task(&self, task: &TaskRecord) -> PersistenceResult<()> {
        self.with_connection("create_task", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "
INSERT INTO agent_tasks (
    task_id, agent_type, action, parameters_json, priority, status,
    result_json, error_message, created_at, updated_at, completed_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
",
                params![
                    task.id.to_string(),
                    task.agent_type.as_str(),
                    task.action,
                    parameters_to_json(&task.parameters)?,
                    task.priority.as_str(),
                    task.status.as_str(),
                    value_to_json(task.result.as_ref())?,
                    task.error.as_deref(),
                    to_rfc3339(task.created_at),
                    to_rfc3339(task.updated_at),
                    task.completed_at.map(to_rfc3339),
                ],
            )?;
            Ok(())
        })
    }

    fn update_task(&self, id: TaskId, update: &TaskUpdate) -> PersistenceResult<()> {
        let changed = self.with_connection("update_task", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "
UPDATE agent_tasks SET
    status = COALESCE(?2, status),
    result_json = COALESCE(?3, result_json),
    error_message = COALESCE(?4, error_message),
    updated_at = COALESCE(?5, updated_at),
    completed_at = COALESCE(?6, completed_at)
WHERE task_id = ?1
",
                params![
                    id.to_string(),
                    update.status.map(|status| status.as_str()),
                    value_to_json(update.result.as_ref())?,
                    update.error.as_deref(),
                    update.updated_at.map(to_rfc3339),
                    update.completed_at.map(to_rfc3339),
                ],
            )
        })?;

        if changed == 0 {
            return Err(CoreError::NotFound(id));
        }
        Ok(())
    }

    fn read_task(&self, id: TaskId) -> PersistenceResult<TaskRecord> {
        let record = self.with_connection("read_task", |connection| {
            ensure_schema_ready(connection)?;
            connection
                .query_row(
                    &format!("SELECT {TASK_COLUMNS} FROM agent_tasks WHERE task_id = ?1"),
                    [id.to_string()],
                    task_from_row,
                )
                .optional()
        })?;

        record.ok_or(CoreError::NotFound(id))
    }

    fn list_recent_tasks(&self, limit: usize) -> PersistenceResult<Vec<TaskRecord>> {
        self.with_connection("list_recent_tasks", |connection| {
            ensure_schema_ready(connection)?;
            let mut statement = connection.prepare(&format!(
                "
SELECT {TASK_COLUMNS} FROM agent_tasks
ORDER BY created_at DESC, rowid DESC
LIMIT ?1
"
            ))?;
            let rows = statement.query_map([to_i64(limit)?], task_from_row)?;
            rows.collect()
        })
    }
}

impl PaymentStore for SqliteStore {
    fn record_payment(&self, payment: &PaymentRecord) -> PersistenceResult<()> {
        self.with_connection("record_payment", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "
INSERT INTO payments (payment_id, amount, status, created_at)
VALUES (?1, ?2, ?3, ?4)
",
                params![
                    payment.id.to_string(),
                    payment.amount,
                    payment.status.as_str(),
                    to_rfc3339(payment.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn list_recent_payments(&self, limit: usize) -> PersistenceResult<Vec<PaymentRecord>> {
        self.with_connection("list_recent_payments", |connection| {
            ensure_schema_ready(connection)?;
            let mut statement = connection.prepare(
                "
SELECT payment_id, amount, status, created_at FROM payments
ORDER BY created_at DESC, rowid DESC
LIMIT ?1
",
            )?;
            let rows = statement.query_map([to_i64(limit)?], payment_from_row)?;
            rows.collect()
        })
    }

    fn list_payments(&self) -> PersistenceResult<Vec<PaymentRecord>> {
        self.with_connection("list_payments", |connection| {
            ensure_schema_ready(connection)?;
            let mut statement = connection.prepare(
                "
SELECT payment_id, amount, status, created_at FROM payments
ORDER BY created_at DESC, rowid DESC
",
            )?;
            let rows = statement.query_map([], payment_from_row)?;
            rows.collect()
        })
    }
}

impl ActivityLogStore for SqliteStore {
    fn append_log(&self, entry: &ActivityLogRecord) -> PersistenceResult<()> {
        self.with_connection("append_log", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "
INSERT INTO activity_logs (log_type, entity_id, action, details_json, level, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
",
                params![
                    entry.log_type,
                    entry.entity_id,
                    entry.action,
                    value_to_json(Some(&entry.details))?,
                    entry.level.as_str(),
                    to_rfc3339(entry.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn list_recent_logs(&self, limit: usize) -> PersistenceResult<Vec<ActivityLogRecord>> {
        self.with_connection("list_recent_logs", |connection| {
            ensure_schema_ready(connection)?;
            let mut statement = connection.prepare(
                "
SELECT log_type, entity_id, action, details_json, level, created_at FROM activity_logs
ORDER BY created_at DESC, log_id DESC
LIMIT ?1
",
            )?;
            let rows = statement.query_map([to_i64(limit)?], |row| {
                let log_type: String = row.get(0)?;
                let entity_id: String = row.get(1)?;
                let action: String = row.get(2)?;
                let details: String = row.get(3)?;
                let level: String = row.get(4)?;
                let created_at: String = row.get(5)?;
                Ok(ActivityLogRecord {
                    log_type,
                    entity_id,
                    action,
                    details: parse_json(&details)?,
                    level: parse_log_level(&level)?,
                    created_at: parse_datetime(&created_at)?,
                })
            })?;
            rows.collect()
        })
    }
}

fn payment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PaymentRecord> {
    let id: String = row.get(0)?;
    let amount: f64 = row.get(1)?;
    let status: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    Ok(PaymentRecord {
        id: parse_uuid(&id)?,
        amount,
        status: parse_payment_status(&status)?,
        created_at: parse_datetime(&created_at)?,
    })
}

const TASK_COLUMNS: &str = "task_id, agent_type, action, parameters_json, priority, status, \
     result_json, error_message, created_at, updated_at, completed_at";

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRecord> {
    let task_id: String = row.get(0)?;
    let agent_type: String = row.get(1)?;
    let action: String = row.get(2)?;
    let parameters: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let status: String = row.get(5)?;
    let result: Option<String> = row.get(6)?;
    let error: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    let completed_at: Option<String> = row.get(10)?;

    Ok(TaskRecord {
        id: TaskId(parse_uuid(&task_id)?),
        agent_type: parse_agent_type(&agent_type)?,
        action,
        parameters: parse_parameters(&parameters)?,
        priority: parse_priority(&priority)?,
        status: parse_task_status(&status)?,
        result: result.as_deref().map(parse_json).transpose()?,
        error,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
        completed_at: completed_at.as_deref().map(parse_datetime).transpose()?,
    })
}

fn open_connection(database_path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;
    }
    Connection::open(database_path)
}

fn ensure_migrations_table(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(
        "
CREATE TABLE IF NOT EXISTS orchestra_schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
",
    )?;
    Ok(())
}

fn ensure_schema_ready(connection: &Connection) -> rusqlite::Result<()> {
    ensure_migrations_table(connection)?;
    let version = read_current_version(connection)?;
    if version <= 0 {
        return Err(storage_error_sqlite(
            "database schema is not initialized; apply migrations before record operations",
        ));
    }
    Ok(())
}

fn read_current_version(connection: &Connection) -> rusqlite::Result<i64> {
    connection.query_row(
        &format!("SELECT COALESCE(MAX(version), 0) FROM {MIGRATIONS_TABLE}"),
        [],
        |row| row.get(0),
    )
}

fn apply_up_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.up_sql)?;
    transaction.execute(
        &format!(
            "INSERT INTO {MIGRATIONS_TABLE} (version, name, applied_at)
             VALUES (?1, ?2, ?3)"
        ),
        params![migration.version, migration.name, to_rfc3339(Utc::now())],
    )?;
    transaction.commit()?;
    Ok(())
}

fn apply_down_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.down_sql)?;
    transaction.execute(
        &format!("DELETE FROM {MIGRATIONS_TABLE} WHERE version = ?1"),
        [migration.version],
    )?;
    transaction.commit()?;
    Ok(())
}

fn storage_error(operation: &str, error: rusqlite::Error) -> CoreError {
    storage_error_text(operation, error.to_string())
}

fn storage_error_text(operation: &str, message: impl AsRef<str>) -> CoreError {
    CoreError::persistence(operation, message.as_ref())
}

fn storage_error_sqlite(message: &str) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(message.to_string())))
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn parse_datetime(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| {
            storage_error_sqlite(&format!("malformed timestamp '{raw}' in sqlite record: {error}"))
        })
}

fn parse_uuid(raw: &str) -> rusqlite::Result<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| storage_error_sqlite(&format!("malformed uuid '{raw}' in sqlite record")))
}

fn parse_agent_type(raw: &str) -> rusqlite::Result<AgentType> {
    raw.parse::<AgentType>().map_err(|_| {
        storage_error_sqlite(&format!("unknown agent type '{raw}' in sqlite record"))
    })
}

fn parse_priority(raw: &str) -> rusqlite::Result<Priority> {
    raw.parse::<Priority>()
        .map_err(|_| storage_error_sqlite(&format!("unknown priority '{raw}' in sqlite record")))
}

fn parse_task_status(raw: &str) -> rusqlite::Result<TaskStatus> {
    match raw {
        "pending" => Ok(TaskStatus::Pending),
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        "failed" => Ok(TaskStatus::Failed),
        _ => Err(storage_error_sqlite(&format!(
            "unknown task status '{raw}' in sqlite record"
        ))),
    }
}

fn parse_payment_status(raw: &str) -> rusqlite::Result<PaymentStatus> {
    raw.parse::<PaymentStatus>().map_err(|_| {
        storage_error_sqlite(&format!("unknown payment status '{raw}' in sqlite record"))
    })
}

fn parse_log_level(raw: &str) -> rusqlite::Result<ActivityLogLevel> {
    match raw {
        "info" => Ok(ActivityLogLevel::Info),
        "warn" => Ok(ActivityLogLevel::Warn),
        "error" => Ok(ActivityLogLevel::Error),
        _ => Err(storage_error_sqlite(&format!(
            "unknown log level '{raw}' in sqlite record"
        ))),
    }
}

fn parse_json(raw: &str) -> rusqlite::Result<Value> {
    serde_json::from_str(raw)
        .map_err(|error| storage_error_sqlite(&format!("malformed json in sqlite record: {error}")))
}

fn parse_parameters(raw: &str) -> rusqlite::Result<Parameters> {
    serde_json::from_str(raw).map_err(|error| {
        storage_error_sqlite(&format!("malformed parameters json in sqlite record: {error}"))
    })
}

fn parameters_to_json(parameters: &Parameters) -> rusqlite::Result<String> {
    serde_json::to_string(parameters).map_err(|error| {
        storage_error_sqlite(&format!("failed to serialize task parameters: {error}"))
    })
}

fn value_to_json(value: Option<&Value>) -> rusqlite::Result<Option<String>> {
    value
        .map(|inner| {
            serde_json::to_string(inner).map_err(|error| {
                storage_error_sqlite(&format!("failed to serialize json payload: {error}"))
            })
        })
        .transpose()
}

fn to_i64(value: usize) -> rusqlite::Result<i64> {
    i64::try_from(value).map_err(|_| storage_error_sqlite("value exceeds i64 range"))
}
