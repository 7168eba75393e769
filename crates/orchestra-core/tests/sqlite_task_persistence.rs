use chrono::Utc;
use orchestra_core::models::{
    ActivityLogRecord, AgentType, CoreError, Parameters, PaymentRecord, PaymentStatus, Priority,
    TaskId, TaskRecord, TaskStatus, TaskUpdate,
};
use orchestra_core::persistence::{ActivityLogStore, PaymentStore, TaskStore};
use orchestra_core::sqlite::{SqliteStore, current_schema_version};
use serde_json::json;
use tempfile::TempDir;

fn migrated_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteStore::new(dir.path().join("core.db"));
    store.migrate_to_latest().expect("migrations apply");
    (dir, store)
}

fn sample_task() -> TaskRecord {
    let mut parameters = Parameters::new();
    parameters.insert("topic".to_string(), "retention".into());
    TaskRecord::new(
        AgentType::Analytics,
        "analyze_data",
        parameters,
        Priority::High,
    )
}

#[test]
fn migrations_are_idempotent() {
    let (_dir, store) = migrated_store();
    assert_eq!(store.current_version().unwrap(), current_schema_version());

    store.migrate_to_latest().unwrap();
    assert_eq!(store.current_version().unwrap(), current_schema_version());
}

#[test]
fn planned_migrations_shrink_as_version_advances() {
    let (_dir, store) = migrated_store();
    assert!(store.planned_migrations(0).len() >= 1);
    assert!(
        store
            .planned_migrations(current_schema_version())
            .is_empty()
    );
}

#[test]
fn operations_require_an_initialized_schema() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::new(dir.path().join("core.db"));

    let error = store.create_task(&sample_task()).unwrap_err();
    assert!(matches!(error, CoreError::Persistence { .. }));
}

#[test]
fn task_round_trips_through_sqlite() {
    let (_dir, store) = migrated_store();
    let task = sample_task();

    store.create_task(&task).unwrap();
    let read = store.read_task(task.id).unwrap();

    assert_eq!(read.id, task.id);
    assert_eq!(read.agent_type, task.agent_type);
    assert_eq!(read.action, task.action);
    assert_eq!(read.parameters, task.parameters);
    assert_eq!(read.priority, task.priority);
    assert_eq!(read.status, TaskStatus::Pending);
    assert!(read.result.is_none());
    assert!(read.error.is_none());
    assert!(read.completed_at.is_none());
}

#[test]
fn partial_updates_touch_only_supplied_fields() {
    let (_dir, store) = migrated_store();
    let task = sample_task();
    store.create_task(&task).unwrap();

    store
        .update_task(task.id, &TaskUpdate::in_progress(Utc::now()))
        .unwrap();
    let in_progress = store.read_task(task.id).unwrap();
    assert_eq!(in_progress.status, TaskStatus::InProgress);
    assert_eq!(in_progress.action, task.action);
    assert!(in_progress.completed_at.is_none());

    let result = json!({"metrics": {"completed_tasks": 3}});
    store
        .update_task(task.id, &TaskUpdate::completed(result.clone(), Utc::now()))
        .unwrap();
    let completed = store.read_task(task.id).unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.result, Some(result));
    assert!(completed.error.is_none());
    assert!(completed.completed_at.is_some());
}

#[test]
fn failed_update_persists_error_message() {
    let (_dir, store) = migrated_store();
    let task = sample_task();
    store.create_task(&task).unwrap();

    store
        .update_task(task.id, &TaskUpdate::failed("agent exploded", Utc::now()))
        .unwrap();
    let failed = store.read_task(task.id).unwrap();
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("agent exploded"));
    assert!(failed.result.is_none());
}

#[test]
fn unknown_task_id_is_not_found() {
    let (_dir, store) = migrated_store();
    let id = TaskId::new();

    assert_eq!(store.read_task(id).unwrap_err(), CoreError::NotFound(id));
    assert_eq!(
        store
            .update_task(id, &TaskUpdate::in_progress(Utc::now()))
            .unwrap_err(),
        CoreError::NotFound(id)
    );
}

#[test]
fn recent_tasks_are_listed_newest_first() {
    let (_dir, store) = migrated_store();
    let first = sample_task();
    let second = sample_task();
    store.create_task(&first).unwrap();
    store.create_task(&second).unwrap();

    let recent = store.list_recent_tasks(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, second.id);
    assert_eq!(recent[1].id, first.id);

    assert_eq!(store.list_recent_tasks(1).unwrap().len(), 1);
}

#[test]
fn payments_round_trip_and_list() {
    let (_dir, store) = migrated_store();
    let completed = PaymentRecord::new(99.5, PaymentStatus::Completed);
    let pending = PaymentRecord::new(12.0, PaymentStatus::Pending);
    store.record_payment(&completed).unwrap();
    store.record_payment(&pending).unwrap();

    let all = store.list_payments().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|p| p.id == completed.id && p.amount == 99.5));

    let recent = store.list_recent_payments(1).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, pending.id);
}

#[test]
fn activity_logs_round_trip() {
    let (_dir, store) = migrated_store();
    let entry = ActivityLogRecord::info(
        "report_generated",
        "daily_summary",
        "generate_report",
        json!({"status": "success"}),
    );
    store.append_log(&entry).unwrap();

    let logs = store.list_recent_logs(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log_type, "report_generated");
    assert_eq!(logs[0].details, json!({"status": "success"}));
}

#[test]
fn down_migration_removes_schema() {
    let (_dir, store) = migrated_store();
    store.apply_migration(0).unwrap();
    assert_eq!(store.current_version().unwrap(), 0);

    let error = store.create_task(&sample_task()).unwrap_err();
    assert!(matches!(error, CoreError::Persistence { .. }));
}
