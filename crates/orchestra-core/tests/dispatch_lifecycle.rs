use std::sync::Arc;
use std::time::Duration;

use orchestra_core::agents::AgentRegistry;
use orchestra_core::models::{
    CoreError, Parameters, Priority, TaskId, TaskRecord, TaskStatus,
};
use orchestra_core::orchestration::{DispatchGateway, TaskExecutor, WorkerPool, WorkerQueue};
use orchestra_core::persistence::{InMemoryStore, RecordStore, TaskStore};
use tokio::sync::mpsc;

fn running_stack(store: Arc<dyn RecordStore>) -> (DispatchGateway, WorkerPool) {
    let registry = AgentRegistry::with_builtins(Arc::clone(&store));
    let executor = Arc::new(TaskExecutor::new(registry, Arc::clone(&store)));
    let pool = WorkerPool::start(executor, 2, 8);
    let gateway = DispatchGateway::new(store, pool.handle());
    (gateway, pool)
}

/// Gateway whose queue has no consumers, so dispatched tasks stay pending.
fn parked_gateway(store: Arc<dyn RecordStore>) -> (DispatchGateway, mpsc::Receiver<TaskId>) {
    let (sender, receiver) = mpsc::channel(8);
    (
        DispatchGateway::new(store, WorkerQueue::new(sender)),
        receiver,
    )
}

async fn wait_terminal(gateway: &DispatchGateway, id: TaskId) -> TaskRecord {
    for _ in 0..250 {
        let record = gateway.status(id).await.expect("task record must exist");
        if record.status.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("task {id} did not reach a terminal status in time");
}

#[tokio::test]
async fn invalid_agent_type_creates_no_record() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, _receiver) = parked_gateway(store.clone());

    let error = gateway
        .dispatch("robotics", "do_things", Parameters::new(), Priority::Medium)
        .await
        .unwrap_err();

    assert_eq!(error, CoreError::InvalidAgentType("robotics".to_string()));
    assert!(store.list_recent_tasks(10).unwrap().is_empty());
}

#[tokio::test]
async fn dispatched_task_is_pending_until_executed() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, _receiver) = parked_gateway(store);

    let id = gateway
        .dispatch(
            "marketing",
            "generate_content",
            Parameters::new(),
            Priority::Low,
        )
        .await
        .unwrap();

    let record = gateway.status(id).await.unwrap();
    assert_eq!(record.status, TaskStatus::Pending);
    assert!(record.result.is_none());
    assert!(record.error.is_none());
    assert!(record.completed_at.is_none());
}

#[tokio::test]
async fn known_action_completes_with_result_only() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, pool) = running_stack(store);

    let mut parameters = Parameters::new();
    parameters.insert("topic".to_string(), "spring launch".into());
    let id = gateway
        .dispatch("marketing", "generate_content", parameters, Priority::High)
        .await
        .unwrap();

    let record = wait_terminal(&gateway, id).await;
    assert_eq!(record.status, TaskStatus::Completed);
    assert!(record.error.is_none());
    assert!(record.completed_at.is_some());

    let result = record.result.expect("completed task must carry a result");
    assert_eq!(
        result["generated_content"],
        "AI-generated social_media content about spring launch"
    );

    pool.shutdown().await;
}

#[tokio::test]
async fn unknown_action_fails_with_error_only() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, pool) = running_stack(store);

    let id = gateway
        .dispatch(
            "marketing",
            "teleport_customers",
            Parameters::new(),
            Priority::Medium,
        )
        .await
        .unwrap();

    let record = wait_terminal(&gateway, id).await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.result.is_none());
    assert!(record.completed_at.is_some());

    let error = record.error.expect("failed task must carry an error");
    assert!(error.contains("teleport_customers"), "error was: {error}");

    pool.shutdown().await;
}

#[tokio::test]
async fn general_agent_has_no_actions() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, pool) = running_stack(store);

    let id = gateway
        .dispatch("general", "anything", Parameters::new(), Priority::Medium)
        .await
        .unwrap();

    let record = wait_terminal(&gateway, id).await;
    assert_eq!(record.status, TaskStatus::Failed);

    pool.shutdown().await;
}

#[tokio::test]
async fn status_is_stable_after_terminal() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, pool) = running_stack(store);

    let id = gateway
        .dispatch(
            "analytics",
            "generate_insights",
            Parameters::new(),
            Priority::Medium,
        )
        .await
        .unwrap();

    let first = wait_terminal(&gateway, id).await;
    let second = gateway.status(id).await.unwrap();
    assert_eq!(first, second);

    pool.shutdown().await;
}

#[tokio::test]
async fn status_of_unknown_id_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, _receiver) = parked_gateway(store);

    let id = TaskId::new();
    assert_eq!(gateway.status(id).await.unwrap_err(), CoreError::NotFound(id));
}

#[tokio::test]
async fn shutdown_completes_while_gateway_is_alive() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, pool) = running_stack(store);

    let id = gateway
        .dispatch(
            "marketing",
            "analyze_campaign",
            Parameters::new(),
            Priority::Medium,
        )
        .await
        .unwrap();

    // The gateway still holds a queue handle; shutdown must not wait for it.
    tokio::time::timeout(Duration::from_secs(5), pool.shutdown())
        .await
        .expect("worker pool shutdown timed out");

    let record = gateway.status(id).await.unwrap();
    assert_eq!(record.status, TaskStatus::Completed);
}

#[tokio::test]
async fn recent_tasks_lists_newest_first() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, _receiver) = parked_gateway(store);

    let mut ids = Vec::new();
    for action in ["generate_content", "analyze_campaign", "generate_content"] {
        ids.push(
            gateway
                .dispatch("marketing", action, Parameters::new(), Priority::Medium)
                .await
                .unwrap(),
        );
    }

    let recent = gateway.recent_tasks(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, ids[2]);
    assert_eq!(recent[1].id, ids[1]);
}

#[tokio::test]
async fn shutdown_drains_queued_tasks() {
    let store = Arc::new(InMemoryStore::new());
    let (gateway, pool) = running_stack(store.clone());

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(
            gateway
                .dispatch(
                    "marketing",
                    "analyze_campaign",
                    Parameters::new(),
                    Priority::Medium,
                )
                .await
                .unwrap(),
        );
    }

    pool.shutdown().await;

    for id in ids {
        let record = gateway.status(id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
    }
}
