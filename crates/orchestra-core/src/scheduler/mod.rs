use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::models::{AgentType, CoreError, Parameters, Priority};
use crate::orchestration::{DispatchGateway, TaskSubmission};

/// One recurring submission: a cron schedule plus the task it creates on
/// every firing.
#[derive(Clone)]
pub struct ScheduleEntry {
    pub name: String,
    pub schedule: Schedule,
    pub template: TaskSubmission,
}

impl ScheduleEntry {
    pub fn new(name: impl Into<String>, schedule: Schedule, template: TaskSubmission) -> Self {
        Self {
            name: name.into(),
            schedule,
            template,
        }
    }

    /// The built-in daily business report, fired once per day at the given
    /// UTC time.
    pub fn daily_report(hour: u32, minute: u32) -> Result<Self, CoreError> {
        let expression = format!("0 {minute} {hour} * * *");
        let schedule = expression.parse::<Schedule>().map_err(|error| {
            CoreError::InvalidConfig(format!(
                "cron expression '{expression}' is invalid: {error}"
            ))
        })?;

        let mut parameters = Parameters::new();
        parameters.insert("report_type".to_string(), "daily_summary".into());

        Ok(Self::new(
            "daily_summary",
            schedule,
            TaskSubmission::new(
                AgentType::Reports,
                "generate_report",
                parameters,
                Priority::High,
            ),
        ))
    }
}

/// Fires schedule entries through the gateway. Each entry runs in its own
/// task; `stop` waits for all of them, so no entry fires after it returns.
pub struct Scheduler {
    gateway: Arc<DispatchGateway>,
    entries: Vec<ScheduleEntry>,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(gateway: Arc<DispatchGateway>, entries: Vec<ScheduleEntry>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            gateway,
            entries,
            shutdown,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub async fn start(&self) {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            tracing::warn!("scheduler already started");
            return;
        }

        for entry in &self.entries {
            tracing::info!(schedule = %entry.name, "starting schedule");
            handles.push(tokio::spawn(run_entry(
                entry.clone(),
                Arc::clone(&self.gateway),
                self.shutdown.subscribe(),
            )));
        }
    }

    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(error) = handle.await {
                tracing::error!(%error, "schedule task terminated abnormally");
            }
        }
    }
}

async fn run_entry(
    entry: ScheduleEntry,
    gateway: Arc<DispatchGateway>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let now = Utc::now();
        let Some(next) = entry.schedule.after(&now).next() else {
            tracing::warn!(schedule = %entry.name, "schedule has no future firings");
            return;
        };
        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                match gateway.enqueue(entry.template.clone()).await {
                    Ok(id) => {
                        tracing::info!(schedule = %entry.name, task_id = %id, "scheduled task created");
                    }
                    Err(error) => {
                        tracing::error!(schedule = %entry.name, %error, "scheduled task creation failed");
                    }
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}
