use std::sync::Arc;

use crate::agents::AgentRegistry;
use crate::config::CoreConfig;
use crate::models::CoreError;
use crate::orchestration::{DispatchGateway, TaskExecutor, WorkerPool};
use crate::persistence::RecordStore;
use crate::scheduler::{ScheduleEntry, Scheduler};

/// Owns the assembled orchestration stack. Everything is wired here at
/// startup; no component reaches for global state.
pub struct OrchestrationContext {
    gateway: Arc<DispatchGateway>,
    scheduler: Scheduler,
    pool: WorkerPool,
}

impl OrchestrationContext {
    /// Builds the registry, worker pool, gateway, and scheduler on top of
    /// the given store, and starts the configured schedules.
    pub async fn initialize(
        config: &CoreConfig,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, CoreError> {
        // Validate the schedule configuration before spawning anything.
        let mut entries = Vec::new();
        if config.scheduler_enabled {
            let (hour, minute) = config.daily_report_trigger()?;
            entries.push(ScheduleEntry::daily_report(hour, minute)?);
            tracing::info!(
                trigger = %config.daily_report_time,
                "daily summary schedule enabled"
            );
        }

        let registry = AgentRegistry::with_builtins(Arc::clone(&store));
        let executor = Arc::new(TaskExecutor::new(registry, Arc::clone(&store)));
        let pool = WorkerPool::start(executor, config.workers, config.queue_capacity);
        let gateway = Arc::new(DispatchGateway::new(store, pool.handle()));

        let scheduler = Scheduler::new(Arc::clone(&gateway), entries);
        scheduler.start().await;

        Ok(Self {
            gateway,
            scheduler,
            pool,
        })
    }

    pub fn gateway(&self) -> &Arc<DispatchGateway> {
        &self.gateway
    }

    /// Stops the schedules, then drains and joins the worker pool.
    pub async fn shutdown(self) {
        self.scheduler.stop().await;
        self.pool.shutdown().await;
    }
}
