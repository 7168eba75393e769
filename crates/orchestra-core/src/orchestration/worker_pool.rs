use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::models::{CoreError, TaskId};
use crate::orchestration::TaskExecutor;

/// Cloneable producer side of the execution queue. Publishing awaits when
/// the queue is at capacity, so dispatch backpressures instead of growing
/// an unbounded backlog.
#[derive(Clone)]
pub struct WorkerQueue {
    sender: mpsc::Sender<TaskId>,
}

impl WorkerQueue {
    pub fn new(sender: mpsc::Sender<TaskId>) -> Self {
        Self { sender }
    }

    pub async fn publish(&self, id: TaskId) -> Result<(), CoreError> {
        self.sender
            .send(id)
            .await
            .map_err(|_| CoreError::Internal("task queue is closed".to_string()))
    }
}

/// Fixed set of workers pulling task ids off one shared bounded queue.
pub struct WorkerPool {
    sender: mpsc::Sender<TaskId>,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn start(executor: Arc<TaskExecutor>, workers: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let (shutdown, _) = watch::channel(false);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers.max(1))
            .map(|worker_index| {
                let executor = Arc::clone(&executor);
                let receiver = Arc::clone(&receiver);
                let mut shutdown = shutdown.subscribe();
                tokio::spawn(async move {
                    tracing::debug!(worker_index, "task worker started");
                    loop {
                        // Lock only for the receive so workers drain the
                        // queue concurrently. The select is biased toward
                        // the queue, so already-queued tasks are drained
                        // before the shutdown signal stops the worker.
                        let next = {
                            let mut receiver = receiver.lock().await;
                            tokio::select! {
                                biased;
                                next = receiver.recv() => next,
                                _ = shutdown.changed() => receiver.try_recv().ok(),
                            }
                        };
                        match next {
                            Some(id) => executor.execute(id).await,
                            None => break,
                        }
                    }
                    tracing::debug!(worker_index, "task worker stopped");
                })
            })
            .collect();

        Self {
            sender,
            shutdown,
            workers,
        }
    }

    pub fn handle(&self) -> WorkerQueue {
        WorkerQueue::new(self.sender.clone())
    }

    /// Drains queued tasks, then stops and joins the workers. Queue handles
    /// cloned off [`Self::handle`] may still be alive; stopping does not
    /// depend on every sender being dropped.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        drop(self.sender);
        for handle in self.workers {
            if let Err(error) = handle.await {
                tracing::error!(%error, "task worker terminated abnormally");
            }
        }
    }
}
