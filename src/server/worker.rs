//! Fixed-size worker pool draining the accept queue.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::net::task::Task;

use super::handler::handle_connection;
use super::ProxyContext;

/// A bounded set of workers sharing one task queue.
///
/// Tasks go to whichever worker frees up first; a worker that finishes
/// one task immediately pulls the next.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers draining `queue`.
    pub fn start(
        size: usize,
        queue: UnboundedReceiver<Task>,
        context: Arc<ProxyContext>,
    ) -> Self {
        let queue = Arc::new(Mutex::new(queue));
        let handles = (0..size)
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let context = Arc::clone(&context);
                tokio::spawn(async move {
                    tracing::debug!(worker_id, "Worker started");
                    loop {
                        // The queue lock is held only for the dequeue;
                        // handling runs with the queue free for the
                        // other workers.
                        let task = queue.lock().await.recv().await;
                        match task {
                            Some(task) => handle_connection(task, &context).await,
                            None => break,
                        }
                    }
                    tracing::debug!(worker_id, "Worker stopped");
                })
            })
            .collect();
        Self { handles }
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to finish draining the queue.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
