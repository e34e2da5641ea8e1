//! Proxy server: acceptor loop and worker pool.
//!
//! # Data Flow
//! ```text
//! accept() → Task → unbounded queue → worker (1 of N) → handler.rs
//! ```
//!
//! # Design Decisions
//! - The queue is unbounded; backpressure is implicit (tasks wait for a
//!   free worker, bounded only by memory and accept rate)
//! - Shutdown closes the queue's send side: queued tasks drain, new
//!   connections are refused, workers exit once the queue is empty
//! - No ordering guarantee between queued tasks beyond eventual service

pub mod handler;
pub mod worker;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::blocklist::Blocklist;
use crate::config::schema::ProxyConfig;
use crate::lifecycle::Shutdown;
use crate::net::listener::Listener;
use crate::net::task::Task;
use crate::observability::{AccessLog, ProxyMetrics};

use worker::WorkerPool;

/// Everything a worker needs to handle one connection.
///
/// Shared read-only across the pool; the log and metrics sinks
/// serialize themselves internally.
pub struct ProxyContext {
    pub config: ProxyConfig,
    pub blocklist: Arc<Blocklist>,
    pub access_log: Arc<AccessLog>,
    pub metrics: Arc<ProxyMetrics>,
}

/// The forward proxy server.
pub struct ProxyServer {
    context: Arc<ProxyContext>,
}

impl ProxyServer {
    /// Create a server over an immutable context.
    pub fn new(context: ProxyContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Accept connections until shutdown, dispatching each to the pool.
    ///
    /// Returns once the acceptor has stopped and every queued task has
    /// been handled. The caller binds the listener, so bind failures
    /// are fatal before any worker starts.
    pub async fn run(&self, listener: Listener, shutdown: Arc<Shutdown>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::start(
            self.context.config.workers.pool_size,
            queue_rx,
            Arc::clone(&self.context),
        );

        let mut shutdown_rx = shutdown.subscribe();
        loop {
            // A trigger that predates the subscription never reaches the
            // broadcast receiver; the flag covers that window.
            if shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let task = Task::new(stream, peer);
                        tracing::debug!(id = %task.id, peer = %task.peer, "Connection accepted");
                        if queue_tx.send(task).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        // An accept interrupted by shutdown is a normal stop.
                        if shutdown.is_triggered() {
                            break;
                        }
                        tracing::warn!(%error, "Accept failed");
                    }
                },
            }
        }

        drop(queue_tx);
        drop(listener);
        tracing::info!("Server stopped accepting connections");

        pool.join().await;
    }
}
