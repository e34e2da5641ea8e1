//! Aggregate request metrics with file persistence.
//!
//! # Responsibilities
//! - Count totals: requests, blocked, allowed, bytes relayed
//! - Track per-host request counts and the top requested host
//! - Persist a human-readable summary on every update
//!
//! # Design Decisions
//! - Updates are fire-and-forget; persistence errors are swallowed
//! - One mutex serializes the counters and the file rewrite

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

/// Shared metrics sink for all workers.
pub struct ProxyMetrics {
    inner: Mutex<MetricsState>,
    path: Option<PathBuf>,
}

struct MetricsState {
    started: Instant,
    total_requests: u64,
    blocked_requests: u64,
    allowed_requests: u64,
    bytes_transferred: u64,
    host_counts: HashMap<String, u64>,
    top_host: Option<(String, u64)>,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            total_requests: 0,
            blocked_requests: 0,
            allowed_requests: 0,
            bytes_transferred: 0,
            host_counts: HashMap::new(),
            top_host: None,
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub blocked_requests: u64,
    pub allowed_requests: u64,
    pub bytes_transferred: u64,
    pub top_host: Option<(String, u64)>,
}

impl ProxyMetrics {
    /// Metrics persisted to `path` on every update.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let metrics = Self {
            inner: Mutex::new(MetricsState::new()),
            path: Some(path),
        };
        if let Ok(state) = metrics.inner.lock() {
            metrics.flush(&state);
        }
        metrics
    }

    /// In-memory metrics without persistence.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(MetricsState::new()),
            path: None,
        }
    }

    /// Count a parsed request against its target host.
    pub fn record_request(&self, host: &str) {
        let Ok(mut state) = self.inner.lock() else { return };
        state.total_requests += 1;

        let count = {
            let entry = state.host_counts.entry(host.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        let is_new_top = match &state.top_host {
            Some((_, top_count)) => count > *top_count,
            None => true,
        };
        if is_new_top {
            state.top_host = Some((host.to_string(), count));
        }

        self.flush(&state);
    }

    /// Count a connection refused by parsing or policy.
    pub fn record_blocked(&self) {
        let Ok(mut state) = self.inner.lock() else { return };
        state.blocked_requests += 1;
        self.flush(&state);
    }

    /// Count a relayed connection and the bytes it moved.
    pub fn record_allowed(&self, bytes: u64) {
        let Ok(mut state) = self.inner.lock() else { return };
        state.allowed_requests += 1;
        state.bytes_transferred += bytes;
        self.flush(&state);
    }

    /// Copy the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let Ok(state) = self.inner.lock() else {
            return MetricsSnapshot::default();
        };
        MetricsSnapshot {
            total_requests: state.total_requests,
            blocked_requests: state.blocked_requests,
            allowed_requests: state.allowed_requests,
            bytes_transferred: state.bytes_transferred,
            top_host: state.top_host.clone(),
        }
    }

    fn flush(&self, state: &MetricsState) {
        let Some(path) = &self.path else { return };

        let elapsed_minutes = state.started.elapsed().as_secs_f64() / 60.0;
        let rpm = if elapsed_minutes > 0.0 {
            state.total_requests as f64 / elapsed_minutes
        } else {
            0.0
        };

        let mut out = String::new();
        out.push_str(&format!("Total Requests : {}\n", state.total_requests));
        out.push_str(&format!("Blocked Requests : {}\n", state.blocked_requests));
        out.push_str(&format!("Allowed Requests : {}\n", state.allowed_requests));
        out.push_str(&format!("Bytes transferred : {}\n", state.bytes_transferred));
        match &state.top_host {
            Some((host, count)) => {
                out.push_str(&format!("Top Requested Host : {} - {}\n", host, count));
            }
            None => out.push_str("Top Requested Host : None\n"),
        }
        out.push_str(&format!("Requests Per Minute : {:.2}\n", rpm));

        let _ = fs::write(path, out);
    }
}
