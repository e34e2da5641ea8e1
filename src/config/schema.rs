//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Worker pool settings.
    pub workers: WorkerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Blocklist and tunneling policy.
    pub filtering: FilteringConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Address to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of workers draining the accept queue.
    pub pool_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { pool_size: 4 }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-connection timeout in seconds.
    ///
    /// Bounds every socket read and write on both the client and the
    /// origin leg, and each readiness wait inside a tunnel.
    pub connection_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connection_secs: 15 }
    }
}

/// Blocklist and tunneling policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilteringConfig {
    /// Enforce the domain blocklist.
    pub enable_blocklist: bool,

    /// File with one blocked domain rule per line.
    pub blocklist_file: String,

    /// Allow CONNECT tunneling. When disabled, CONNECT requests are
    /// refused with a 403.
    pub enable_https_tunnel: bool,
}

impl Default for FilteringConfig {
    fn default() -> Self {
        Self {
            enable_blocklist: true,
            blocklist_file: "config/blocked_sites.txt".to_string(),
            enable_https_tunnel: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level for diagnostic tracing (trace, debug, info, warn, error).
    pub log_level: String,

    /// Write one access-log record per handled connection.
    pub access_log_enabled: bool,

    /// Access log file path.
    pub access_log_file: String,

    /// Rotate the access log once it reaches this size.
    pub access_log_max_size_bytes: u64,

    /// File the metrics summary is persisted to.
    pub metrics_file: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            access_log_enabled: true,
            access_log_file: "config/logs/proxy.log".to_string(),
            access_log_max_size_bytes: 64 * 1024,
            metrics_file: "config/metrics.txt".to_string(),
        }
    }
}
