//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connection handler produces:
//!     → logging.rs (one access-log record per connection)
//!     → metrics.rs (aggregate counters, persisted summary)
//!
//! Diagnostic tracing goes through the `tracing` crate and is
//! configured in main; it is separate from the access log.
//! ```
//!
//! # Design Decisions
//! - Both sinks are fire-and-forget: no return value, errors swallowed
//! - Both serialize their own state; workers call them concurrently

pub mod logging;
pub mod metrics;

pub use logging::AccessLog;
pub use metrics::ProxyMetrics;
