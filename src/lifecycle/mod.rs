//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     trigger → acceptor stops → queue drains → workers exit
//! ```
//!
//! # Design Decisions
//! - One-way transition: shutdown never un-triggers
//! - In-flight connections run to natural completion (or time out);
//!   only new work is refused

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
