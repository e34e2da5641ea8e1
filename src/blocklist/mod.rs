//! Domain blocklist subsystem.
//!
//! # Data Flow
//! ```text
//! blocklist file (one rule per line)
//!     → loader.rs (trim, drop blanks, lowercase)
//!     → Blocklist (read-only rule set)
//!     → shared via Arc with every worker
//! ```
//!
//! # Design Decisions
//! - Rules are normalized once at load; lookups never allocate rules
//! - The set is immutable after startup, so workers share it without locks
//! - An empty set blocks nothing; that is never an error

pub mod loader;
pub mod matcher;

pub use loader::load_blocklist;
pub use matcher::Blocklist;
