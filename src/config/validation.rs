//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (pool size, timeout)
//! - Check referenced file paths are at least present in the config
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `listener.bind_address` is not an IP address.
    InvalidBindAddress(String),
    /// `workers.pool_size` must be at least 1.
    ZeroPoolSize,
    /// `timeouts.connection_secs` must be at least 1.
    ZeroConnectionTimeout,
    /// Blocklist enforcement is on but no blocklist file is named.
    MissingBlocklistFile,
    /// The access log is enabled with a zero rotation cap.
    ZeroAccessLogCap,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address {:?} is not an IP address", addr)
            }
            ValidationError::ZeroPoolSize => {
                write!(f, "workers.pool_size must be at least 1")
            }
            ValidationError::ZeroConnectionTimeout => {
                write!(f, "timeouts.connection_secs must be at least 1")
            }
            ValidationError::MissingBlocklistFile => {
                write!(f, "filtering.blocklist_file is required when the blocklist is enabled")
            }
            ValidationError::ZeroAccessLogCap => {
                write!(
                    f,
                    "observability.access_log_max_size_bytes must be at least 1 when the access log is enabled"
                )
            }
        }
    }
}

/// Check a configuration for semantic problems, reporting every one found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.workers.pool_size == 0 {
        errors.push(ValidationError::ZeroPoolSize);
    }

    if config.timeouts.connection_secs == 0 {
        errors.push(ValidationError::ZeroConnectionTimeout);
    }

    if config.filtering.enable_blocklist && config.filtering.blocklist_file.is_empty() {
        errors.push(ValidationError::MissingBlocklistFile);
    }

    if config.observability.access_log_enabled && config.observability.access_log_max_size_bytes == 0
    {
        errors.push(ValidationError::ZeroAccessLogCap);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
