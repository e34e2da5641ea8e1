//! Forward HTTP Proxy Library
//!
//! A forward proxy with opaque HTTPS tunneling (CONNECT) and
//! domain-based access control, built on Tokio.

pub mod blocklist;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod server;

pub use blocklist::Blocklist;
pub use config::schema::ProxyConfig;
pub use lifecycle::Shutdown;
pub use server::ProxyServer;
