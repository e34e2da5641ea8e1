//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! client bytes
//!     → parser.rs (accumulate headers under a deadline, extract target)
//!     → ParsedRequest (request line rewritten to HTTP/1.0)
//!     → handed to the relay engine
//!
//! response.rs renders the fixed set of replies the proxy originates
//! itself (400, 403, CONNECT established); everything else on the wire
//! comes verbatim from the origin server.
//! ```

pub mod parser;
pub mod response;

pub use parser::{parse_request, ParseError, ParsedRequest};
