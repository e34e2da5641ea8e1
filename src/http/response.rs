//! Synthetic responses originated by the proxy itself.
//!
//! The proxy speaks for itself in exactly three cases: a request it could
//! not parse (400), a request refused by policy (403), and the CONNECT
//! success line. Upstream failures produce no response at all; the
//! connection just closes.

/// Reply sent to the client once a CONNECT tunnel is established.
pub const CONNECTION_ESTABLISHED: &[u8] = b"HTTP/1.0 200 Connection Established\r\n\r\n";

pub const BAD_REQUEST_BODY: &str = "Bad Request: unable to parse HTTP request.\n";
pub const BLOCKED_BODY: &str = "Access to the requested domain is blocked.\n";
pub const TUNNEL_DISABLED_BODY: &str = "HTTPS tunneling is disabled by server policy.\n";

/// Render a plain-text HTTP/1.0 response with the fixed header set.
fn plain_text(status: u16, reason: &str, body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.0 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    )
    .into_bytes()
}

/// 400 reply for any parse failure.
pub fn bad_request() -> Vec<u8> {
    plain_text(400, "Bad Request", BAD_REQUEST_BODY)
}

/// 403 reply for a blocklisted host.
pub fn blocked() -> Vec<u8> {
    plain_text(403, "Forbidden", BLOCKED_BODY)
}

/// 403 reply for CONNECT when tunneling is disabled.
pub fn tunnel_disabled() -> Vec<u8> {
    plain_text(403, "Forbidden", TUNNEL_DISABLED_BODY)
}
