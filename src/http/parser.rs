//! Incremental HTTP request parsing.
//!
//! # Responsibilities
//! - Accumulate raw bytes until a full header block is buffered
//! - Reject malformed request lines as soon as the first line is complete
//! - Extract the relay target (host, port, path) from the three request forms
//! - Rewrite the request line to HTTP/1.0 for the upstream copy
//!
//! # Design Decisions
//! - One deadline covers the whole accumulation loop, not each read
//! - The buffer is capped at 8 KiB; a header block that exceeds it fails
//! - Every halting condition is a distinct error variant so callers and
//!   tests can tell them apart, even though the handler answers all of
//!   them with the same 400

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout_at, Instant};

/// Upper bound on buffered bytes while waiting for the header terminator.
pub const MAX_HEADER_BYTES: usize = 8192;

/// Port assumed when a request names none.
pub const DEFAULT_HTTP_PORT: u16 = 80;

const READ_CHUNK: usize = 4096;

/// A fully parsed client request, ready for the relay engine.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub method: String,
    pub host: String,
    pub port: u16,
    /// Request path; empty for CONNECT.
    pub path: String,
    /// The bytes to send upstream: the buffered request with its
    /// request line rewritten to HTTP/1.0. Unused for CONNECT.
    pub raw: Vec<u8>,
}

impl ParsedRequest {
    /// The rewritten request line, as sent upstream and logged.
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/1.0", self.method, self.path)
    }

    /// Relay target as `host:port`.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Why a request failed to parse.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Request line did not split into method, target and version.
    #[error("malformed request line")]
    MalformedRequestLine,
    /// Header block exceeded the buffering cap before terminating.
    #[error("header block exceeds {MAX_HEADER_BYTES} bytes")]
    HeadersTooLarge,
    /// Peer closed the connection before the header block completed.
    #[error("connection closed before headers completed")]
    ConnectionClosed,
    /// Deadline elapsed before the header block completed.
    #[error("timed out reading request headers")]
    TimedOut,
    /// The request target (or Host header value) names no usable host:port.
    #[error("invalid request target")]
    InvalidTarget,
    /// Non-CONNECT request with a relative target and no Host header.
    #[error("missing Host header")]
    MissingHost,
    /// Transport error while reading.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a request from `source`, stopping at the header terminator.
///
/// The deadline bounds the whole accumulation loop: a client that
/// trickles bytes slower than the header block completes is failed with
/// [`ParseError::TimedOut`] no matter how often it sends.
pub async fn parse_request<R>(source: &mut R, deadline: Instant) -> Result<ParsedRequest, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut data: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let header_end = loop {
        let read = timeout_at(deadline, source.read(&mut chunk))
            .await
            .map_err(|_| ParseError::TimedOut)?;
        let n = read?;
        if n == 0 {
            return Err(ParseError::ConnectionClosed);
        }

        data.extend_from_slice(&chunk[..n]);
        if data.len() > MAX_HEADER_BYTES {
            return Err(ParseError::HeadersTooLarge);
        }

        // Validate the request line the moment it is complete; an
        // obviously malformed request fails without waiting for the
        // rest of the headers.
        if let Some(line_end) = find(&data, b"\r\n") {
            split_request_line(&data[..line_end])?;
        }

        if let Some(end) = find(&data, b"\r\n\r\n") {
            break end;
        }
    };

    let line_end = find(&data, b"\r\n").ok_or(ParseError::MalformedRequestLine)?;
    let (method, target) = split_request_line(&data[..line_end])?;

    if method == "CONNECT" {
        let (host, port) = split_host_port(&target)?;
        return Ok(ParsedRequest {
            method,
            host,
            port,
            path: String::new(),
            raw: data,
        });
    }

    let (host, port, path) = if let Some(rest) = target.strip_prefix("http://") {
        let (authority, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], rest[slash..].to_string()),
            None => (rest, "/".to_string()),
        };
        let (host, port) = split_optional_port(authority)?;
        (host, port, path)
    } else if target.starts_with('/') {
        // The header block may be empty (terminator right after the
        // request line), so clamp the slice start.
        let headers_start = (line_end + 2).min(header_end);
        let value = host_header(&data[headers_start..header_end])?;
        let (host, port) = split_optional_port(value.trim_start_matches(' '))?;
        (host, port, target)
    } else {
        return Err(ParseError::InvalidTarget);
    };

    if host.is_empty() {
        return Err(ParseError::InvalidTarget);
    }

    let mut raw = format!("{} {} HTTP/1.0", method, path).into_bytes();
    raw.extend_from_slice(&data[line_end..]);

    Ok(ParsedRequest {
        method,
        host,
        port,
        path,
        raw,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Split a request line at its first two spaces into method and target.
fn split_request_line(line: &[u8]) -> Result<(String, String), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::MalformedRequestLine)?;
    let first = line.find(' ').ok_or(ParseError::MalformedRequestLine)?;
    let second = line[first + 1..]
        .find(' ')
        .ok_or(ParseError::MalformedRequestLine)?
        + first
        + 1;
    Ok((line[..first].to_string(), line[first + 1..second].to_string()))
}

/// Split a CONNECT target; the colon and port are mandatory.
fn split_host_port(target: &str) -> Result<(String, u16), ParseError> {
    let colon = target.find(':').ok_or(ParseError::InvalidTarget)?;
    let host = &target[..colon];
    if host.is_empty() {
        return Err(ParseError::InvalidTarget);
    }
    let port = target[colon + 1..]
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidTarget)?;
    Ok((host.to_string(), port))
}

/// Split an authority into host and port, defaulting the port to 80.
fn split_optional_port(authority: &str) -> Result<(String, u16), ParseError> {
    match authority.find(':') {
        Some(colon) => {
            let port = authority[colon + 1..]
                .parse::<u16>()
                .map_err(|_| ParseError::InvalidTarget)?;
            Ok((authority[..colon].to_string(), port))
        }
        None => Ok((authority.to_string(), DEFAULT_HTTP_PORT)),
    }
}

/// Find the Host header value in a header block.
fn host_header(headers: &[u8]) -> Result<&str, ParseError> {
    let headers = std::str::from_utf8(headers).map_err(|_| ParseError::MissingHost)?;
    for line in headers.split("\r\n") {
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("host") {
                return Ok(value);
            }
        }
    }
    Err(ParseError::MissingHost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    async fn parse_bytes(input: &[u8]) -> Result<ParsedRequest, ParseError> {
        let (mut tx, mut rx) = tokio::io::duplex(32 * 1024);
        tx.write_all(input).await.unwrap();
        drop(tx);
        parse_request(&mut rx, Instant::now() + Duration::from_secs(5)).await
    }

    #[tokio::test]
    async fn parses_relative_target_with_host_header() {
        let request = parse_bytes(b"GET /x HTTP/1.1\r\nHost: a.b:81\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.host, "a.b");
        assert_eq!(request.port, 81);
        assert_eq!(request.path, "/x");
        assert_eq!(request.request_line(), "GET /x HTTP/1.0");
        assert_eq!(&request.raw, b"GET /x HTTP/1.0\r\nHost: a.b:81\r\n\r\n");
    }

    #[tokio::test]
    async fn parses_connect_target() {
        let request = parse_bytes(b"CONNECT a.b:443 HTTP/1.1\r\n\r\n").await.unwrap();
        assert_eq!(request.method, "CONNECT");
        assert_eq!(request.host, "a.b");
        assert_eq!(request.port, 443);
        assert_eq!(request.path, "");
    }

    #[tokio::test]
    async fn connect_without_port_fails() {
        let result = parse_bytes(b"CONNECT a.b HTTP/1.1\r\n\r\n").await;
        assert!(matches!(result, Err(ParseError::InvalidTarget)));
    }

    #[tokio::test]
    async fn connect_with_out_of_range_port_fails() {
        let result = parse_bytes(b"CONNECT a.b:99999 HTTP/1.1\r\n\r\n").await;
        assert!(matches!(result, Err(ParseError::InvalidTarget)));
    }

    #[tokio::test]
    async fn parses_absolute_uri() {
        let request = parse_bytes(b"GET http://example.com/path/x HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(request.host, "example.com");
        assert_eq!(request.port, 80);
        assert_eq!(request.path, "/path/x");
    }

    #[tokio::test]
    async fn absolute_uri_without_path_gets_root() {
        let request = parse_bytes(b"GET http://example.com HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(request.path, "/");
        assert_eq!(request.request_line(), "GET / HTTP/1.0");
    }

    #[tokio::test]
    async fn absolute_uri_port_overrides_default() {
        let request = parse_bytes(b"GET http://example.com:8080/x HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(request.host, "example.com");
        assert_eq!(request.port, 8080);
    }

    #[tokio::test]
    async fn host_header_name_is_case_insensitive() {
        let request = parse_bytes(b"GET /x HTTP/1.1\r\nhOsT:   a.b\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(request.host, "a.b");
        assert_eq!(request.port, 80);
    }

    #[tokio::test]
    async fn missing_host_header_fails() {
        let result = parse_bytes(b"GET /x HTTP/1.1\r\nUser-Agent: t\r\n\r\n").await;
        assert!(matches!(result, Err(ParseError::MissingHost)));
    }

    #[tokio::test]
    async fn relative_target_with_no_headers_at_all_fails() {
        let result = parse_bytes(b"GET /x HTTP/1.1\r\n\r\n").await;
        assert!(matches!(result, Err(ParseError::MissingHost)));
    }

    #[tokio::test]
    async fn relative_target_not_starting_with_slash_fails() {
        let result = parse_bytes(b"GET foo HTTP/1.1\r\nHost: a.b\r\n\r\n").await;
        assert!(matches!(result, Err(ParseError::InvalidTarget)));
    }

    #[tokio::test]
    async fn buffered_body_bytes_are_preserved() {
        let request = parse_bytes(b"POST http://a.b/x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
            .await
            .unwrap();
        assert!(request.raw.starts_with(b"POST /x HTTP/1.0\r\n"));
        assert!(request.raw.ends_with(b"\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn one_token_request_line_fails_before_headers_complete() {
        // No header terminator and the stream stays open: the early
        // request-line check alone must reject this.
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        tx.write_all(b"GARBAGE\r\n").await.unwrap();
        let result = parse_request(&mut rx, Instant::now() + Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ParseError::MalformedRequestLine)));
        drop(tx);
    }

    #[tokio::test]
    async fn two_token_request_line_fails() {
        let result = parse_bytes(b"GET /x\r\n\r\n").await;
        assert!(matches!(result, Err(ParseError::MalformedRequestLine)));
    }

    #[tokio::test]
    async fn oversized_header_block_fails_on_size() {
        let mut input = Vec::from(&b"GET /x HTTP/1.1\r\n"[..]);
        input.extend_from_slice(b"X-Pad: ");
        input.resize(MAX_HEADER_BYTES + 512, b'a');
        let result = parse_bytes(&input).await;
        assert!(matches!(result, Err(ParseError::HeadersTooLarge)));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_stream_fails_on_timeout() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        tx.write_all(b"GET /x HTTP/1.1\r\nHost: a.b\r\n").await.unwrap();
        let result = parse_request(&mut rx, Instant::now() + Duration::from_secs(15)).await;
        assert!(matches!(result, Err(ParseError::TimedOut)));
        drop(tx);
    }

    #[tokio::test]
    async fn closed_stream_fails_as_peer_closed() {
        let result = parse_bytes(b"GET /x HTTP/1.1\r\nHost: a.b\r\n").await;
        assert!(matches!(result, Err(ParseError::ConnectionClosed)));
    }
}
