//! End-to-end tests driving the proxy over real sockets.

mod common;

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use forward_proxy::config::ProxyConfig;

/// Read until the proxy closes the connection.
async fn read_to_end(stream: &mut TcpStream) -> Vec<u8> {
    let mut out = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out)).await;
    out
}

/// Wait out the gap between the relay finishing and the handler
/// recording the outcome.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn forwards_request_and_streams_response() {
    let origin = common::start_mock_origin(
        "HTTP/1.0 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    let proxy = common::start_proxy(ProxyConfig::default(), &[]).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET http://{}/ HTTP/1.1\r\n\r\n", origin);
    client.write_all(request.as_bytes()).await.unwrap();

    let response = read_to_end(&mut client).await;
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.0 200 OK"), "got: {}", text);
    assert!(text.ends_with("hello"), "got: {}", text);

    settle().await;
    let snapshot = proxy.metrics.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.allowed_requests, 1);
    assert_eq!(snapshot.bytes_transferred, response.len() as u64);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn byte_count_matches_a_partial_response() {
    // Origin closes right after a header-less partial body.
    let origin = common::start_mock_origin("HTTP/1.0 200 OK\r\n\r\npart").await;
    let proxy = common::start_proxy(ProxyConfig::default(), &[]).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET http://{}/ HTTP/1.1\r\n\r\n", origin);
    client.write_all(request.as_bytes()).await.unwrap();

    let response = read_to_end(&mut client).await;
    assert!(response.ends_with(b"part"));

    settle().await;
    let snapshot = proxy.metrics.snapshot();
    assert_eq!(snapshot.bytes_transferred, response.len() as u64);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn blocked_host_gets_403_and_zero_bytes() {
    let proxy = common::start_proxy(ProxyConfig::default(), &["blocked.test"]).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    client
        .write_all(b"GET http://sub.blocked.test/ HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let response = read_to_end(&mut client).await;
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.0 403 Forbidden"), "got: {}", text);
    assert!(
        text.ends_with("Access to the requested domain is blocked.\n"),
        "got: {}",
        text
    );

    settle().await;
    let snapshot = proxy.metrics.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.blocked_requests, 1);
    assert_eq!(snapshot.allowed_requests, 0);
    assert_eq!(snapshot.bytes_transferred, 0);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn connect_tunnel_relays_both_directions() {
    let origin = common::start_echo_origin().await;
    let proxy = common::start_proxy(ProxyConfig::default(), &[]).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    client
        .write_all(format!("CONNECT {} HTTP/1.1\r\n\r\n", origin).as_bytes())
        .await
        .unwrap();

    let mut established = [0u8; 39];
    client.read_exact(&mut established).await.unwrap();
    assert_eq!(&established[..], b"HTTP/1.0 200 Connection Established\r\n\r\n");

    client.write_all(b"ping").await.unwrap();
    let mut echoed = [0u8; 4];
    client.read_exact(&mut echoed).await.unwrap();
    assert_eq!(&echoed, b"ping");

    // Closing our write half ends the tunnel; both legs count.
    client.shutdown().await.unwrap();
    settle().await;
    let snapshot = proxy.metrics.snapshot();
    assert_eq!(snapshot.allowed_requests, 1);
    assert_eq!(snapshot.bytes_transferred, 8);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn connect_is_refused_when_tunneling_disabled() {
    let mut config = ProxyConfig::default();
    config.filtering.enable_https_tunnel = false;
    let proxy = common::start_proxy(config, &[]).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    client
        .write_all(b"CONNECT example.com:443 HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let response = read_to_end(&mut client).await;
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.0 403 Forbidden"), "got: {}", text);
    assert!(
        text.ends_with("HTTPS tunneling is disabled by server policy.\n"),
        "got: {}",
        text
    );

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn malformed_request_gets_400() {
    let proxy = common::start_proxy(ProxyConfig::default(), &[]).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    client.write_all(b"NONSENSE\r\n\r\n").await.unwrap();

    let response = read_to_end(&mut client).await;
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.0 400 Bad Request"), "got: {}", text);
    assert!(
        text.ends_with("Bad Request: unable to parse HTTP request.\n"),
        "got: {}",
        text
    );

    settle().await;
    let snapshot = proxy.metrics.snapshot();
    assert_eq!(snapshot.total_requests, 0);
    assert_eq!(snapshot.blocked_requests, 1);

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn blocklist_is_ignored_when_disabled() {
    let origin = common::start_mock_origin("HTTP/1.0 200 OK\r\n\r\nok").await;
    let mut config = ProxyConfig::default();
    config.filtering.enable_blocklist = false;
    // Block everything; the flag must still win.
    let proxy = common::start_proxy(config, &["127.0.0.1"]).await;

    let mut client = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!("GET http://{}/ HTTP/1.1\r\n\r\n", origin);
    client.write_all(request.as_bytes()).await.unwrap();

    let response = read_to_end(&mut client).await;
    assert!(response.ends_with(b"ok"));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let proxy = common::start_proxy(ProxyConfig::default(), &[]).await;

    proxy.shutdown.trigger();
    settle().await;

    assert!(TcpStream::connect(proxy.addr).await.is_err());
}
