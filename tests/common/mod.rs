//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use forward_proxy::blocklist::Blocklist;
use forward_proxy::config::ProxyConfig;
use forward_proxy::lifecycle::Shutdown;
use forward_proxy::net::listener::Listener;
use forward_proxy::observability::{AccessLog, ProxyMetrics};
use forward_proxy::server::{ProxyContext, ProxyServer};

/// Start a mock origin that reads one request and answers with a fixed
/// response, then closes.
pub async fn start_mock_origin(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut request = [0u8; 4096];
                        let _ = socket.read(&mut request).await;
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start an origin that echoes every byte back, for tunnel tests.
#[allow(dead_code)]
pub async fn start_echo_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A proxy running on an ephemeral port, plus handles to its collaborators.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub metrics: Arc<ProxyMetrics>,
    pub shutdown: Arc<Shutdown>,
}

/// Start a proxy with the given config and blocklist rules.
pub async fn start_proxy(mut config: ProxyConfig, rules: &[&str]) -> TestProxy {
    config.listener.bind_address = "127.0.0.1".to_string();
    config.listener.port = 0;

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let metrics = Arc::new(ProxyMetrics::in_memory());
    let shutdown = Arc::new(Shutdown::new());

    let server = ProxyServer::new(ProxyContext {
        config,
        blocklist: Arc::new(Blocklist::from_rules(rules.iter().copied())),
        access_log: Arc::new(AccessLog::disabled()),
        metrics: Arc::clone(&metrics),
    });

    let server_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        metrics,
        shutdown,
    }
}
