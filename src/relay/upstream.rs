//! Origin connection establishment.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

/// Resolve `host:port` and connect to the first IPv4 address.
///
/// Resolution and connect each run under `window`. There is no retry
/// and no fallback across addresses.
pub(crate) async fn connect_upstream(
    host: &str,
    port: u16,
    window: Duration,
) -> io::Result<TcpStream> {
    let mut addrs = timeout(window, lookup_host((host, port)))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "resolution timed out"))??;

    let addr: SocketAddr = addrs
        .find(|addr| addr.is_ipv4())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no IPv4 address for host"))?;

    timeout(window, TcpStream::connect(addr))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))?
}
