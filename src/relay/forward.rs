//! One-shot request forwarding.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::http::ParsedRequest;

use super::upstream::connect_upstream;
use super::{write_all_timed, RELAY_CHUNK};

/// Send the rewritten request upstream and stream the response back.
///
/// Returns the number of response bytes relayed to the client. Any
/// resolution, connect or send failure aborts with zero bytes; a failure
/// partway through streaming leaves the client with a truncated body.
/// Both sockets close when this returns.
pub async fn forward(mut client: TcpStream, request: &ParsedRequest, window: Duration) -> u64 {
    let mut origin = match connect_upstream(&request.host, request.port, window).await {
        Ok(stream) => stream,
        Err(error) => {
            tracing::debug!(
                target_host = %request.host,
                port = request.port,
                %error,
                "Upstream connect failed"
            );
            return 0;
        }
    };

    if let Err(error) = write_all_timed(&mut origin, &request.raw, window).await {
        tracing::debug!(target_host = %request.host, %error, "Failed to send request upstream");
        return 0;
    }

    let mut total: u64 = 0;
    let mut chunk = [0u8; RELAY_CHUNK];
    loop {
        let n = match timeout(window, origin.read(&mut chunk)).await {
            Ok(Ok(n)) => n,
            Ok(Err(error)) => {
                tracing::debug!(target_host = %request.host, %error, "Upstream read failed");
                break;
            }
            Err(_) => {
                tracing::debug!(target_host = %request.host, "Upstream read timed out");
                break;
            }
        };
        if n == 0 {
            break;
        }
        if write_all_timed(&mut client, &chunk[..n], window).await.is_err() {
            break;
        }
        total += n as u64;
    }

    total
}
