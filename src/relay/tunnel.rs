//! Bidirectional CONNECT tunneling.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::http::{response, ParsedRequest};

use super::upstream::connect_upstream;
use super::{write_all_timed, RELAY_CHUNK};

/// Establish an opaque byte pipe between the client and the CONNECT target.
///
/// Once the origin connection is up, the client gets the synthetic
/// "connection established" reply and bytes are copied in both
/// directions until either side closes, a write fails, or the window
/// passes with no activity on either leg. Returns the total bytes moved
/// across both legs. Both sockets close when this returns.
pub async fn tunnel(mut client: TcpStream, request: &ParsedRequest, window: Duration) -> u64 {
    let mut origin = match connect_upstream(&request.host, request.port, window).await {
        Ok(stream) => stream,
        Err(error) => {
            tracing::debug!(
                target_host = %request.host,
                port = request.port,
                %error,
                "Tunnel connect failed"
            );
            return 0;
        }
    };

    // A client that never saw this reply fails on the first relay pass.
    let _ = write_all_timed(&mut client, response::CONNECTION_ESTABLISHED, window).await;

    let (mut client_rd, mut client_wr) = client.split();
    let (mut origin_rd, mut origin_wr) = origin.split();

    let mut total: u64 = 0;
    let mut from_client = [0u8; RELAY_CHUNK];
    let mut from_origin = [0u8; RELAY_CHUNK];

    loop {
        // The window re-arms every pass: any byte on either leg keeps
        // the tunnel alive.
        tokio::select! {
            read = client_rd.read(&mut from_client) => match read {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if write_all_timed(&mut origin_wr, &from_client[..n], window).await.is_err() {
                        break;
                    }
                    total += n as u64;
                }
            },
            read = origin_rd.read(&mut from_origin) => match read {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if write_all_timed(&mut client_wr, &from_origin[..n], window).await.is_err() {
                        break;
                    }
                    total += n as u64;
                }
            },
            _ = sleep(window) => {
                tracing::debug!(target_host = %request.host, "Tunnel idle timeout");
                break;
            }
        }
    }

    total
}
