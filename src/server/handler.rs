//! Per-connection orchestration.
//!
//! One execution per task: apply the timeout budget, parse, consult the
//! blocklist, pick the relay protocol, and emit the outcome to the
//! access log and metrics. The relay operations own and close both
//! sockets, so nothing here touches a socket after handing it off.

use std::time::Duration;

use tokio::time::Instant;

use crate::http::{parser, response};
use crate::net::task::Task;
use crate::relay;

use super::ProxyContext;

/// How a connection ended, as recorded in the access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Failed,
    Blocked,
    Allowed,
}

impl Disposition {
    fn as_str(self) -> &'static str {
        match self {
            Disposition::Failed => "FAILED",
            Disposition::Blocked => "BLOCKED",
            Disposition::Allowed => "ALLOWED",
        }
    }
}

/// Handle one accepted client connection end to end.
pub async fn handle_connection(task: Task, context: &ProxyContext) {
    let Task {
        mut stream,
        peer,
        id,
    } = task;
    let window = Duration::from_secs(context.config.timeouts.connection_secs);
    let deadline = Instant::now() + window;

    let request = match parser::parse_request(&mut stream, deadline).await {
        Ok(request) => request,
        Err(error) => {
            tracing::debug!(%id, %peer, %error, "Request parse failed");
            let _ = relay::write_all_timed(&mut stream, &response::bad_request(), window).await;
            context.metrics.record_blocked();
            context.access_log.log(&format!(
                "{} | \"INVALID REQUEST\" | - | {} | 400 | bytes=0",
                peer,
                Disposition::Failed.as_str(),
            ));
            return;
        }
    };

    context.metrics.record_request(&request.host);

    let request_line = request.request_line();
    let target = request.target();

    if context.config.filtering.enable_blocklist && context.blocklist.is_blocked(&request.host) {
        tracing::info!(%id, %peer, host = %request.host, "Request blocked");
        let _ = relay::write_all_timed(&mut stream, &response::blocked(), window).await;
        context.metrics.record_blocked();
        context.access_log.log(&format!(
            "{} | \"{}\" | {} | {} | 403 | bytes=0",
            peer,
            request_line,
            target,
            Disposition::Blocked.as_str(),
        ));
        return;
    }

    let bytes = if request.method == "CONNECT" {
        if !context.config.filtering.enable_https_tunnel {
            tracing::info!(%id, %peer, host = %request.host, "CONNECT refused, tunneling disabled");
            let _ =
                relay::write_all_timed(&mut stream, &response::tunnel_disabled(), window).await;
            context.metrics.record_blocked();
            context.access_log.log(&format!(
                "{} | \"{}\" | {} | {} | 403 | bytes=0",
                peer,
                request_line,
                target,
                Disposition::Blocked.as_str(),
            ));
            return;
        }
        relay::tunnel(stream, &request, window).await
    } else {
        relay::forward(stream, &request, window).await
    };

    context.metrics.record_allowed(bytes);
    context.access_log.log(&format!(
        "{} | \"{}\" | {} | {} | 200 | bytes={}",
        peer,
        request_line,
        target,
        Disposition::Allowed.as_str(),
        bytes,
    ));
    tracing::debug!(%id, %peer, target = %target, bytes, "Connection handled");
}
