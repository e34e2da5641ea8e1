//! Relay engine: one-shot forwarding and opaque tunneling.
//!
//! # Data Flow
//! ```text
//! forward:  client ── rewritten request ──▶ origin
//!           client ◀── response stream ──── origin   (until origin closes)
//!
//! tunnel:   client ◀──── raw bytes ───────▶ origin   (until either side
//!                                                     closes or idles out)
//! ```
//!
//! # Design Decisions
//! - Both operations take ownership of both sockets and close them on
//!   every exit path
//! - Origin failures are silent toward the client: no 502-style reply,
//!   the connection just closes with whatever was already relayed
//! - Every outbound write runs through [`write_all_timed`], so partial
//!   writes are never silently dropped

mod forward;
mod tunnel;
mod upstream;

pub use forward::forward;
pub use tunnel::tunnel;

use std::io;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Chunk size for relay copies.
pub(crate) const RELAY_CHUNK: usize = 4096;

/// Write the whole buffer before the window elapses.
///
/// Either every byte is written or a definite error comes back; a
/// stalled peer surfaces as [`io::ErrorKind::TimedOut`].
pub(crate) async fn write_all_timed<W>(
    writer: &mut W,
    buf: &[u8],
    window: Duration,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match timeout(window, writer.write_all(buf)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out")),
    }
}
