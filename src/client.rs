//! Client side of the door protocol, as the mobile app speaks it.
//!
//! Used by the `probe` binary and the integration tests.

use crate::protocols::door::handler::MAX_REQUEST_SIZE;
use crate::protocols::door::parser::{DEFAULT_DURATION, PUSH_BUTTON};
use crate::protocols::door::Response;
use bytes::Bytes;
use serde::Serialize;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Connect timeout the app uses.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Heartbeat line the app sends.
pub const HEARTBEAT: &[u8] = b"ARE_YOU_ALIVE_BRO\n";

/// JSON command sent to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub cmd: String,
    pub target: String,
    /// Button hold time in milliseconds.
    pub duration: u64,
}

impl Command {
    /// Door open command.
    pub fn push_button(target: &str, duration: Option<Duration>) -> Self {
        let duration = duration.unwrap_or(DEFAULT_DURATION);
        Command {
            cmd: PUSH_BUTTON.to_string(),
            target: target.to_string(),
            duration: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Serialized form, as written on the wire.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Payload for the legacy format.
pub fn legacy(endpoint: &str) -> Vec<u8> {
    format!("COMMAND:{endpoint}\n").into_bytes()
}

/// Send one request and collect whatever comes back before the server closes.
///
/// An empty result means the server answered with silence.
pub async fn send(addr: SocketAddr, payload: &[u8], timeout: Duration) -> io::Result<Bytes> {
    let mut stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;

    stream.write_all(payload).await?;
    stream.shutdown().await?;
    debug!(addr = %addr, bytes = payload.len(), "Request sent");

    // Unlike the app, read until close so multi-segment replies are not cut.
    let mut reply = Vec::with_capacity(MAX_REQUEST_SIZE);
    tokio::time::timeout(
        timeout,
        (&mut stream)
            .take(MAX_REQUEST_SIZE as u64)
            .read_to_end(&mut reply),
    )
    .await
    .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read timed out"))??;

    Ok(Bytes::from(reply))
}

/// Decode a JSON reply. Unknown fields are ignored.
pub fn parse_response(text: &str) -> Option<Response> {
    serde_json::from_str(text.trim()).ok()
}
