//! Door protocol handler for the Tokio runtime.

use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::parser::ProtocolError;

/// Largest request accepted, read in a single call.
pub const MAX_REQUEST_SIZE: usize = 1024;

/// Fault while serving one connection. Never escapes the handler.
#[derive(Debug)]
pub enum HandlerError {
    Io(std::io::Error),
    Decode(std::str::Utf8Error),
    Protocol(ProtocolError),
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerError::Io(e) => write!(f, "I/O error: {e}"),
            HandlerError::Decode(e) => write!(f, "request is not valid UTF-8: {e}"),
            HandlerError::Protocol(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Io(e) => Some(e),
            HandlerError::Decode(e) => Some(e),
            HandlerError::Protocol(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(e: std::io::Error) -> Self {
        HandlerError::Io(e)
    }
}

impl From<std::str::Utf8Error> for HandlerError {
    fn from(e: std::str::Utf8Error) -> Self {
        HandlerError::Decode(e)
    }
}

impl From<ProtocolError> for HandlerError {
    fn from(e: ProtocolError) -> Self {
        HandlerError::Protocol(e)
    }
}

/// Handle a door protocol connection.
///
/// Reads one request, answers it and closes the stream. Faults are logged
/// and swallowed; the stream is closed on every path.
pub async fn handle_connection<S>(mut stream: S, peer: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("New connection from {peer}");

    if let Err(e) = serve_request(&mut stream).await {
        warn!("Error handling client: {e}");
    }

    if let Err(e) = stream.shutdown().await {
        debug!(peer = %peer, error = %e, "Shutdown failed");
    }
    drop(stream);
    info!("Connection closed for {peer}");
}

async fn serve_request<S>(stream: &mut S) -> Result<(), HandlerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // A single read: requests larger than one segment are cut short.
    let mut buf = [0u8; MAX_REQUEST_SIZE];
    let n = stream.read(&mut buf).await?;

    let data = std::str::from_utf8(&buf[..n])?.trim();
    info!("Received: {data}");

    let reply = super::interpret(data)?;

    if let Some(bytes) = reply.encode() {
        stream.write_all(&bytes).await?;
        stream.flush().await?;
        info!("Sent response: {}", String::from_utf8_lossy(&bytes).trim_end());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    fn peer() -> SocketAddr {
        "192.168.1.20:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_push_button_reply() {
        let stream = Builder::new()
            .read(br#"{"cmd":"PUSH_BUTTON","target":"front"}"#)
            .write(b"{\"success\": true, \"message\": \"Front door opened successfully\", \"target\": \"front\"}\n")
            .build();

        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_whitespace_is_trimmed() {
        let stream = Builder::new()
            .read(b"  ARE_YOU_ALIVE_BRO\r\n")
            .write(b"ACK\n")
            .build();

        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_legacy_reply_has_no_newline() {
        let stream = Builder::new()
            .read(b"COMMAND:apartment\n")
            .write(b"{\"success\": true, \"message\": \"OK\"}")
            .build();

        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        // The mock panics on any write it was not told to expect.
        let stream = Builder::new().read(b"hello there\n").build();
        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_empty_read_writes_nothing() {
        let stream = Builder::new().build();
        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_missing_target_writes_nothing() {
        let stream = Builder::new().read(br#"{"cmd":"PUSH_BUTTON"}"#).build();
        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_invalid_utf8_writes_nothing() {
        let stream = Builder::new().read(&[0xff, 0xfe, b'A']).build();
        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_read_error_is_absorbed() {
        let stream = Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset by peer",
            ))
            .build();
        handle_connection(stream, peer()).await;
    }

    #[tokio::test]
    async fn test_only_one_read_is_made() {
        let mut stream = Builder::new()
            .read(br#"{"cmd":"LOCK","#)
            .read(br#""target":"back"}"#)
            .build();

        // The first segment alone is not JSON and carries no known prefix.
        serve_request(&mut stream).await.unwrap();

        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, br#""target":"back"}"#);
    }

    #[test]
    fn test_error_display() {
        let err = HandlerError::from(ProtocolError::MissingTarget);
        assert_eq!(err.to_string(), "PUSH_BUTTON command has no target");
    }
}
