//! Door controller protocol.
//!
//! One request per connection, at most 1024 bytes of UTF-8 text:
//!
//! ```text
//! Request:  {"cmd": "PUSH_BUTTON", "target": "front", "duration": 5000}
//! Response: {"success": true, "message": "Front door opened successfully", "target": "front"}\n
//!
//! Request:  {"cmd": "LOCK", "target": "back"}
//! Response: {"success": false, "message": "Unknown command", "error": "Command 'LOCK' not recognized"}\n
//!
//! Request:  ARE_YOU_ALIVE_BRO
//! Response: ACK\n
//!
//! Request:  COMMAND:<endpoint>
//! Response: {"success": true, "message": "OK"}
//! ```
//!
//! Anything else gets no response. The server closes the connection after
//! every request.

pub mod handler;
pub mod parser;
pub mod response;

pub use handler::{handle_connection, HandlerError};
pub use parser::{parse, ProtocolError, Request};
pub use response::{Reply, Response};

use tracing::info;

/// Map trimmed request text to the reply for it.
pub fn interpret(input: &str) -> Result<Reply, ProtocolError> {
    let reply = match parse(input)? {
        Request::PushButton { target, duration } => {
            let millis = duration.as_millis();
            info!("Command: {}, Target: {target}, Duration: {millis}ms", parser::PUSH_BUTTON);
            info!("Simulating {target} door button press for {millis}ms...");
            Reply::Json(Response::opened(&target))
        }
        Request::Unrecognized {
            cmd,
            target,
            duration,
        } => {
            info!("Command: {cmd}, Target: {target}, Duration: {duration}ms");
            Reply::Json(Response::unknown_command(&cmd))
        }
        Request::Heartbeat => {
            info!("Heartbeat received - responding with ACK");
            Reply::Ack
        }
        Request::Legacy => {
            info!("Legacy command format detected");
            Reply::Legacy(Response::ok())
        }
        Request::Unparseable => {
            info!("Invalid JSON: {input}");
            Reply::Silent
        }
    };
    Ok(reply)
}
