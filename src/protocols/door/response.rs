//! Door protocol responses and their wire encoding.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::io;

/// Response body returned to the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Door opened.
    pub fn opened(target: &str) -> Self {
        Response {
            success: true,
            message: format!("{} door opened successfully", capitalize(target)),
            target: Some(target.to_string()),
            error: None,
        }
    }

    /// Command not recognized.
    pub fn unknown_command(cmd: &str) -> Self {
        Response {
            success: false,
            message: "Unknown command".to_string(),
            target: None,
            error: Some(format!("Command '{cmd}' not recognized")),
        }
    }

    /// Acknowledgement for the legacy `COMMAND:` format.
    pub fn ok() -> Self {
        Response {
            success: true,
            message: "OK".to_string(),
            target: None,
            error: None,
        }
    }
}

/// What goes back on the wire for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// JSON document terminated by `\n`.
    Json(Response),
    /// The literal `ACK\n`.
    Ack,
    /// JSON document with no line terminator. Older clients read until close.
    Legacy(Response),
    /// Nothing is written.
    Silent,
}

impl Reply {
    /// Encode the reply, or `None` when nothing should be written.
    pub fn encode(&self) -> Option<Bytes> {
        match self {
            Reply::Json(response) => {
                let mut buf = encode_json(response);
                buf.put_u8(b'\n');
                Some(buf.freeze())
            }
            Reply::Ack => Some(Bytes::from_static(b"ACK\n")),
            Reply::Legacy(response) => Some(encode_json(response).freeze()),
            Reply::Silent => None,
        }
    }
}

fn encode_json(response: &Response) -> BytesMut {
    let mut writer = BytesMut::with_capacity(128).writer();
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, SpacedAsciiFormatter);
    if let Err(e) = response.serialize(&mut serializer) {
        tracing::error!(error = %e, "Failed to encode response");
    }
    writer.into_inner()
}

/// Single-line JSON with `", "` and `": "` separators and every character
/// outside printable ASCII escaped as `\uXXXX`, byte for byte what the board
/// sends.
struct SpacedAsciiFormatter;

impl serde_json::ser::Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.bytes().all(|b| (b' '..=b'~').contains(&b)) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
