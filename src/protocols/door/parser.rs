//! Door protocol parser.

use serde_json::{Map, Value};
use std::time::Duration;

/// Command name that triggers a simulated button press.
pub const PUSH_BUTTON: &str = "PUSH_BUTTON";

/// Prefix of the heartbeat probe (the app sends `ARE_YOU_ALIVE_BRO`).
pub const HEARTBEAT_PREFIX: &str = "ARE_YOU_ALIVE";

/// Prefix of the pre-JSON command format.
pub const LEGACY_PREFIX: &str = "COMMAND:";

/// Button hold time used when a command carries no usable `duration`.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

/// Parsed request, decided once per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `PUSH_BUTTON` with a target door.
    PushButton { target: String, duration: Duration },
    /// A JSON command whose `cmd` is not recognized. Fields are rendered
    /// as text for the reply and the log.
    Unrecognized {
        cmd: String,
        target: String,
        duration: String,
    },
    /// Liveness probe.
    Heartbeat,
    /// `COMMAND:<endpoint>` from older clients.
    Legacy,
    /// Neither JSON nor a known prefix.
    Unparseable,
}

/// Input that parses but cannot be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Valid JSON whose top level is not an object.
    NotAnObject,
    /// `PUSH_BUTTON` without a target.
    MissingTarget,
    /// `PUSH_BUTTON` with a target that is not a string.
    InvalidTarget,
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::NotAnObject => write!(f, "command is not a JSON object"),
            ProtocolError::MissingTarget => write!(f, "{PUSH_BUTTON} command has no target"),
            ProtocolError::InvalidTarget => write!(f, "{PUSH_BUTTON} target is not a string"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Parse trimmed request text.
///
/// JSON is tried first. The legacy prefixes are only considered when the
/// text is not JSON at all.
pub fn parse(input: &str) -> Result<Request, ProtocolError> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(fields)) => parse_command(&fields),
        Ok(_) => Err(ProtocolError::NotAnObject),
        Err(_) if input.starts_with(HEARTBEAT_PREFIX) => Ok(Request::Heartbeat),
        Err(_) if input.starts_with(LEGACY_PREFIX) => Ok(Request::Legacy),
        Err(_) => Ok(Request::Unparseable),
    }
}

fn parse_command(fields: &Map<String, Value>) -> Result<Request, ProtocolError> {
    let cmd = fields.get("cmd").unwrap_or(&Value::Null);

    if cmd.as_str() != Some(PUSH_BUTTON) {
        return Ok(Request::Unrecognized {
            cmd: display_value(cmd),
            target: fields
                .get("target")
                .map_or_else(|| "None".to_string(), display_value),
            duration: fields
                .get("duration")
                .map_or_else(|| DEFAULT_DURATION.as_millis().to_string(), display_value),
        });
    }

    let target = match fields.get("target") {
        None | Some(Value::Null) => return Err(ProtocolError::MissingTarget),
        Some(Value::String(target)) => target.clone(),
        Some(_) => return Err(ProtocolError::InvalidTarget),
    };

    let duration = fields
        .get("duration")
        .and_then(Value::as_u64)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DURATION);

    Ok(Request::PushButton { target, duration })
}

/// Render a JSON value the way the board's messages print it: strings bare,
/// containers in literal form with single-quoted strings.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => {
            let mut out = String::new();
            write_literal(&mut out, other);
            out
        }
    }
}

fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_quoted(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            out.push('{');
            for (i, (key, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(out, key);
                out.push_str(": ");
                write_literal(out, item);
            }
            out.push('}');
        }
    }
}

/// Single quotes, unless the text holds a single quote and no double quote.
fn write_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_button() {
        let request = parse(r#"{"cmd":"PUSH_BUTTON","target":"front","duration":1500}"#).unwrap();
        assert_eq!(
            request,
            Request::PushButton {
                target: "front".to_string(),
                duration: Duration::from_millis(1500),
            }
        );
    }

    #[test]
    fn test_duration_defaults() {
        for input in [
            r#"{"cmd":"PUSH_BUTTON","target":"suite"}"#,
            r#"{"cmd":"PUSH_BUTTON","target":"suite","duration":"long"}"#,
            r#"{"cmd":"PUSH_BUTTON","target":"suite","duration":-3}"#,
        ] {
            match parse(input) {
                Ok(Request::PushButton { duration, .. }) => {
                    assert_eq!(duration, DEFAULT_DURATION, "input: {input}")
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse(r#"{"cmd":"LOCK","target":"back"}"#),
            Ok(Request::Unrecognized {
                cmd: "LOCK".to_string(),
                target: "back".to_string(),
                duration: "5000".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_command_keeps_raw_fields() {
        match parse(r#"{"cmd":"LOCK","duration":"soon"}"#) {
            Ok(Request::Unrecognized {
                target, duration, ..
            }) => {
                assert_eq!(target, "None");
                assert_eq!(duration, "soon");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_container_commands_render_as_literals() {
        let cmd_of = |input: &str| match parse(input) {
            Ok(Request::Unrecognized { cmd, .. }) => cmd,
            other => panic!("unexpected: {:?}", other),
        };

        assert_eq!(cmd_of(r#"{"cmd":{"a":"b"}}"#), "{'a': 'b'}");
        assert_eq!(cmd_of(r#"{"cmd":{"z":1,"a":[true,null]}}"#), "{'z': 1, 'a': [True, None]}");
        assert_eq!(cmd_of(r#"{"cmd":["it's"]}"#), r#"["it's"]"#);
        assert_eq!(cmd_of(r#"{"cmd":["a\nb"]}"#), r"['a\nb']");
        assert_eq!(cmd_of(r#"{"cmd":["tab\there"]}"#), r"['tab\there']");
        assert_eq!(cmd_of(r#"{"cmd":["c:\\dir"]}"#), r"['c:\\dir']");
    }

    #[test]
    fn test_unknown_command_rendering() {
        let cmd_of = |input: &str| match parse(input) {
            Ok(Request::Unrecognized { cmd, .. }) => cmd,
            other => panic!("unexpected: {:?}", other),
        };

        assert_eq!(cmd_of(r#"{"target":"front"}"#), "None");
        assert_eq!(cmd_of(r#"{"cmd":null}"#), "None");
        assert_eq!(cmd_of(r#"{"cmd":true}"#), "True");
        assert_eq!(cmd_of(r#"{"cmd":42}"#), "42");
        assert_eq!(cmd_of(r#"{"cmd":"push_button"}"#), "push_button");
    }

    #[test]
    fn test_push_button_target_faults() {
        assert_eq!(
            parse(r#"{"cmd":"PUSH_BUTTON"}"#),
            Err(ProtocolError::MissingTarget)
        );
        assert_eq!(
            parse(r#"{"cmd":"PUSH_BUTTON","target":null}"#),
            Err(ProtocolError::MissingTarget)
        );
        assert_eq!(
            parse(r#"{"cmd":"PUSH_BUTTON","target":7}"#),
            Err(ProtocolError::InvalidTarget)
        );
    }

    #[test]
    fn test_json_that_is_not_an_object() {
        assert_eq!(parse("5"), Err(ProtocolError::NotAnObject));
        assert_eq!(parse(r#"["cmd"]"#), Err(ProtocolError::NotAnObject));
        assert_eq!(parse(r#""ARE_YOU_ALIVE""#), Err(ProtocolError::NotAnObject));
    }

    #[test]
    fn test_legacy_prefixes() {
        assert_eq!(parse("ARE_YOU_ALIVE"), Ok(Request::Heartbeat));
        assert_eq!(parse("ARE_YOU_ALIVE_BRO"), Ok(Request::Heartbeat));
        assert_eq!(parse("COMMAND:open"), Ok(Request::Legacy));
        assert_eq!(parse("COMMAND:"), Ok(Request::Legacy));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse(""), Ok(Request::Unparseable));
        assert_eq!(parse("hello"), Ok(Request::Unparseable));
        assert_eq!(parse("are_you_alive"), Ok(Request::Unparseable));
        assert_eq!(parse(r#"{"cmd":"PUSH_BUTTON""#), Ok(Request::Unparseable));
    }
}
