/*
[INPUT]:  Raw hub text frames (JSON, 0x1E-terminated)
[OUTPUT]: Parsed HubFrame values and TaskRequestCompleted events
[POS]:    WebSocket layer - hub protocol framing and parsing
[UPDATE]: When adding new message types or changing format
*/

use serde::Deserialize;
use serde_json::Value;

use crate::http::{Result, TaskdeskError};

/// Terminates every hub frame.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Hub method the backend invokes when a queued task request finishes.
pub const NOTIFY_TASK_REQUEST_ID: &str = "NotifyTaskRequestId";

const INVOCATION: u8 = 1;
const PING: u8 = 6;
const CLOSE: u8 = 7;

/// Parsed hub frame
#[derive(Debug, Clone, PartialEq)]
pub enum HubFrame {
    Invocation { target: String, arguments: Vec<Value> },
    Ping,
    Close { error: Option<String> },
    /// Stream items, completions and other frame types a listener ignores
    Other(u8),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Completion notice for a queued backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequestCompleted {
    /// Correlation id handed out when the request was queued
    pub id: String,
    /// Id of whatever the request produced
    pub result_id: String,
}

impl TaskRequestCompleted {
    /// Extract the event from a hub frame, if it is one.
    pub fn from_frame(frame: &HubFrame) -> Option<Self> {
        let HubFrame::Invocation { target, arguments } = frame else {
            return None;
        };
        if target != NOTIFY_TASK_REQUEST_ID {
            return None;
        }
        match arguments.as_slice() {
            [id, result_id, ..] => Some(Self {
                id: argument_string(id)?,
                result_id: argument_string(result_id)?,
            }),
            _ => None,
        }
    }
}

fn argument_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Handshake the client sends right after the socket opens
pub fn handshake_request() -> String {
    format!(r#"{{"protocol":"json","version":1}}{RECORD_SEPARATOR}"#)
}

/// Keep-alive frame
pub fn ping_frame() -> String {
    format!(r#"{{"type":{PING}}}{RECORD_SEPARATOR}"#)
}

/// Split a text message into its frames. One message may batch several.
pub fn split_frames(text: &str) -> impl Iterator<Item = &str> {
    text.split(RECORD_SEPARATOR)
        .map(str::trim)
        .filter(|frame| !frame.is_empty())
}

/// Parse one frame (without its separator)
pub fn parse_frame(raw: &str) -> Result<HubFrame> {
    let frame: RawFrame = serde_json::from_str(raw)?;
    Ok(match frame.kind {
        INVOCATION => HubFrame::Invocation {
            target: frame.target.ok_or_else(|| {
                TaskdeskError::Protocol("invocation frame without target".to_string())
            })?,
            arguments: frame.arguments,
        },
        PING => HubFrame::Ping,
        CLOSE => HubFrame::Close { error: frame.error },
        other => HubFrame::Other(other),
    })
}

/// Validate the server's handshake reply.
///
/// The hub may batch ordinary frames behind the handshake record; those are
/// returned so the caller can process them like any other message.
pub fn parse_handshake_response(text: &str) -> Result<&str> {
    let (raw, rest) = text.split_once(RECORD_SEPARATOR).unwrap_or((text, ""));
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TaskdeskError::Protocol("empty handshake response".to_string()));
    }
    let response: HandshakeResponse = serde_json::from_str(raw)?;
    match response.error {
        Some(error) => Err(TaskdeskError::Protocol(format!("handshake rejected: {error}"))),
        None => Ok(rest),
    }
}
