//! Shared record model for the sniffer workspace.
//!
//! A [`Record`] is one captured gRPC message as written by the capture
//! interceptor: one JSON object per line, with the field names used on the
//! wire kept verbatim so that filter expressions can refer to them directly.
//!
//! The crate also declares the fixed filter [`Schema`] those records are
//! checked against, and the borrowed [`FieldValue`] view that predicate
//! engines evaluate.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub mod display;
mod schema;

pub use schema::{FieldType, Schema};

/// Monotonic record identifier assigned by the capture side.
pub type RecordId = u64;

/// Direction of a captured message relative to the observed server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Outbound: the server sent this message.
    #[serde(rename = "send")]
    Send,
    /// Inbound: the server received this message.
    #[serde(rename = "recv")]
    Recv,
}

impl Direction {
    /// Returns the wire label for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Recv => "recv",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(Self::Send),
            "recv" => Ok(Self::Recv),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown direction label.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown direction: {0}")]
pub struct ParseDirectionError(pub String);

/// One captured RPC message.
///
/// Records are immutable once ingested; the inspector only ever hands out
/// shared references to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Strictly increasing identifier, never reused within a capture.
    pub message_id: RecordId,
    /// Present only for messages exchanged on a streaming RPC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<i64>,
    /// Whether the server sent or received the message.
    pub direction: Direction,
    /// RFC 3339 capture timestamp.
    pub time: String,
    /// Full gRPC method, e.g. `/helloworld.Greeter/SayHello`.
    pub method: String,
    /// Fully qualified protobuf message type name.
    pub message: String,
    /// Address of the remote peer.
    pub peer_address: String,
    /// Handler error, present only when the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The message body as JSON.
    #[serde(default)]
    pub content: Value,
}

impl Record {
    /// Looks up a schema field by name.
    ///
    /// Returns `None` when the name is not a record field or when an
    /// optional field is absent on this record.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "message_id" => Some(FieldValue::Number(Number::from(self.message_id))),
            "stream_id" => self.stream_id.map(|id| FieldValue::Number(Number::from(id))),
            "direction" => Some(FieldValue::Text(self.direction.as_str())),
            "time" => Some(FieldValue::Text(&self.time)),
            "method" => Some(FieldValue::Text(&self.method)),
            "message" => Some(FieldValue::Text(&self.message)),
            "peer_address" => Some(FieldValue::Text(&self.peer_address)),
            "error" => self.error.as_deref().map(FieldValue::Text),
            "content" => Some(FieldValue::Json(&self.content)),
            _ => None,
        }
    }
}

/// A borrowed view of a single field value.
///
/// Dynamic fields are handed out as raw [`FieldValue::Json`] so engines can
/// walk into them; [`FieldValue::from_json`] normalises scalars afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(Number),
    Bool(bool),
    Json(&'a Value),
}

impl<'a> FieldValue<'a> {
    /// Wraps a JSON value, unwrapping scalars.
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Number(n) => Self::Number(n.clone()),
            Value::Bool(b) => Self::Bool(*b),
            other => Self::Json(other),
        }
    }

    /// Renders the value the way it is displayed in the viewer.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => (*s).to_string(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Json(v) => v.to_string(),
        }
    }

    /// Returns the static type of the value.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::String,
            Self::Number(_) => FieldType::Number,
            Self::Bool(_) => FieldType::Boolean,
            Self::Json(_) => FieldType::Dynamic,
        }
    }
}
