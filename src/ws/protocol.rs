//! Relay protocol message definitions
//! These are the wire types shared by the relay and every peer (projector or controller).
//! Every frame is `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Connection identity issued by the relay
pub type PeerId = Uuid;

/// Normalized pointer position, both axes in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Messages sent from a peer to the relay.
///
/// The relay only builds these through [`ClientMsg::parse`], so on that side a value has already
/// passed payload validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Set or change the sender's display name
    SetName { name: String },
    /// Continuous cursor update
    Aim(Point),
    /// Discrete slash at the current cursor
    Slash(Point),
}

/// Messages fanned out by the relay to all peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// A peer set its display name
    Join { id: PeerId, name: String },
    /// A peer moved its cursor
    Aim(PeerPointer),
    /// A peer slashed
    Slash(PeerPointer),
    /// A peer disconnected
    Leave { id: PeerId },
}

/// Pointer event stamped with the sender's identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerPointer {
    pub id: PeerId,
    pub x: f64,
    pub y: f64,
    /// Stored display name, empty when none was set
    pub name: String,
}

/// First event on the event-stream transport, telling the peer where to post its frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: PeerId,
}

/// Raw inbound frame before payload validation
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Why an inbound frame was discarded
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("missing or mistyped field: {0}")]
    MissingField(&'static str),
}

impl ClientMsg {
    /// Parse and validate an inbound text frame.
    ///
    /// `setName` needs a string `name`; `aim`/`slash` need numeric `x` and `y`. Emptiness of the
    /// name is a relay decision, not a protocol one.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        match envelope.event.as_str() {
            "setName" => {
                let name = envelope
                    .data
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or(ProtocolError::MissingField("name"))?;
                Ok(Self::SetName {
                    name: name.to_string(),
                })
            }
            "aim" => point(&envelope.data).map(Self::Aim),
            "slash" => point(&envelope.data).map(Self::Slash),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

fn point(data: &Value) -> Result<Point, ProtocolError> {
    let x = data
        .get("x")
        .and_then(Value::as_f64)
        .ok_or(ProtocolError::MissingField("x"))?;
    let y = data
        .get("y")
        .and_then(Value::as_f64)
        .ok_or(ProtocolError::MissingField("y"))?;
    Ok(Point { x, y })
}

impl ServerMsg {
    /// The peer this event is about
    pub fn peer_id(&self) -> PeerId {
        match self {
            ServerMsg::Join { id, .. } | ServerMsg::Leave { id } => *id,
            ServerMsg::Aim(p) | ServerMsg::Slash(p) => p.id,
        }
    }
}
