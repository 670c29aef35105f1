use serde::Deserialize;

use super::prelude::*;

/// Every frame the authority may send.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    State { state: Snapshot },
    Ack {
        ok: bool,
        #[serde(default)]
        msg: Option<String>,
    },
}

/// Decodes one inbound frame and checks the snapshot invariants before it
/// reaches the renderer.
pub fn decode(frame: &str) -> Result<ServerMessage, ProtocolError> {
    let message: ServerMessage = serde_json::from_str(frame)?;
    if let ServerMessage::State { state } = &message {
        state.validate()?;
    }
    Ok(message)
}

pub fn encode(message: &ClientMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}
