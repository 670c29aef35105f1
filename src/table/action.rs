use serde::{Deserialize, Serialize};

use super::prelude::*;

/// A request for the authority to change the table.
///
/// Nothing here changes local state: the effect only becomes visible once a
/// later snapshot reflects it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ActionRequest {
    SetCardPos {
        card_id: CardId,
        x: i64,
        y: i64,
        z: i64,
    },
    Move {
        player_id: PlayerId,
        card_id: CardId,
        to: ZoneKind,
    },
    TapToggle {
        card_id: CardId,
    },
    Draw {
        player_id: PlayerId,
        n: u32,
    },
    PassTurn {},
    SetPhase {
        phase: Phase,
    },
    ShuffleLibrary {
        player_id: PlayerId,
    },
    Mulligan {
        player_id: PlayerId,
        n: u32,
    },
    ToggleShowHand {
        player_id: PlayerId,
    },
    ToggleShowTop {
        player_id: PlayerId,
    },
    Life {
        player_id: PlayerId,
        delta: i32,
    },
    Wins {
        player_id: PlayerId,
        delta: i32,
    },
    SwapZoneWithHand {
        player_id: PlayerId,
        zone: ZoneKind,
    },
    CreateToken {
        player_id: PlayerId,
        name: String,
        creature: bool,
        text: String,
    },
    UpdateToken {
        player_id: PlayerId,
        card_id: CardId,
        text: String,
    },
    RemoveToken {
        player_id: PlayerId,
        card_id: CardId,
    },
    PutOnBottom {
        player_id: PlayerId,
        card_id: CardId,
    },
}

impl ActionRequest {
    /// Positions travel as whole pixels.
    pub fn set_card_pos(card_id: CardId, pos: Position) -> Self {
        ActionRequest::SetCardPos {
            card_id,
            x: pos.x.round() as i64,
            y: pos.y.round() as i64,
            z: pos.z.round() as i64,
        }
    }
}

/// Sent once, right after the connection opens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hello {
    pub room_id: String,
    pub player_id: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck: Option<String>,
}

/// Every frame the client sends to the authority.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello(Hello),
    Action(ActionRequest),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_card_pos_rounds() {
        let action = ActionRequest::set_card_pos(CardId::new("c1"), Position::new(75.2, 74.5, 123_456.0));
        assert_eq!(
            action,
            ActionRequest::SetCardPos { card_id: CardId::new("c1"), x: 75, y: 75, z: 123_456 }
        );
    }

    #[test]
    fn test_action_wire_shape() {
        let action = ClientMessage::Action(ActionRequest::Move {
            player_id: PlayerId::B,
            card_id: CardId::new("c9"),
            to: ZoneKind::Battlefield,
        });
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({
                "kind": "action",
                "type": "move",
                "payload": {"player_id": "B", "card_id": "c9", "to": "battlefield"}
            })
        );
    }

    #[test]
    fn test_empty_payload_is_an_object() {
        let value = serde_json::to_value(ClientMessage::Action(ActionRequest::PassTurn {})).unwrap();
        assert_eq!(value, json!({"kind": "action", "type": "pass_turn", "payload": {}}));
    }

    #[test]
    fn test_phase_payload_uses_display_name() {
        let value = serde_json::to_value(ActionRequest::SetPhase { phase: Phase::SecondMain }).unwrap();
        assert_eq!(value, json!({"type": "set_phase", "payload": {"phase": "Second Main"}}));
    }

    #[test]
    fn test_hello_skips_missing_fields() {
        let hello = ClientMessage::Hello(Hello {
            room_id: "TEST".to_string(),
            player_id: PlayerId::A,
            name: None,
            deck: Some("mono-red".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&hello).unwrap(),
            json!({"kind": "hello", "room_id": "TEST", "player_id": "A", "deck": "mono-red"})
        );
    }
}
