use std::collections::VecDeque;
use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::client::render::{render, side_owner, BoardView, ZoneSlot};
use crate::table::placement::{compute_chip_drop, compute_drop, DropRequest};
use crate::table::prelude::*;
use crate::table::scale::ScaleController;

/// What a drag carries from its source to the drop target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    pub card_id: CardId,
    pub owner: PlayerId,
}

impl DragPayload {
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Foreign or damaged drag data simply does not parse.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// A zone that accepted a drop, with its rectangle in board pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropTarget {
    pub slot: ZoneSlot,
    pub rect: ZoneRect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DropIntent {
    pub payload: String,
    pub target: DropTarget,
    pub pointer_x: f64,
    pub pointer_y: f64,
    pub shift: bool,
}

/// Something the user asked for, already resolved against the screen.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Drop(DropIntent),
    TapToggle(CardId),
    Draw,
    PassTurn,
    NextPhase,
    Shuffle,
    Mulligan,
    ToggleShowHand,
    ToggleShowTop,
    Life(i32),
    Wins(i32),
    SwapWithHand(ZoneKind),
    CreateToken { name: String, creature: bool, text: String },
    UpdateToken { card_id: CardId, text: String },
    RemoveToken(CardId),
    PutOnBottom(CardId),
    SetScale(Side, i32),
    NudgeScale(Side, i32),
}

/// Inputs of the session loop, handled strictly one at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Snapshot(Snapshot),
    Intent(Intent),
    WindowResized(Vec<(Side, Container, f64)>),
    ContainerResized(Side, Container, f64),
    Settle(Instant),
    Tick(Instant),
}

pub const MULLIGAN_HAND_SIZE: u32 = 7;

/// Owns everything the view is derived from: the latest snapshot, who is
/// looking, and the zoom. Requests for the authority queue up in the outbox.
pub struct Session {
    viewer: PlayerId,
    snapshot: Option<Snapshot>,
    scale: ScaleController,
    outbox: VecDeque<ActionRequest>,
}

impl Session {
    pub fn new(viewer: PlayerId) -> Self {
        Self {
            viewer,
            snapshot: None,
            scale: ScaleController::new(),
            outbox: VecDeque::new(),
        }
    }

    pub fn viewer(&self) -> PlayerId {
        self.viewer
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn scale(&self) -> &ScaleController {
        &self.scale
    }

    pub fn board(&self) -> Option<BoardView> {
        self.snapshot.as_ref().map(|snapshot| render(snapshot, self.viewer))
    }

    /// Requests produced so far, oldest first.
    pub fn take_outbox(&mut self) -> Vec<ActionRequest> {
        self.outbox.drain(..).collect()
    }

    pub fn dispatch(&mut self, message: Message) {
        match message {
            Message::Snapshot(snapshot) => {
                debug!("Replacing snapshot (turn {}, phase {})", snapshot.turn, snapshot.phase);
                self.snapshot = Some(snapshot);
            }
            Message::Intent(intent) => self.handle_intent(intent),
            Message::WindowResized(sizes) => self.scale.window_resized(sizes),
            Message::ContainerResized(side, container, height) => {
                self.scale.container_resized(side, container, height)
            }
            Message::Settle(now) => self.scale.begin_settle(now),
            Message::Tick(now) => {
                self.scale.tick(now);
            }
        }
    }

    fn handle_intent(&mut self, intent: Intent) {
        let me = self.viewer;
        let action = match intent {
            Intent::Drop(drop) => return self.handle_drop(drop),
            Intent::SetScale(side, pct) => {
                self.scale.set_percent(side, pct);
                return;
            }
            Intent::NudgeScale(side, delta) => {
                self.scale.nudge_percent(side, delta);
                return;
            }
            Intent::NextPhase => {
                let Some(snapshot) = &self.snapshot else {
                    return;
                };
                ActionRequest::SetPhase { phase: snapshot.phase.next() }
            }
            Intent::TapToggle(card_id) => ActionRequest::TapToggle { card_id },
            Intent::Draw => ActionRequest::Draw { player_id: me, n: 1 },
            Intent::PassTurn => ActionRequest::PassTurn {},
            Intent::Shuffle => ActionRequest::ShuffleLibrary { player_id: me },
            Intent::Mulligan => ActionRequest::Mulligan { player_id: me, n: MULLIGAN_HAND_SIZE },
            Intent::ToggleShowHand => ActionRequest::ToggleShowHand { player_id: me },
            Intent::ToggleShowTop => ActionRequest::ToggleShowTop { player_id: me },
            Intent::Life(delta) => ActionRequest::Life { player_id: me, delta },
            Intent::Wins(delta) => ActionRequest::Wins { player_id: me, delta },
            Intent::SwapWithHand(zone) => ActionRequest::SwapZoneWithHand { player_id: me, zone },
            Intent::CreateToken { name, creature, text } => ActionRequest::CreateToken {
                player_id: me,
                name,
                creature,
                text,
            },
            Intent::UpdateToken { card_id, text } => ActionRequest::UpdateToken {
                player_id: me,
                card_id,
                text,
            },
            Intent::RemoveToken(card_id) => ActionRequest::RemoveToken { player_id: me, card_id },
            Intent::PutOnBottom(card_id) => ActionRequest::PutOnBottom { player_id: me, card_id },
        };
        self.outbox.push_back(action);
    }

    /// Turns a drop into a move (when the card changes zone) followed by a
    /// position request (when it lands on a battlefield).
    fn handle_drop(&mut self, drop: DropIntent) {
        let Some(payload) = DragPayload::parse(&drop.payload) else {
            debug!("Ignoring drop with unrecognized payload");
            return;
        };
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let Some(card) = snapshot.card(&payload.card_id) else {
            debug!("Ignoring drop of unknown card {}", payload.card_id);
            return;
        };
        // The card changed hands since the drag started
        let from = snapshot.locate(&payload.card_id).map(|(owner, _)| owner);
        if from != Some(payload.owner) {
            debug!("Ignoring drop of {} dragged as {}'s card", payload.card_id, payload.owner);
            return;
        }

        let slot = drop.target.slot;
        let owner = side_owner(self.viewer, slot.side);
        if snapshot.locate(&payload.card_id) != Some((owner, slot.kind)) {
            info!("Moving {} to {owner} {}", payload.card_id, slot.kind);
            self.outbox.push_back(ActionRequest::Move {
                player_id: owner,
                card_id: payload.card_id.clone(),
                to: slot.kind,
            });
        }
        if slot.kind != ZoneKind::Battlefield {
            return;
        }

        let pos = if card.is_chip() {
            compute_chip_drop(drop.target.rect, drop.pointer_x, drop.pointer_y)
        } else {
            let placed = snapshot.placed_cards(owner);
            let request = DropRequest {
                zone: drop.target.rect,
                card_height: self.scale.card_height(slot.side, Container::Battlefield),
                pointer_x: drop.pointer_x,
                pointer_y: drop.pointer_y,
                card_id: &payload.card_id,
                card_name: &card.name,
                shift: drop.shift,
            };
            compute_drop(&request, &placed)
        };
        debug!("Placing {} at ({}, {})", payload.card_id, pos.x, pos.y);
        self.outbox.push_back(ActionRequest::set_card_pos(payload.card_id, pos));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::table::placement::STACK_STEP_PX;
    use crate::table::snapshot::fixtures::*;

    const FIELD: ZoneRect = ZoneRect { left: 0.0, top: 0.0, width: 400.0, height: 300.0 };

    fn session_with(snapshot: Snapshot) -> Session {
        let mut session = Session::new(PlayerId::A);
        // Battlefield tall enough that full zoom gives 140px cards
        session.dispatch(Message::WindowResized(vec![
            (Side::Own, Container::Battlefield, 152.0),
            (Side::Opponent, Container::Battlefield, 152.0),
        ]));
        session.dispatch(Message::Snapshot(snapshot));
        session
    }

    fn drop_on(slot: ZoneSlot, card: &str, owner: PlayerId, pointer: (f64, f64)) -> Message {
        Message::Intent(Intent::Drop(DropIntent {
            payload: DragPayload { card_id: CardId::new(card), owner }.encode(),
            target: DropTarget { slot, rect: FIELD },
            pointer_x: pointer.0,
            pointer_y: pointer.1,
            shift: false,
        }))
    }

    const OWN_FIELD: ZoneSlot = ZoneSlot::new(Side::Own, ZoneKind::Battlefield);

    #[test]
    fn test_drop_from_hand_moves_then_places() {
        let mut snapshot = empty_snapshot();
        put(&mut snapshot, PlayerId::A, ZoneKind::Hand, "c1", card("Bear"));
        let mut session = session_with(snapshot);
        session.dispatch(drop_on(OWN_FIELD, "c1", PlayerId::A, (390.0, 290.0)));

        let actions = session.take_outbox();
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[0],
            ActionRequest::Move {
                player_id: PlayerId::A,
                card_id: CardId::new("c1"),
                to: ZoneKind::Battlefield,
            }
        );
        let ActionRequest::SetCardPos { x, y, z, .. } = &actions[1] else {
            panic!("expected a position request");
        };
        assert_eq!((*x, *y), (300, 160));
        assert!((0..1_000_000).contains(z));
        // Requests never touch the local snapshot
        assert_eq!(session.snapshot().unwrap().players.a.hand.len(), 1);
    }

    #[test]
    fn test_drop_within_battlefield_only_places() {
        let mut snapshot = empty_snapshot();
        let mut bear = card("Bear");
        bear.pos = Some(Position::new(10.0, 10.0, 1.0));
        put(&mut snapshot, PlayerId::A, ZoneKind::Battlefield, "c1", bear);
        let mut session = session_with(snapshot);
        session.dispatch(drop_on(OWN_FIELD, "c1", PlayerId::A, (200.0, 150.0)));

        let actions = session.take_outbox();
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], ActionRequest::SetCardPos { x: 150, y: 80, .. }));
    }

    #[test]
    fn test_drop_stacks_same_name() {
        let mut snapshot = empty_snapshot();
        for (id, at) in [("b1", 50.0), ("b2", 62.0)] {
            let mut bear = card("Bear");
            bear.pos = Some(Position::new(at, at, 1.0));
            put(&mut snapshot, PlayerId::A, ZoneKind::Battlefield, id, bear);
        }
        put(&mut snapshot, PlayerId::A, ZoneKind::Hand, "b3", card("Bear"));
        let mut session = session_with(snapshot);
        session.dispatch(drop_on(OWN_FIELD, "b3", PlayerId::A, (105.0, 125.0)));

        let actions = session.take_outbox();
        let expected = (50.0 + 2.0 * STACK_STEP_PX).round() as i64;
        assert!(matches!(
            &actions[1],
            ActionRequest::SetCardPos { x, y, .. } if *x == expected && *y == expected
        ));
    }

    #[test]
    fn test_drop_on_pile_only_moves() {
        let mut snapshot = empty_snapshot();
        put(&mut snapshot, PlayerId::A, ZoneKind::Hand, "c1", card("Bear"));
        let mut session = session_with(snapshot);
        let graveyard = ZoneSlot::new(Side::Own, ZoneKind::Graveyard);
        session.dispatch(drop_on(graveyard, "c1", PlayerId::A, (1.0, 1.0)));

        assert_eq!(
            session.take_outbox(),
            vec![ActionRequest::Move {
                player_id: PlayerId::A,
                card_id: CardId::new("c1"),
                to: ZoneKind::Graveyard,
            }]
        );
    }

    #[test]
    fn test_drop_on_opponent_side_targets_opponent() {
        let mut snapshot = empty_snapshot();
        put(&mut snapshot, PlayerId::A, ZoneKind::Battlefield, "c1", card("Bear"));
        let mut session = session_with(snapshot);
        let theirs = ZoneSlot::new(Side::Opponent, ZoneKind::Battlefield);
        session.dispatch(drop_on(theirs, "c1", PlayerId::A, (200.0, 150.0)));

        let actions = session.take_outbox();
        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], ActionRequest::Move { player_id: PlayerId::B, .. }));
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        let mut snapshot = empty_snapshot();
        put(&mut snapshot, PlayerId::A, ZoneKind::Hand, "c1", card("Bear"));
        let mut session = session_with(snapshot);
        for payload in ["", "not json", r#"{"card":"c1"}"#, r#"{"card_id":"c1","owner":"Z"}"#] {
            session.dispatch(Message::Intent(Intent::Drop(DropIntent {
                payload: payload.to_string(),
                target: DropTarget { slot: OWN_FIELD, rect: FIELD },
                pointer_x: 10.0,
                pointer_y: 10.0,
                shift: true,
            })));
        }
        assert!(session.take_outbox().is_empty());
    }

    #[test]
    fn test_drop_with_stale_owner_is_ignored() {
        let mut snapshot = empty_snapshot();
        put(&mut snapshot, PlayerId::A, ZoneKind::Hand, "c1", card("Bear"));
        let mut session = session_with(snapshot);
        session.dispatch(drop_on(OWN_FIELD, "c1", PlayerId::B, (200.0, 150.0)));
        assert!(session.take_outbox().is_empty());

        session.dispatch(drop_on(OWN_FIELD, "c1", PlayerId::A, (200.0, 150.0)));
        assert_eq!(session.take_outbox().len(), 2);
    }

    #[test]
    fn test_chip_drop_is_uncentered() {
        let mut snapshot = empty_snapshot();
        let mut chip = card("Marker");
        chip.is_token = true;
        chip.token_kind = Some(TokenKind::Chip);
        put(&mut snapshot, PlayerId::A, ZoneKind::Battlefield, "chip", chip);
        let mut session = session_with(snapshot);
        session.dispatch(drop_on(OWN_FIELD, "chip", PlayerId::A, (120.0, 90.0)));

        let actions = session.take_outbox();
        assert!(matches!(&actions[0], ActionRequest::SetCardPos { x: 120, y: 90, .. }));
    }

    #[test]
    fn test_snapshot_replaces_wholesale() {
        let mut first = empty_snapshot();
        put(&mut first, PlayerId::A, ZoneKind::Hand, "c1", card("Bear"));
        let mut session = session_with(first);
        let second = empty_snapshot();
        session.dispatch(Message::Snapshot(second.clone()));
        assert_eq!(session.snapshot(), Some(&second));
        let board = session.board().unwrap();
        assert!(board.zone(ZoneSlot::new(Side::Own, ZoneKind::Hand)).unwrap().cards().is_empty());
    }

    #[test]
    fn test_commands_target_the_viewer() {
        let mut session = session_with(empty_snapshot());
        session.dispatch(Message::Intent(Intent::Draw));
        session.dispatch(Message::Intent(Intent::NextPhase));
        session.dispatch(Message::Intent(Intent::Life(-3)));
        session.dispatch(Message::Intent(Intent::Mulligan));
        assert_eq!(
            session.take_outbox(),
            vec![
                ActionRequest::Draw { player_id: PlayerId::A, n: 1 },
                ActionRequest::SetPhase { phase: Phase::Combat },
                ActionRequest::Life { player_id: PlayerId::A, delta: -3 },
                ActionRequest::Mulligan { player_id: PlayerId::A, n: 7 },
            ]
        );
    }

    #[test]
    fn test_scale_changes_stay_local() {
        let mut session = session_with(empty_snapshot());
        session.dispatch(Message::Intent(Intent::SetScale(Side::Own, 50)));
        assert_eq!(session.scale().card_height(Side::Own, Container::Battlefield), 70.0);
        session.dispatch(Message::Settle(Instant::now()));
        session.dispatch(Message::Tick(Instant::now() + Duration::from_secs(1)));
        assert_eq!(session.scale().card_height(Side::Own, Container::Battlefield), 70.0);
        assert!(session.take_outbox().is_empty());
    }
}
