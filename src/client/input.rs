use std::time::{Duration, Instant};

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::debug;

use crate::client::layout::{Hit, Scene};
use crate::client::prompt::{Prompt, PromptKind};
use crate::client::render::{BoardView, CardElement, CardFace, ZoneSlot};
use crate::client::session::{DragPayload, DropIntent, DropTarget, Intent};
use crate::table::prelude::*;

/// A single click on the own library or an own battlefield card waits this
/// long for a second click.
pub const SINGLE_CLICK_DELAY: Duration = Duration::from_millis(180);
/// Two clicks on the same thing within this window make a double click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);
pub const SCALE_STEP: i32 = 10;

/// Zones a dragged card may be released over.
pub const DROP_TARGETS: [ZoneSlot; 6] = [
    ZoneSlot::new(Side::Own, ZoneKind::Battlefield),
    ZoneSlot::new(Side::Own, ZoneKind::Hand),
    ZoneSlot::new(Side::Own, ZoneKind::Library),
    ZoneSlot::new(Side::Own, ZoneKind::Exile),
    ZoneSlot::new(Side::Own, ZoneKind::Graveyard),
    ZoneSlot::new(Side::Opponent, ZoneKind::Battlefield),
];

/// Card details shown enlarged over the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoomView {
    pub title: String,
    pub image: String,
    pub text: Option<String>,
}

/// What the app should do in response to one input event.
#[derive(Clone, Debug, PartialEq)]
pub enum Reaction {
    None,
    Intent(Intent),
    Zoom(ZoomView),
    Prompt(Prompt),
    Quit,
}

/// A left button held down somewhere on the board.
#[derive(Clone, Debug, PartialEq)]
pub struct Press {
    pub hit: Hit,
    pub start: (u16, u16),
    pub cursor: (u16, u16),
    /// Drag data, present only when the pressed card may be dragged.
    pub payload: Option<String>,
    pub label: String,
    pub dragging: bool,
}

struct PendingClick {
    due: Instant,
    intent: Intent,
}

#[derive(Default)]
struct ClickTracker {
    last: Option<(Hit, Instant)>,
    pending: Option<PendingClick>,
}

impl ClickTracker {
    /// Holds `intent` back until the double-click delay has passed. A click
    /// still waiting on something else fires right away.
    fn defer(&mut self, intent: Intent, now: Instant) -> Reaction {
        let due = now + SINGLE_CLICK_DELAY;
        match self.pending.replace(PendingClick { due, intent }) {
            Some(earlier) => Reaction::Intent(earlier.intent),
            None => Reaction::None,
        }
    }

    /// Records a click and reports whether it completes a double click.
    fn register(&mut self, hit: Hit, now: Instant) -> bool {
        match self.last.take() {
            Some((last, at)) if last == hit && now.duration_since(at) <= DOUBLE_CLICK_WINDOW => {
                true
            }
            _ => {
                self.last = Some((hit, now));
                false
            }
        }
    }
}

/// Translates raw terminal input into intents, keeping only the ephemeral
/// state a gesture needs (the held button, the last click).
#[derive(Default)]
pub struct InputState {
    press: Option<Press>,
    clicks: ClickTracker,
    /// Acts as a permanently held Shift for drops.
    pub stack_lock: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The drag in progress, if the pointer has moved since the press.
    pub fn drag(&self) -> Option<&Press> {
        self.press.as_ref().filter(|press| press.dragging)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Reaction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Reaction::Quit;
        }
        let intent = match key.code {
            KeyCode::Esc if self.press.is_some() => {
                debug!("Drag cancelled");
                self.press = None;
                return Reaction::None;
            }
            KeyCode::Esc | KeyCode::Char('q') => return Reaction::Quit,
            KeyCode::Char('c') => return Reaction::Prompt(Prompt::create_creature()),
            KeyCode::Char('o') => return Reaction::Prompt(Prompt::create_marker()),
            KeyCode::Char('g') => {
                self.stack_lock = !self.stack_lock;
                debug!("Stack lock {}", if self.stack_lock { "on" } else { "off" });
                return Reaction::None;
            }
            KeyCode::Char('d') => Intent::Draw,
            KeyCode::Char('p') => Intent::PassTurn,
            KeyCode::Char('n') => Intent::NextPhase,
            KeyCode::Char('s') => Intent::Shuffle,
            KeyCode::Char('m') => Intent::Mulligan,
            KeyCode::Char('h') => Intent::ToggleShowHand,
            KeyCode::Char('t') => Intent::ToggleShowTop,
            KeyCode::Char('+') | KeyCode::Char('=') => Intent::Life(1),
            KeyCode::Char('-') => Intent::Life(-1),
            KeyCode::Char('w') => Intent::Wins(1),
            KeyCode::Char('W') => Intent::Wins(-1),
            KeyCode::Char('0') => Intent::SetScale(Side::Own, 100),
            KeyCode::Char(digit @ '3'..='9') => {
                let tens = digit.to_digit(10).map_or(10, |d| d as i32);
                Intent::SetScale(Side::Own, tens * 10)
            }
            KeyCode::Char(']') => Intent::NudgeScale(Side::Own, SCALE_STEP),
            KeyCode::Char('[') => Intent::NudgeScale(Side::Own, -SCALE_STEP),
            KeyCode::Char('}') => Intent::NudgeScale(Side::Opponent, SCALE_STEP),
            KeyCode::Char('{') => Intent::NudgeScale(Side::Opponent, -SCALE_STEP),
            _ => return Reaction::None,
        };
        Reaction::Intent(intent)
    }

    pub fn handle_mouse(
        &mut self,
        mouse: MouseEvent,
        board: &BoardView,
        scene: &Scene,
        now: Instant,
    ) -> Reaction {
        let cell = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.press = scene.hit(cell.0, cell.1).map(|hit| {
                    let face = card_face(board, hit);
                    Press {
                        hit,
                        start: cell,
                        cursor: cell,
                        payload: face.filter(|face| face.draggable).map(|face| {
                            DragPayload {
                                card_id: face.id.clone(),
                                owner: zone_owner(board, hit.slot()),
                            }
                            .encode()
                        }),
                        label: face.map(|face| face.label.clone()).unwrap_or_default(),
                        dragging: false,
                    }
                });
                Reaction::None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(press) = self.press.as_mut().filter(|press| press.payload.is_some()) {
                    press.cursor = cell;
                    press.dragging = press.dragging || cell != press.start;
                }
                Reaction::None
            }
            MouseEventKind::Up(MouseButton::Left) => match self.press.take() {
                Some(press) if press.dragging => {
                    let shift = mouse.modifiers.contains(KeyModifiers::SHIFT) || self.stack_lock;
                    self.release(press, cell, shift, scene)
                }
                Some(press) => self.click(press.hit, board, now),
                None => Reaction::None,
            },
            MouseEventKind::Down(MouseButton::Right) => match scene.hit(cell.0, cell.1) {
                Some(hit) => context_action(board, hit),
                None => Reaction::None,
            },
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => scene
                .hit(cell.0, cell.1)
                .and_then(|hit| card_face(board, hit))
                .and_then(zoom_for)
                .map_or(Reaction::None, Reaction::Zoom),
            _ => Reaction::None,
        }
    }

    /// Fires a delayed single click once its double-click window has passed.
    pub fn tick(&mut self, now: Instant) -> Reaction {
        match self.clicks.pending.take() {
            Some(pending) if pending.due <= now => Reaction::Intent(pending.intent),
            other => {
                self.clicks.pending = other;
                Reaction::None
            }
        }
    }

    fn release(&mut self, press: Press, cell: (u16, u16), shift: bool, scene: &Scene) -> Reaction {
        let Some(payload) = press.payload else {
            return Reaction::None;
        };
        let target = scene
            .layout
            .zone_at(cell.0, cell.1)
            .filter(|slot| DROP_TARGETS.contains(slot));
        let Some(slot) = target else {
            debug!("Drag released outside any drop target");
            return Reaction::None;
        };
        let (pointer_x, pointer_y) = scene.metrics.cell_center(cell.0, cell.1);
        Reaction::Intent(Intent::Drop(DropIntent {
            payload,
            target: DropTarget {
                slot,
                rect: scene.zone_rect_px(slot),
            },
            pointer_x,
            pointer_y,
            shift,
        }))
    }

    fn click(&mut self, hit: Hit, board: &BoardView, now: Instant) -> Reaction {
        let double = self.clicks.register(hit, now);
        match hit {
            Hit::Card { slot, .. } => {
                let Some(face) = card_face(board, hit) else {
                    return Reaction::None;
                };
                if double {
                    // the first click's tap never happens
                    self.clicks.pending = None;
                    return zoom_for(face).map_or(Reaction::None, Reaction::Zoom);
                }
                match slot.kind {
                    ZoneKind::TokenTray if face.interactive => {
                        let current = face.text.as_deref().unwrap_or(&face.label);
                        Reaction::Prompt(Prompt::edit_token(face.id.clone(), current))
                    }
                    ZoneKind::Battlefield if face.interactive => {
                        self.clicks.defer(Intent::TapToggle(face.id.clone()), now)
                    }
                    _ => Reaction::None,
                }
            }
            Hit::Pile(slot) if slot.side == Side::Own => match slot.kind {
                ZoneKind::Library if double => {
                    self.clicks.pending = None;
                    Reaction::Intent(Intent::SwapWithHand(ZoneKind::Library))
                }
                ZoneKind::Library => self.clicks.defer(Intent::Draw, now),
                kind @ (ZoneKind::Exile | ZoneKind::Graveyard) if double => {
                    Reaction::Intent(Intent::SwapWithHand(kind))
                }
                _ => Reaction::None,
            },
            _ => Reaction::None,
        }
    }
}

fn card_face(board: &BoardView, hit: Hit) -> Option<&CardFace> {
    match hit {
        Hit::Card { slot, index } => match board.card(slot, index)? {
            CardElement::Face(face) => Some(face),
            CardElement::FaceDown => None,
        },
        _ => None,
    }
}

fn zone_owner(board: &BoardView, slot: ZoneSlot) -> PlayerId {
    board
        .zone(slot)
        .map(|zone| zone.owner)
        .unwrap_or(board.viewer)
}

fn zoom_for(face: &CardFace) -> Option<ZoomView> {
    let image = face.image.clone()?;
    Some(ZoomView {
        title: face.title.clone(),
        image,
        text: face.text.clone(),
    })
}

fn context_action(board: &BoardView, hit: Hit) -> Reaction {
    let Some(face) = card_face(board, hit).filter(|face| face.interactive) else {
        return Reaction::None;
    };
    if face.token.is_some() {
        let kind = PromptKind::ConfirmRemoveToken(face.id.clone());
        return Reaction::Prompt(Prompt::confirm(kind));
    }
    if hit.slot().kind == ZoneKind::Hand {
        let kind = PromptKind::ConfirmPutOnBottom(face.id.clone());
        return Reaction::Prompt(Prompt::confirm(kind));
    }
    Reaction::None
}
