use std::collections::BTreeMap;

use crate::table::asset::normalize_image_path;
use crate::table::prelude::*;
use crate::table::visibility::resolve;

/// One container on screen: a zone of the viewer or of the opponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneSlot {
    pub side: Side,
    pub kind: ZoneKind,
}

impl ZoneSlot {
    pub const fn new(side: Side, kind: ZoneKind) -> Self {
        Self { side, kind }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            ZoneKind::Library => "Library",
            ZoneKind::Hand => "Hand",
            ZoneKind::Battlefield => "Battlefield",
            ZoneKind::Graveyard => "Graveyard",
            ZoneKind::Exile => "Exile",
            ZoneKind::TokenTray => "Tokens",
        }
    }
}

/// Every slot the board shows. The opponent has no token tray.
pub const BOARD_SLOTS: [ZoneSlot; 11] = [
    ZoneSlot::new(Side::Opponent, ZoneKind::Hand),
    ZoneSlot::new(Side::Opponent, ZoneKind::Library),
    ZoneSlot::new(Side::Opponent, ZoneKind::Exile),
    ZoneSlot::new(Side::Opponent, ZoneKind::Graveyard),
    ZoneSlot::new(Side::Opponent, ZoneKind::Battlefield),
    ZoneSlot::new(Side::Own, ZoneKind::Battlefield),
    ZoneSlot::new(Side::Own, ZoneKind::Hand),
    ZoneSlot::new(Side::Own, ZoneKind::Library),
    ZoneSlot::new(Side::Own, ZoneKind::Exile),
    ZoneSlot::new(Side::Own, ZoneKind::Graveyard),
    ZoneSlot::new(Side::Own, ZoneKind::TokenTray),
];

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub life: i32,
    pub wins: i32,
    pub show_hand: bool,
    pub show_top: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderView {
    pub turn: String,
    pub phase: Phase,
    pub own: PlayerSummary,
    pub opponent: PlayerSummary,
}

/// What a pile shows behind its counter.
#[derive(Clone, Debug, PartialEq)]
pub enum PileFace {
    Back,
    Top { name: String, image: Option<String> },
    Blank,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PileView {
    pub count: usize,
    pub face: PileFace,
    pub clickable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardFace {
    pub id: CardId,
    pub label: String,
    pub title: String,
    pub image: Option<String>,
    pub text: Option<String>,
    pub tapped: bool,
    pub token: Option<TokenKind>,
    pub draggable: bool,
    /// Click and context actions are offered.
    pub interactive: bool,
    /// Only battlefield cards are ever placed absolutely.
    pub pos: Option<Position>,
}

impl CardFace {
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// A rendered card. A face-down card carries nothing that identifies it.
#[derive(Clone, Debug, PartialEq)]
pub enum CardElement {
    Face(CardFace),
    FaceDown,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ZoneContent {
    Pile(PileView),
    Cards(Vec<CardElement>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ZoneView {
    pub slot: ZoneSlot,
    pub owner: PlayerId,
    pub content: ZoneContent,
}

impl ZoneView {
    pub fn cards(&self) -> &[CardElement] {
        match &self.content {
            ZoneContent::Cards(cards) => cards,
            ZoneContent::Pile(_) => &[],
        }
    }
}

/// The whole board as the viewer is allowed to see it.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardView {
    pub viewer: PlayerId,
    pub header: HeaderView,
    pub zones: BTreeMap<ZoneSlot, ZoneView>,
}

impl BoardView {
    pub fn zone(&self, slot: ZoneSlot) -> Option<&ZoneView> {
        self.zones.get(&slot)
    }

    pub fn card(&self, slot: ZoneSlot, index: usize) -> Option<&CardElement> {
        self.zone(slot)?.cards().get(index)
    }
}

pub fn side_owner(viewer: PlayerId, side: Side) -> PlayerId {
    match side {
        Side::Own => viewer,
        Side::Opponent => viewer.other(),
    }
}

/// Rebuilds every zone from scratch. Holds no state, so the same snapshot and
/// viewer always give an equal board.
pub fn render(snapshot: &Snapshot, viewer: PlayerId) -> BoardView {
    let zones = BOARD_SLOTS
        .iter()
        .map(|slot| (*slot, render_zone(snapshot, viewer, *slot)))
        .collect();

    BoardView {
        viewer,
        header: render_header(snapshot, viewer),
        zones,
    }
}

fn render_header(snapshot: &Snapshot, viewer: PlayerId) -> HeaderView {
    let summary = |id: PlayerId, fallback: &str| {
        let player = snapshot.player(id);
        PlayerSummary {
            id,
            name: display_name(&player.name, fallback),
            life: player.life,
            wins: player.wins,
            show_hand: player.show_hand,
            show_top: player.show_top,
        }
    };
    let own = summary(viewer, &format!("Player {viewer}"));
    let opponent = summary(viewer.other(), &format!("Player {}", viewer.other()));
    let turn = if snapshot.turn == viewer {
        display_name(&own.name, "Me")
    } else {
        display_name(&opponent.name, "Opponent")
    };
    HeaderView {
        turn,
        phase: snapshot.phase,
        own,
        opponent,
    }
}

fn display_name(name: &str, fallback: &str) -> String {
    if name.trim().is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

fn render_zone(snapshot: &Snapshot, viewer: PlayerId, slot: ZoneSlot) -> ZoneView {
    let owner = side_owner(viewer, slot.side);
    let player = snapshot.player(owner);
    let ids = player.zone(slot.kind);
    let mode = resolve(slot.kind, owner, viewer, player.toggles());
    let own = owner == viewer;

    let content = if slot.kind.is_pile() {
        ZoneContent::Pile(render_pile(snapshot, slot.kind, ids, mode, own))
    } else {
        let cards = ids
            .iter()
            .filter_map(|id| render_card(snapshot, id, slot.kind, mode, own))
            .collect();
        ZoneContent::Cards(cards)
    };

    ZoneView { slot, owner, content }
}

fn render_pile(
    snapshot: &Snapshot,
    kind: ZoneKind,
    ids: &[CardId],
    mode: DisplayMode,
    own: bool,
) -> PileView {
    let top = ids.last().and_then(|id| snapshot.card(id));
    // Exile and graveyard are face up piles: their thumbnail is always the last card
    let face_up = mode == DisplayMode::Full || kind != ZoneKind::Library;
    let face = match top {
        Some(card) if face_up => PileFace::Top {
            name: card.name.clone(),
            image: normalize_image_path(card.image.as_deref()),
        },
        Some(_) => PileFace::Back,
        None => PileFace::Blank,
    };
    PileView {
        count: ids.len(),
        face,
        clickable: own,
    }
}

fn render_card(
    snapshot: &Snapshot,
    id: &CardId,
    kind: ZoneKind,
    mode: DisplayMode,
    own: bool,
) -> Option<CardElement> {
    if mode == DisplayMode::FaceDown {
        return Some(CardElement::FaceDown);
    }
    let card = snapshot.card(id)?;
    let on_battlefield = kind == ZoneKind::Battlefield;
    let token = card
        .is_token
        .then(|| card.token_kind.unwrap_or(TokenKind::Creature));

    Some(CardElement::Face(CardFace {
        id: id.clone(),
        label: card.label().to_string(),
        title: card.name.clone(),
        image: normalize_image_path(card.image.as_deref()),
        text: card.text.clone(),
        tapped: card.tapped,
        token,
        draggable: own && kind != ZoneKind::TokenTray,
        interactive: own,
        pos: if on_battlefield { card.pos } else { None },
    }))
}
