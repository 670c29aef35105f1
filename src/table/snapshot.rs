use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::prelude::*;

/// Identifier the authority assigns to a card instance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two seats at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    A,
    B,
}

impl PlayerId {
    pub fn other(self) -> Self {
        match self {
            PlayerId::A => PlayerId::B,
            PlayerId::B => PlayerId::A,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::A => f.write_str("A"),
            PlayerId::B => f.write_str("B"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Untap,
    Upkeep,
    Draw,
    Main,
    Combat,
    #[serde(rename = "Second Main")]
    SecondMain,
    End,
}

pub const PHASE_ORDER: [Phase; 7] = [
    Phase::Untap,
    Phase::Upkeep,
    Phase::Draw,
    Phase::Main,
    Phase::Combat,
    Phase::SecondMain,
    Phase::End,
];

impl Phase {
    /// The phase after this one, wrapping from `End` back to `Untap`.
    pub fn next(self) -> Self {
        let idx = PHASE_ORDER
            .iter()
            .position(|phase| *phase == self)
            .unwrap_or(0);
        PHASE_ORDER[(idx + 1) % PHASE_ORDER.len()]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Untap => "Untap",
            Phase::Upkeep => "Upkeep",
            Phase::Draw => "Draw",
            Phase::Main => "Main",
            Phase::Combat => "Combat",
            Phase::SecondMain => "Second Main",
            Phase::End => "End",
        };
        f.write_str(name)
    }
}

#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    TokenTray,
}

pub const ALL_ZONES: [ZoneKind; 6] = [
    ZoneKind::Library,
    ZoneKind::Hand,
    ZoneKind::Battlefield,
    ZoneKind::Graveyard,
    ZoneKind::Exile,
    ZoneKind::TokenTray,
];

impl ZoneKind {
    /// Zones shown as a single summarized pile rather than individual cards.
    pub fn is_pile(self) -> bool {
        matches!(self, ZoneKind::Library | ZoneKind::Exile | ZoneKind::Graveyard)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Library => "library",
            ZoneKind::Hand => "hand",
            ZoneKind::Battlefield => "battlefield",
            ZoneKind::Graveyard => "graveyard",
            ZoneKind::Exile => "exile",
            ZoneKind::TokenTray => "token_tray",
        }
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Creature,
    Chip,
}

/// Zone-local pixel coordinates of a placed battlefield card.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_z")]
    pub z: f64,
}

fn default_z() -> f64 {
    1.0
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardView {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tapped: bool,
    #[serde(default)]
    pub is_token: bool,
    #[serde(default)]
    pub token_kind: Option<TokenKind>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pos: Option<Position>,
}

impl CardView {
    pub fn is_chip(&self) -> bool {
        self.is_token && self.token_kind == Some(TokenKind::Chip)
    }

    /// Chips are labelled by their text, everything else by its name.
    pub fn label(&self) -> &str {
        match (&self.text, self.is_chip()) {
            (Some(text), true) if !text.is_empty() => text,
            _ => &self.name,
        }
    }
}

/// The per-player switches that widen what the opponent may see.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Toggles {
    pub show_hand: bool,
    pub show_top: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub life: i32,
    #[serde(default)]
    pub wins: i32,
    #[serde(default)]
    pub hand: Vec<CardId>,
    #[serde(default)]
    pub library: Vec<CardId>,
    #[serde(default)]
    pub exile: Vec<CardId>,
    #[serde(default)]
    pub graveyard: Vec<CardId>,
    #[serde(default)]
    pub battlefield: Vec<CardId>,
    #[serde(default)]
    pub token_tray: Vec<CardId>,
    #[serde(default)]
    pub show_hand: bool,
    #[serde(default)]
    pub show_top: bool,
}

impl PlayerView {
    pub fn zone(&self, kind: ZoneKind) -> &[CardId] {
        match kind {
            ZoneKind::Library => &self.library,
            ZoneKind::Hand => &self.hand,
            ZoneKind::Battlefield => &self.battlefield,
            ZoneKind::Graveyard => &self.graveyard,
            ZoneKind::Exile => &self.exile,
            ZoneKind::TokenTray => &self.token_tray,
        }
    }

    pub fn toggles(&self) -> Toggles {
        Toggles {
            show_hand: self.show_hand,
            show_top: self.show_top,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Players {
    #[serde(rename = "A")]
    pub a: PlayerView,
    #[serde(rename = "B")]
    pub b: PlayerView,
}

/// One complete authoritative state push.
///
/// A snapshot is never patched: the session replaces it wholesale whenever
/// the authority sends a new one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub turn: PlayerId,
    pub phase: Phase,
    pub players: Players,
    #[serde(default)]
    pub cards: BTreeMap<CardId, CardView>,
}

impl Snapshot {
    pub fn player(&self, id: PlayerId) -> &PlayerView {
        match id {
            PlayerId::A => &self.players.a,
            PlayerId::B => &self.players.b,
        }
    }

    pub fn card(&self, id: &CardId) -> Option<&CardView> {
        self.cards.get(id)
    }

    /// Which player's zone currently holds the card, if any.
    pub fn locate(&self, id: &CardId) -> Option<(PlayerId, ZoneKind)> {
        [PlayerId::A, PlayerId::B].into_iter().find_map(|owner| {
            let player = self.player(owner);
            ALL_ZONES
                .into_iter()
                .find(|zone| player.zone(*zone).contains(id))
                .map(|zone| (owner, zone))
        })
    }

    /// Battlefield cards of `owner` that carry a stored position, in sequence order.
    pub fn placed_cards(&self, owner: PlayerId) -> Vec<PlacedCard<'_>> {
        self.player(owner)
            .battlefield
            .iter()
            .filter_map(|id| {
                let card = self.cards.get(id)?;
                let pos = card.pos?;
                Some(PlacedCard {
                    id,
                    name: &card.name,
                    pos,
                })
            })
            .collect()
    }

    /// Checks that every zone entry names a known card and that no card sits
    /// in two zones at once.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let mut seen: BTreeMap<&CardId, (PlayerId, ZoneKind)> = BTreeMap::new();
        for owner in [PlayerId::A, PlayerId::B] {
            let player = self.player(owner);
            for zone in ALL_ZONES {
                for id in player.zone(zone) {
                    if !self.cards.contains_key(id) {
                        return Err(ProtocolError::UnknownCard {
                            owner,
                            zone,
                            card: id.clone(),
                        });
                    }
                    if let Some(&(first_owner, first_zone)) = seen.get(id) {
                        return Err(ProtocolError::DuplicateCard {
                            card: id.clone(),
                            first: format!("{first_owner} {first_zone}"),
                            second: format!("{owner} {zone}"),
                        });
                    }
                    seen.insert(id, (owner, zone));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn empty_player(name: &str) -> PlayerView {
        PlayerView {
            name: name.to_string(),
            life: 20,
            wins: 0,
            hand: vec![],
            library: vec![],
            exile: vec![],
            graveyard: vec![],
            battlefield: vec![],
            token_tray: vec![],
            show_hand: false,
            show_top: false,
        }
    }

    pub fn card(name: &str) -> CardView {
        CardView {
            name: name.to_string(),
            image: None,
            tapped: false,
            is_token: false,
            token_kind: None,
            text: None,
            pos: None,
        }
    }

    pub fn empty_snapshot() -> Snapshot {
        Snapshot {
            turn: PlayerId::A,
            phase: Phase::Main,
            players: Players {
                a: empty_player("Alice"),
                b: empty_player("Bob"),
            },
            cards: BTreeMap::new(),
        }
    }

    /// Adds a card to the given zone and returns its id.
    pub fn put(snapshot: &mut Snapshot, owner: PlayerId, zone: ZoneKind, id: &str, card: CardView) -> CardId {
        let id = CardId::new(id);
        snapshot.cards.insert(id.clone(), card);
        let player = match owner {
            PlayerId::A => &mut snapshot.players.a,
            PlayerId::B => &mut snapshot.players.b,
        };
        let seq = match zone {
            ZoneKind::Library => &mut player.library,
            ZoneKind::Hand => &mut player.hand,
            ZoneKind::Battlefield => &mut player.battlefield,
            ZoneKind::Graveyard => &mut player.graveyard,
            ZoneKind::Exile => &mut player.exile,
            ZoneKind::TokenTray => &mut player.token_tray,
        };
        seq.push(id.clone());
        id
    }
}
