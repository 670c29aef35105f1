use std::collections::BTreeMap;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::client::render::{BoardView, CardElement, ZoneContent, ZoneSlot};
use crate::table::placement::card_width;
use crate::table::prelude::*;
use crate::table::scale::ScaleController;

/// Board pixels covered by one terminal cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellMetrics {
    pub width_px: f64,
    pub height_px: f64,
}

impl CellMetrics {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px: width_px.max(1.0),
            height_px: height_px.max(1.0),
        }
    }

    /// Board pixel at the center of a cell.
    pub fn cell_center(&self, col: u16, row: u16) -> (f64, f64) {
        (
            (col as f64 + 0.5) * self.width_px,
            (row as f64 + 0.5) * self.height_px,
        )
    }

    pub fn rect_px(&self, area: Rect) -> ZoneRect {
        ZoneRect::new(
            area.x as f64 * self.width_px,
            area.y as f64 * self.height_px,
            area.width as f64 * self.width_px,
            area.height as f64 * self.height_px,
        )
    }

    fn cols(&self, px: f64) -> u16 {
        (px / self.width_px).round().clamp(0.0, u16::MAX as f64) as u16
    }

    fn rows(&self, px: f64) -> u16 {
        (px / self.height_px).round().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::new(8.0, 16.0)
    }
}

/// Where every zone sits on the terminal.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenLayout {
    pub header: Rect,
    pub footer: Rect,
    zones: BTreeMap<ZoneSlot, Rect>,
}

const PILE_WIDTH: u16 = 12;
const TRAY_WIDTH: u16 = 18;

impl ScreenLayout {
    pub fn new(area: Rect) -> Self {
        let frame = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        // Zone rows share whatever the status and help lines leave
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(16),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
                Constraint::Percentage(24),
            ])
            .split(frame[1]);

        let opp_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(PILE_WIDTH),
                Constraint::Length(PILE_WIDTH),
                Constraint::Length(PILE_WIDTH),
            ])
            .split(rows[0]);

        let own_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(PILE_WIDTH),
                Constraint::Length(PILE_WIDTH),
                Constraint::Length(PILE_WIDTH),
                Constraint::Length(TRAY_WIDTH),
            ])
            .split(rows[3]);

        let opp = |kind| ZoneSlot::new(Side::Opponent, kind);
        let own = |kind| ZoneSlot::new(Side::Own, kind);
        let zones = BTreeMap::from([
            (opp(ZoneKind::Hand), opp_row[0]),
            (opp(ZoneKind::Library), opp_row[1]),
            (opp(ZoneKind::Exile), opp_row[2]),
            (opp(ZoneKind::Graveyard), opp_row[3]),
            (opp(ZoneKind::Battlefield), rows[1]),
            (own(ZoneKind::Battlefield), rows[2]),
            (own(ZoneKind::Hand), own_row[0]),
            (own(ZoneKind::Library), own_row[1]),
            (own(ZoneKind::Exile), own_row[2]),
            (own(ZoneKind::Graveyard), own_row[3]),
            (own(ZoneKind::TokenTray), own_row[4]),
        ]);

        Self {
            header: frame[0],
            footer: frame[2],
            zones,
        }
    }

    /// Outer rectangle of a zone, border included.
    pub fn outer(&self, slot: ZoneSlot) -> Rect {
        self.zones.get(&slot).copied().unwrap_or_default()
    }

    /// Content rectangle of a zone, inside its border.
    pub fn inner(&self, slot: ZoneSlot) -> Rect {
        let outer = self.outer(slot);
        Rect::new(
            outer.x.saturating_add(1),
            outer.y.saturating_add(1),
            outer.width.saturating_sub(2),
            outer.height.saturating_sub(2),
        )
    }

    pub fn zone_at(&self, col: u16, row: u16) -> Option<ZoneSlot> {
        self.zones
            .iter()
            .find(|(_, area)| contains(**area, col, row))
            .map(|(slot, _)| *slot)
    }

    /// Heights (in pixels) of the containers whose cards follow the zoom.
    pub fn scaled_containers(&self, metrics: CellMetrics) -> Vec<(Side, Container, f64)> {
        [Side::Own, Side::Opponent]
            .into_iter()
            .flat_map(|side| {
                [
                    (Container::Hand, ZoneKind::Hand),
                    (Container::Battlefield, ZoneKind::Battlefield),
                ]
                .into_iter()
                .map(move |(container, kind)| (side, container, kind))
            })
            .map(|(side, container, kind)| {
                let height = metrics.rect_px(self.inner(ZoneSlot::new(side, kind))).height;
                (side, container, height)
            })
            .collect()
    }
}

pub fn contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x
        && col < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

/// What a painted rectangle stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Card { index: usize },
    Pile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneItem {
    pub slot: ZoneSlot,
    pub area: Rect,
    pub kind: ItemKind,
}

/// The result of pointing at the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Card { slot: ZoneSlot, index: usize },
    Pile(ZoneSlot),
    Zone(ZoneSlot),
}

impl Hit {
    pub fn slot(&self) -> ZoneSlot {
        match self {
            Hit::Card { slot, .. } | Hit::Pile(slot) | Hit::Zone(slot) => *slot,
        }
    }
}

/// Painted rectangles of one board, in paint order (last is on top).
///
/// Derived from the board, the zoom and the terminal size only; it is thrown
/// away and rebuilt every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub layout: ScreenLayout,
    pub metrics: CellMetrics,
    pub items: Vec<SceneItem>,
}

impl Scene {
    pub fn build(
        board: &BoardView,
        layout: ScreenLayout,
        scale: &ScaleController,
        metrics: CellMetrics,
    ) -> Self {
        let mut items = vec![];
        for (slot, zone) in &board.zones {
            let inner = layout.inner(*slot);
            if inner.width == 0 || inner.height == 0 {
                continue;
            }
            match &zone.content {
                ZoneContent::Pile(_) => items.push(SceneItem {
                    slot: *slot,
                    area: inner,
                    kind: ItemKind::Pile,
                }),
                ZoneContent::Cards(cards) if slot.kind == ZoneKind::TokenTray => {
                    items.extend(chip_rows(*slot, inner, cards));
                }
                ZoneContent::Cards(cards) => {
                    let container = match slot.kind {
                        ZoneKind::Hand => Container::Hand,
                        _ => Container::Battlefield,
                    };
                    let card_height = scale.card_height(slot.side, container);
                    items.extend(card_items(*slot, inner, cards, card_height, metrics));
                }
            }
        }
        Self { layout, metrics, items }
    }

    /// Topmost thing under the cell, falling back to the zone itself.
    pub fn hit(&self, col: u16, row: u16) -> Option<Hit> {
        let item = self
            .items
            .iter()
            .rev()
            .find(|item| contains(item.area, col, row));
        match item {
            Some(SceneItem { slot, kind: ItemKind::Card { index }, .. }) => Some(Hit::Card {
                slot: *slot,
                index: *index,
            }),
            Some(SceneItem { slot, kind: ItemKind::Pile, .. }) => Some(Hit::Pile(*slot)),
            None => self.layout.zone_at(col, row).map(Hit::Zone),
        }
    }

    /// A zone's content rectangle in board pixels.
    pub fn zone_rect_px(&self, slot: ZoneSlot) -> ZoneRect {
        self.metrics.rect_px(self.layout.inner(slot))
    }
}

/// Cell footprint of a card of the given pixel height. Tapped cards lie on
/// their side.
fn footprint(card_height: f64, tapped: bool, metrics: CellMetrics) -> (u16, u16) {
    let (w_px, h_px) = if tapped {
        (card_height, card_width(card_height))
    } else {
        (card_width(card_height), card_height)
    };
    (metrics.cols(w_px).max(3), metrics.rows(h_px).max(2))
}

fn card_items(
    slot: ZoneSlot,
    inner: Rect,
    cards: &[CardElement],
    card_height: f64,
    metrics: CellMetrics,
) -> Vec<SceneItem> {
    let mut flow = vec![];
    let mut placed = vec![];
    for (index, element) in cards.iter().enumerate() {
        let (tapped, pos) = match element {
            CardElement::Face(face) => (face.tapped, face.pos),
            CardElement::FaceDown => (false, None),
        };
        let (w, h) = footprint(card_height, tapped, metrics);
        match pos {
            Some(pos) => placed.push((index, pos, w, h)),
            None => flow.push((index, w, h)),
        }
    }

    let mut items = vec![];

    // Flow cards share one row and squeeze together when space runs out
    let total: u16 = flow.iter().map(|(_, w, _)| w.saturating_add(1)).sum();
    let squeeze = flow.len() > 1 && total > inner.width;
    let step = |w: u16| {
        if squeeze {
            let last = flow.last().map(|(_, w, _)| *w).unwrap_or(w);
            (inner.width.saturating_sub(last) / (flow.len() as u16 - 1)).max(1)
        } else {
            w.saturating_add(1)
        }
    };
    let mut col = inner.x;
    for (index, w, h) in &flow {
        let area = Rect::new(col, inner.y, *w, *h).intersection(inner);
        if area.width > 0 && area.height > 0 {
            items.push(SceneItem { slot, area, kind: ItemKind::Card { index: *index } });
        }
        col = col.saturating_add(step(*w));
    }

    // Placed cards paint above the flow, lowest z first; ties keep sequence order
    placed.sort_by(|a, b| a.1.z.total_cmp(&b.1.z));
    for (index, pos, w, h) in placed {
        let x = inner.x.saturating_add(metrics.cols(pos.x.max(0.0)));
        let y = inner.y.saturating_add(metrics.rows(pos.y.max(0.0)));
        let area = Rect::new(x, y, w, h).intersection(inner);
        if area.width > 0 && area.height > 0 {
            items.push(SceneItem { slot, area, kind: ItemKind::Card { index } });
        }
    }
    items
}

/// Chips in the tray are listed one per line.
fn chip_rows(slot: ZoneSlot, inner: Rect, cards: &[CardElement]) -> Vec<SceneItem> {
    (0..cards.len())
        .take(inner.height as usize)
        .map(|index| SceneItem {
            slot,
            area: Rect::new(inner.x, inner.y + index as u16, inner.width, 1),
            kind: ItemKind::Card { index },
        })
        .collect()
}
