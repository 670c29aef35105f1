use chrono::{DateTime, Utc};
use log::trace;

use super::prelude::*;
use super::scale::effective_card_height;

/// Card width over card height.
pub const CARD_ASPECT: f64 = 5.0 / 7.0;

/// How close (pointer to card center) a drop must land to stack onto a card.
pub const ANCHOR_RADIUS_PX: f64 = 36.0;

/// Cards whose positions lie this close to the anchor count as one stack.
pub const STACK_CLUSTER_RADIUS_PX: f64 = 28.0;

/// Offset between consecutive cards of a stack, on both axes.
pub const STACK_STEP_PX: f64 = 18.0 * 0.7;

/// `z` values wrap around at this bound.
pub const Z_BOUND: i64 = 1_000_000;

/// A zone's rectangle in board pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ZoneRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }
}

/// A battlefield card that already has a stored position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedCard<'a> {
    pub id: &'a CardId,
    pub name: &'a str,
    pub pos: Position,
}

/// Everything known at the moment a card is released over a battlefield.
#[derive(Clone, Copy, Debug)]
pub struct DropRequest<'a> {
    pub zone: ZoneRect,
    pub card_height: f64,
    /// Pointer position in board pixels (not zone-local).
    pub pointer_x: f64,
    pub pointer_y: f64,
    pub card_id: &'a CardId,
    pub card_name: &'a str,
    /// Stack onto any nearby card, not only cards with the same name.
    pub shift: bool,
}

pub fn card_width(card_height: f64) -> f64 {
    (card_height * CARD_ASPECT).round()
}

/// Computes where a dropped card lands on a battlefield.
pub fn compute_drop(request: &DropRequest<'_>, existing: &[PlacedCard<'_>]) -> Position {
    compute_drop_with_z(request, existing, soft_z(Utc::now()))
}

pub(crate) fn compute_drop_with_z(request: &DropRequest<'_>, existing: &[PlacedCard<'_>], z: f64) -> Position {
    let zone = request.zone;
    let height = effective_card_height(request.card_height, zone.height);
    let width = card_width(height);

    let (x, y) = match find_anchor(request, existing, width, height) {
        Some(anchor) => {
            let depth = stack_depth(anchor.pos, existing, request.card_id);
            trace!("Stacking {} onto {} at depth {depth}", request.card_id, anchor.id);
            (
                anchor.pos.x + depth as f64 * STACK_STEP_PX,
                anchor.pos.y + depth as f64 * STACK_STEP_PX,
            )
        }
        None => (
            request.pointer_x - zone.left - width / 2.0,
            request.pointer_y - zone.top - height / 2.0,
        ),
    };

    Position::new(
        clamp_axis(x.round(), zone.width - width),
        clamp_axis(y.round(), zone.height - height),
        z,
    )
}

/// Picks the card the drop should stack onto, if any.
///
/// Distances are measured from the zone-local pointer to each candidate's
/// center. On equal distances the earlier candidate wins.
pub fn find_anchor<'a, 'b>(
    request: &DropRequest<'_>,
    existing: &'b [PlacedCard<'a>],
    width: f64,
    height: f64,
) -> Option<&'b PlacedCard<'a>> {
    let px = request.pointer_x - request.zone.left;
    let py = request.pointer_y - request.zone.top;

    let mut best: Option<(&PlacedCard<'a>, f64)> = None;
    for candidate in existing.iter().filter(|card| card.id != request.card_id) {
        let cx = candidate.pos.x + width / 2.0;
        let cy = candidate.pos.y + height / 2.0;
        let distance = (px - cx).hypot(py - cy);
        if distance >= ANCHOR_RADIUS_PX {
            continue;
        }
        let same_name = !request.card_name.is_empty() && candidate.name == request.card_name;
        if !(same_name || request.shift) {
            continue;
        }
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(card, _)| card)
}

/// Number of placed cards (anchor included, dragged card excluded) that sit on
/// the stack rooted at `anchor`.
pub fn stack_depth(anchor: Position, existing: &[PlacedCard<'_>], dragged: &CardId) -> usize {
    existing
        .iter()
        .filter(|card| card.id != dragged)
        .filter(|card| (card.pos.x - anchor.x).hypot(card.pos.y - anchor.y) < STACK_CLUSTER_RADIUS_PX)
        .count()
}

/// Position for a chip token released at the pointer: uncentered, kept
/// inside the zone rectangle.
pub fn compute_chip_drop(zone: ZoneRect, pointer_x: f64, pointer_y: f64) -> Position {
    let x = clamp_axis((pointer_x - zone.left).round(), zone.width);
    let y = clamp_axis((pointer_y - zone.top).round(), zone.height);
    Position::new(x, y, soft_z(Utc::now()))
}

/// Stacking hint derived from wall-clock time, so later moves paint on top.
/// It wraps and is not stable across reloads.
pub fn soft_z(now: DateTime<Utc>) -> f64 {
    now.timestamp_millis().rem_euclid(Z_BOUND) as f64
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    value.min(max).max(0.0)
}
