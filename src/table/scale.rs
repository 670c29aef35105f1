use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use log::debug;

pub const MIN_SCALE_PCT: i32 = 30;
pub const MAX_SCALE_PCT: i32 = 100;
pub const MIN_CARD_HEIGHT_PX: f64 = 16.0;
/// Vertical room a container keeps free around its cards.
pub const CONTAINER_PADDING_PX: f64 = 12.0;
/// Extra recomputations after startup, once late layout shifts have settled.
pub const SETTLE_DELAYS: [Duration; 2] = [Duration::from_millis(150), Duration::from_millis(400)];

/// Whose half of the table a container belongs to, relative to the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Own,
    Opponent,
}

/// Containers whose card size follows the side's zoom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    Hand,
    Battlefield,
}

pub const SCALED_CONTAINERS: [Container; 2] = [Container::Hand, Container::Battlefield];

/// Card height in pixels for a container of the given height at `pct` zoom.
pub fn derive_card_height(container_height: f64, pct: i32) -> f64 {
    let pct = clamp_percent(pct) as f64;
    let inner = (container_height - CONTAINER_PADDING_PX).max(0.0);
    (inner * pct / 100.0).floor().max(MIN_CARD_HEIGHT_PX)
}

/// Replaces a missing or nonsensical card height with one derived from the
/// container's own height.
pub fn effective_card_height(card_height: f64, container_height: f64) -> f64 {
    if card_height.is_finite() && card_height > 0.0 {
        card_height
    } else {
        (container_height * 0.95).max(MIN_CARD_HEIGHT_PX)
    }
}

pub fn clamp_percent(pct: i32) -> i32 {
    pct.clamp(MIN_SCALE_PCT, MAX_SCALE_PCT)
}

/// Keeps the per-side zoom and the card heights derived from it.
///
/// Heights are only ever recomputed from the stored percentage and the last
/// observed container height, so replaying the same inputs gives the same
/// result.
#[derive(Debug)]
pub struct ScaleController {
    percent: BTreeMap<Side, i32>,
    containers: BTreeMap<(Side, Container), f64>,
    card_heights: BTreeMap<(Side, Container), f64>,
    settle_at: Vec<Instant>,
}

impl ScaleController {
    pub fn new() -> Self {
        Self {
            percent: BTreeMap::from([(Side::Own, MAX_SCALE_PCT), (Side::Opponent, MAX_SCALE_PCT)]),
            containers: BTreeMap::new(),
            card_heights: BTreeMap::new(),
            settle_at: vec![],
        }
    }

    pub fn percent(&self, side: Side) -> i32 {
        self.percent.get(&side).copied().unwrap_or(MAX_SCALE_PCT)
    }

    /// Slider input: stores the clamped percentage and rescales that side.
    pub fn set_percent(&mut self, side: Side, pct: i32) -> i32 {
        let pct = clamp_percent(pct);
        debug!("Scale for {side:?} set to {pct}%");
        self.percent.insert(side, pct);
        self.recompute_side(side);
        pct
    }

    pub fn nudge_percent(&mut self, side: Side, delta: i32) -> i32 {
        self.set_percent(side, self.percent(side) + delta)
    }

    /// A single container changed size; rescale it with the side's current zoom.
    pub fn container_resized(&mut self, side: Side, container: Container, height: f64) {
        self.containers.insert((side, container), height);
        self.recompute(side, container);
    }

    /// The whole window changed size; rescale every container on both sides.
    pub fn window_resized<I>(&mut self, sizes: I)
    where
        I: IntoIterator<Item = (Side, Container, f64)>,
    {
        for (side, container, height) in sizes {
            self.containers.insert((side, container), height);
        }
        self.recompute_all();
    }

    /// Initial load: rescale now and schedule the settle passes.
    pub fn begin_settle(&mut self, now: Instant) {
        self.recompute_all();
        self.settle_at = SETTLE_DELAYS.iter().map(|delay| now + *delay).collect();
    }

    /// Runs any settle pass that has come due. Returns whether one ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.settle_at.len();
        self.settle_at.retain(|deadline| *deadline > now);
        if self.settle_at.len() == before {
            return false;
        }
        debug!("Settling card scale ({} passes left)", self.settle_at.len());
        self.recompute_all();
        true
    }

    pub fn pending_settles(&self) -> usize {
        self.settle_at.len()
    }

    /// The card height to interpret and emit positions with.
    pub fn card_height(&self, side: Side, container: Container) -> f64 {
        let container_height = self.container_height(side, container);
        let stored = self
            .card_heights
            .get(&(side, container))
            .copied()
            .unwrap_or(f64::NAN);
        effective_card_height(stored, container_height)
    }

    pub fn container_height(&self, side: Side, container: Container) -> f64 {
        self.containers.get(&(side, container)).copied().unwrap_or(0.0)
    }

    fn recompute_all(&mut self) {
        self.recompute_side(Side::Own);
        self.recompute_side(Side::Opponent);
    }

    fn recompute_side(&mut self, side: Side) {
        for container in SCALED_CONTAINERS {
            self.recompute(side, container);
        }
    }

    fn recompute(&mut self, side: Side, container: Container) {
        let Some(height) = self.containers.get(&(side, container)).copied() else {
            return;
        };
        let card_height = derive_card_height(height, self.percent(side));
        self.card_heights.insert((side, container), card_height);
    }
}

impl Default for ScaleController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_card_height() {
        assert_eq!(derive_card_height(500.0, 30), 146.0);
        assert_eq!(derive_card_height(500.0, 100), 488.0);
        // Tiny containers never go below the minimum
        assert_eq!(derive_card_height(20.0, 30), MIN_CARD_HEIGHT_PX);
        assert_eq!(derive_card_height(0.0, 100), MIN_CARD_HEIGHT_PX);
    }

    #[test]
    fn test_percent_is_clamped() {
        let mut scale = ScaleController::new();
        assert_eq!(scale.set_percent(Side::Own, 5), 30);
        assert_eq!(scale.set_percent(Side::Own, 250), 100);
        assert_eq!(scale.nudge_percent(Side::Opponent, -90), 30);
        assert_eq!(scale.percent(Side::Own), 100);
    }

    #[test]
    fn test_slider_rescales_only_its_side() {
        let mut scale = ScaleController::new();
        scale.window_resized([
            (Side::Own, Container::Battlefield, 500.0),
            (Side::Opponent, Container::Battlefield, 500.0),
        ]);
        scale.set_percent(Side::Own, 30);
        assert_eq!(scale.card_height(Side::Own, Container::Battlefield), 146.0);
        assert_eq!(scale.card_height(Side::Opponent, Container::Battlefield), 488.0);
    }

    #[test]
    fn test_container_resize_keeps_current_percent() {
        let mut scale = ScaleController::new();
        scale.set_percent(Side::Own, 50);
        scale.container_resized(Side::Own, Container::Hand, 212.0);
        assert_eq!(scale.card_height(Side::Own, Container::Hand), 100.0);
    }

    #[test]
    fn test_unknown_container_falls_back() {
        let scale = ScaleController::new();
        // Nothing observed yet: fall back to the minimum rather than NaN
        assert_eq!(scale.card_height(Side::Own, Container::Battlefield), MIN_CARD_HEIGHT_PX);
        assert_eq!(effective_card_height(-3.0, 200.0), 190.0);
        assert_eq!(effective_card_height(f64::INFINITY, 200.0), 190.0);
        assert_eq!(effective_card_height(120.0, 200.0), 120.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut scale = ScaleController::new();
        scale.set_percent(Side::Opponent, 70);
        scale.window_resized([(Side::Opponent, Container::Hand, 333.0)]);
        let first = scale.card_height(Side::Opponent, Container::Hand);
        scale.window_resized([(Side::Opponent, Container::Hand, 333.0)]);
        scale.container_resized(Side::Opponent, Container::Hand, 333.0);
        assert_eq!(scale.card_height(Side::Opponent, Container::Hand), first);
    }

    #[test]
    fn test_settle_passes_fire_once_each() {
        let mut scale = ScaleController::new();
        let start = Instant::now();
        scale.begin_settle(start);
        assert_eq!(scale.pending_settles(), 2);
        assert!(!scale.tick(start + Duration::from_millis(100)));
        assert!(scale.tick(start + Duration::from_millis(200)));
        assert_eq!(scale.pending_settles(), 1);
        assert!(scale.tick(start + Duration::from_millis(500)));
        assert!(!scale.tick(start + Duration::from_millis(900)));
    }
}
