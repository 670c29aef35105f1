pub use crate::table::{
    action::*,
    error::*,
    placement::{PlacedCard, ZoneRect},
    scale::{Container, Side},
    snapshot::*,
    visibility::DisplayMode,
};
