pub mod action;
pub mod asset;
pub mod error;
pub mod placement;
pub mod protocol;
pub mod scale;
pub mod snapshot;
pub mod visibility;

pub mod prelude;
