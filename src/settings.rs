use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;

use crate::client::CellMetrics;
use crate::table::prelude::*;

/// Optional file in the working directory, any format `config` understands.
pub const CONFIG_FILE: &str = "tabletop";
/// Environment variables `TABLETOP_<SETTING>` win over the file.
pub const ENV_PREFIX: &str = "TABLETOP";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Settings {
    pub server_addr: String,
    pub room_id: String,
    pub player_id: PlayerId,
    pub player_name: Option<String>,
    pub deck: Option<String>,
    pub cell_width_px: f64,
    pub cell_height_px: f64,
    pub log_file: String,
    pub log_level: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    /// Unknown level names fall back to `info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// The first frame sent on every connection.
    pub fn hello(&self) -> Hello {
        Hello {
            room_id: self.room_id.clone(),
            player_id: self.player_id,
            name: self.player_name.clone().filter(|name| !name.trim().is_empty()),
            deck: self.deck.clone().filter(|deck| !deck.trim().is_empty()),
        }
    }

    pub fn cell_metrics(&self) -> CellMetrics {
        CellMetrics::new(self.cell_width_px, self.cell_height_px)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server_addr", "127.0.0.1:8765")?
        .set_default("room_id", "TEST")?
        .set_default("player_id", "A")?
        .set_default("cell_width_px", 8.0)?
        .set_default("cell_height_px", 16.0)?
        .set_default("log_file", "tabletop.log")?
        .set_default("log_level", "info")
}
