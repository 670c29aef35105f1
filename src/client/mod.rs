mod action_sender;
mod app;
mod event;
mod input;
mod layout;
mod prompt;
mod render;
mod session;
mod snapshot_listener;
mod tui;
mod ui;

use app::App;
use log::info;

use color_eyre::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::table::prelude::*;
use crate::table::protocol::ServerMessage;

pub use layout::CellMetrics;

use action_sender::ActionSender;
use snapshot_listener::SnapshotListener;

/// The terminal front end of one seat at the table. It only ever talks to
/// the authority through the two channels the transport owns.
pub struct Client {
    viewer: PlayerId,
    metrics: CellMetrics,
    inbound: UnboundedReceiver<ServerMessage>,
    outbound: UnboundedSender<ClientMessage>,
}

impl Client {
    pub fn launch(
        viewer: PlayerId,
        metrics: CellMetrics,
        inbound: UnboundedReceiver<ServerMessage>,
        outbound: UnboundedSender<ClientMessage>,
    ) -> Client {
        info!("Launching client for {viewer}");
        Client {
            viewer,
            metrics,
            inbound,
            outbound,
        }
    }

    /// Blocks until the user quits.
    pub fn run(self) -> Result<()> {
        let mut app = App::new(
            self.viewer,
            self.metrics,
            SnapshotListener::from(self.inbound),
            ActionSender::from(self.outbound),
        );
        app.run()
    }
}
