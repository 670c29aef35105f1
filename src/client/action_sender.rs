use color_eyre::Result;
use log::{error, info};
use tokio::sync::mpsc::UnboundedSender;

use crate::table::prelude::*;

/// Hands action requests to the transport. Nothing is applied locally; the
/// next snapshot shows whatever the authority made of them.
pub struct ActionSender {
    sender: UnboundedSender<ClientMessage>,
}

impl ActionSender {
    pub fn from(sender: UnboundedSender<ClientMessage>) -> Self {
        Self { sender }
    }

    pub fn send(&self, action: ActionRequest) -> Result<()> {
        info!("Requesting {action:?}");
        if let Err(e) = self.sender.send(ClientMessage::Action(action)) {
            error!("Failed to hand request to the transport: {e}");
            return Err(e.into());
        }
        Ok(())
    }
}
