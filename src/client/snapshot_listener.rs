use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};
use log::{debug, error, info, warn};

use crate::table::prelude::*;
use crate::table::protocol::ServerMessage;

/// Connection status shown in the status bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Waiting,
    Ok(Option<String>),
    Rejected(Option<String>),
    Disconnected,
}

pub struct SnapshotListener {
    receiver: UnboundedReceiver<ServerMessage>,
    status: LinkStatus,
}

impl SnapshotListener {
    pub fn from(receiver: UnboundedReceiver<ServerMessage>) -> Self {
        Self {
            receiver,
            status: LinkStatus::Waiting,
        }
    }

    pub fn status(&self) -> &LinkStatus {
        &self.status
    }

    /// Drains everything the authority sent since the last call. Only the
    /// newest snapshot matters, since each one replaces the last wholesale.
    pub fn update(&mut self) -> Option<Snapshot> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(ServerMessage::State { state }) => {
                    debug!("Received snapshot (turn {}, phase {})", state.turn, state.phase);
                    if latest.replace(state).is_some() {
                        debug!("Superseded an unrendered snapshot");
                    }
                }
                Ok(ServerMessage::Ack { ok: true, msg }) => {
                    info!("Authority acknowledged: {}", msg.as_deref().unwrap_or("ok"));
                    self.status = LinkStatus::Ok(msg);
                }
                Ok(ServerMessage::Ack { ok: false, msg }) => {
                    warn!("Authority rejected a request: {}", msg.as_deref().unwrap_or("no reason given"));
                    self.status = LinkStatus::Rejected(msg);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.status != LinkStatus::Disconnected {
                        error!("Lost connection to the authority");
                        self.status = LinkStatus::Disconnected;
                    }
                    break;
                }
            }
        }
        if latest.is_some() && self.status == LinkStatus::Waiting {
            self.status = LinkStatus::Ok(None);
        }
        latest
    }
}
