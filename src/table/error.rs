use thiserror::Error;

use super::snapshot::{CardId, PlayerId, ZoneKind};

/// Rejections raised while decoding messages from the authority.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{owner} {zone} references unknown card `{card}`")]
    UnknownCard {
        owner: PlayerId,
        zone: ZoneKind,
        card: CardId,
    },

    #[error("card `{card}` is listed in both {first} and {second}")]
    DuplicateCard {
        card: CardId,
        first: String,
        second: String,
    },
}
