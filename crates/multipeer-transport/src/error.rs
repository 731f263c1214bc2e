//! Transport boundary errors.

use multipeer_types::{InviteId, PeerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unknown peer: {0}")]
    UnknownPeer(PeerId),

    #[error("peer not connected: {0}")]
    NotConnected(PeerId),

    #[error("unknown invitation: {0}")]
    UnknownInvite(InviteId),

    #[error("endpoint detached from hub")]
    Detached,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
