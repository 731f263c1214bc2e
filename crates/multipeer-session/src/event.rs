//! Normalized application-facing events.

use multipeer_types::{InviteId, Peer};

/// An event emitted by the session after normalizing a raw transport
/// notification.
///
/// Every variant carries the resolved [`Peer`] as the registry saw it right
/// after the mutation the event reflects, so the application observes peers
/// through one consistent shape regardless of which notification produced
/// them. `PeerLost` carries the snapshot taken just before eviction.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A peer was discovered (or re-announced itself).
    PeerFound { peer: Peer },
    /// A connection attempt involving this peer is in progress.
    PeerConnecting { peer: Peer },
    /// The peer is now connected.
    PeerConnected { peer: Peer },
    /// The peer disconnected but remains in the roster.
    PeerDisconnected { peer: Peer },
    /// The peer left the network and was evicted from the roster.
    PeerLost { peer: Peer },
    /// The peer invited us to connect.
    InviteReceived { peer: Peer, invite: InviteId },
    /// The peer opened a byte stream to us.
    StreamOpened { peer: Peer },
    /// The peer sent us a payload.
    DataReceived { peer: Peer, data: Vec<u8> },
}

impl SessionEvent {
    /// The resolved peer this event concerns.
    #[must_use]
    pub fn peer(&self) -> &Peer {
        match self {
            Self::PeerFound { peer }
            | Self::PeerConnecting { peer }
            | Self::PeerConnected { peer }
            | Self::PeerDisconnected { peer }
            | Self::PeerLost { peer }
            | Self::InviteReceived { peer, .. }
            | Self::StreamOpened { peer }
            | Self::DataReceived { peer, .. } => peer,
        }
    }
}
