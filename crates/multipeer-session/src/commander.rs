//! Outbound command façade.
//!
//! Stateless pass-through to the transport primitive. Its only job beyond
//! forwarding is resolving [`PeerRef`] arguments to bare identifiers at the
//! boundary, so the transport never sees peer entities.

use std::sync::Arc;

use multipeer_transport::{MultipeerTransport, TransportError};
use multipeer_types::{InviteId, Peer, PeerId};

/// A peer argument for outbound calls: either the entity or its bare id.
#[derive(Debug, Clone)]
pub enum PeerRef {
    Entity(Peer),
    Id(PeerId),
}

impl PeerRef {
    /// The identifier this reference resolves to.
    #[must_use]
    pub fn id(&self) -> PeerId {
        match self {
            Self::Entity(peer) => peer.id,
            Self::Id(id) => *id,
        }
    }
}

impl From<Peer> for PeerRef {
    fn from(peer: Peer) -> Self {
        Self::Entity(peer)
    }
}

impl From<PeerId> for PeerRef {
    fn from(id: PeerId) -> Self {
        Self::Id(id)
    }
}

/// Forwards outbound operations to the transport. Cheap to clone.
#[derive(Clone)]
pub struct Commander {
    transport: Arc<dyn MultipeerTransport>,
}

impl Commander {
    /// Wrap a transport handle.
    pub fn new(transport: Arc<dyn MultipeerTransport>) -> Self {
        Self { transport }
    }

    /// Start advertising on `channel` under the given display name.
    pub async fn advertise(&self, channel: &str, name: &str) -> Result<(), TransportError> {
        self.transport.advertise(channel, name).await
    }

    /// Start browsing `channel` for peers.
    pub async fn browse(&self, channel: &str) -> Result<(), TransportError> {
        self.transport.browse(channel).await
    }

    /// Send a payload to the given peers.
    pub async fn send(
        &self,
        recipients: impl IntoIterator<Item = PeerRef> + Send,
        data: Vec<u8>,
    ) -> Result<(), TransportError> {
        let ids: Vec<PeerId> = recipients.into_iter().map(|r| r.id()).collect();
        self.transport.send(&ids, data).await
    }

    /// Send a payload to every connected peer.
    pub async fn broadcast(&self, data: Vec<u8>) -> Result<(), TransportError> {
        self.transport.broadcast(data).await
    }

    /// Invite a discovered peer to connect.
    pub async fn invite(&self, peer: impl Into<PeerRef> + Send) -> Result<(), TransportError> {
        self.transport.invite(peer.into().id()).await
    }

    /// Accept or decline a received invitation.
    pub async fn rsvp(&self, invite: InviteId, accept: bool) -> Result<(), TransportError> {
        self.transport.rsvp(invite, accept).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_ref_resolves_entity_and_id() {
        let id = PeerId::new();
        let peer = Peer::new(id, "Alice");
        assert_eq!(PeerRef::from(peer).id(), id);
        assert_eq!(PeerRef::from(id).id(), id);
    }
}
