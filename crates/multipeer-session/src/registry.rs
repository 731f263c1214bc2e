//! The authoritative in-memory peer registry.
//!
//! One registry per session. The session's normalizer is the only writer;
//! the application observes the registry through [`Roster`] snapshots.
//!
//! Eviction policy: a `disconnected` notification retains the peer in the
//! roster with `connected = false`, a `lost` notification evicts it. Both
//! record the id in the disconnected history.

use std::collections::BTreeSet;

use multipeer_types::{Peer, PeerId};

/// Registry of known peers and their connection status.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    /// Known peers in discovery order, unique by id.
    peers: Vec<Peer>,
    /// Ids that have disconnected or been lost at least once.
    disconnected: BTreeSet<PeerId>,
}

impl PeerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an identifier to the currently tracked peer.
    #[must_use]
    pub fn lookup(&self, id: PeerId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// Insert a newly discovered peer.
    ///
    /// A second `add` for an already-known id is an idempotent no-op: the
    /// existing entry is kept untouched. Returns `true` if the peer was
    /// inserted.
    pub fn add(&mut self, peer: Peer) -> bool {
        if self.lookup(peer.id).is_some() {
            return false;
        }
        self.peers.push(peer);
        true
    }

    /// Mark a peer connected. No-op for unknown ids, since transport
    /// notifications can race with teardown. Returns `true` if the id was
    /// known.
    pub fn mark_connected(&mut self, id: PeerId) -> bool {
        match self.peers.iter_mut().find(|p| p.id == id) {
            Some(peer) => {
                peer.connected = true;
                true
            }
            None => false,
        }
    }

    /// Mark a peer disconnected, retaining it in the roster and recording
    /// the id in the disconnected history. No-op for unknown ids. Returns
    /// `true` if the id was known.
    pub fn mark_disconnected(&mut self, id: PeerId) -> bool {
        match self.peers.iter_mut().find(|p| p.id == id) {
            Some(peer) => {
                peer.connected = false;
                self.disconnected.insert(id);
                true
            }
            None => false,
        }
    }

    /// Evict a peer from the roster, recording the id in the disconnected
    /// history. Returns the evicted peer, or `None` if the id was unknown.
    pub fn remove(&mut self, id: PeerId) -> Option<Peer> {
        let index = self.peers.iter().position(|p| p.id == id)?;
        self.disconnected.insert(id);
        Some(self.peers.remove(index))
    }

    /// Currently known peers in discovery order, connected or not.
    #[must_use]
    pub fn all_peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Currently known peers with an established connection.
    pub fn connected_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter().filter(|p| p.connected)
    }

    /// Ids of peers that have disconnected or been lost at least once.
    #[must_use]
    pub fn disconnected_ids(&self) -> &BTreeSet<PeerId> {
        &self.disconnected
    }

    /// Point-in-time snapshot for read-only consumers.
    #[must_use]
    pub fn snapshot(&self) -> Roster {
        Roster {
            peers: self.peers.clone(),
            disconnected: self.disconnected.clone(),
        }
    }
}

/// Read-only snapshot of the registry, published after every notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    peers: Vec<Peer>,
    disconnected: BTreeSet<PeerId>,
}

impl Roster {
    /// Known peers in discovery order.
    #[must_use]
    pub fn all_peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Known peers with an established connection.
    pub fn connected_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter().filter(|p| p.connected)
    }

    /// Ids of peers no longer reachable (disconnected or lost).
    #[must_use]
    pub fn disconnected_ids(&self) -> &BTreeSet<PeerId> {
        &self.disconnected
    }

    /// Look up a peer by id in this snapshot.
    #[must_use]
    pub fn get(&self, id: PeerId) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }
}
