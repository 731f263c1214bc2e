//! Peer identity and entity types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a peer within one discovery session.
///
/// Assigned by the transport layer; opaque and stable for the lifetime of
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(Uuid);

impl PeerId {
    /// Generate a new random peer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a peer ID from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remote participant in the peer-to-peer session.
///
/// Peers are owned by the session's registry; events and roster snapshots
/// carry clones taken at emission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Transport-assigned identifier.
    pub id: PeerId,
    /// Display name supplied at discovery time, immutable thereafter.
    pub name: String,
    /// Connection status; starts `false`, toggled by lifecycle events.
    pub connected: bool,
}

impl Peer {
    /// Create a newly discovered peer (not yet connected).
    #[must_use]
    pub fn new(id: PeerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            connected: false,
        }
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
