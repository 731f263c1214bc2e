//! Invitation identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a pending invitation, used to RSVP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InviteId(Uuid);

impl InviteId {
    /// Generate a new random invite ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an invite ID from an existing UUID.
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

impl Default for InviteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InviteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_id_unique() {
        assert_ne!(InviteId::new(), InviteId::new());
    }

    #[test]
    fn invite_id_serde_roundtrip() {
        let id = InviteId::new();
        let json = serde_json::to_string(&id).unwrap();
        let decoded: InviteId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, decoded);
    }
}
