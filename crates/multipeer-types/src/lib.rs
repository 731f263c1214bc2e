//! Shared types for multipeer.
//!
//! This crate contains the types shared across the multipeer workspace:
//! peer and invite identifiers, and the peer entity tracked by the session
//! registry.

pub mod invite;
pub mod peer;

pub use invite::InviteId;
pub use peer::{Peer, PeerId};
