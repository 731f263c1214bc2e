//! Transport boundary for multipeer.
//!
//! Defines the [`MultipeerTransport`] trait for the outbound operations a
//! session forwards to the platform primitive, and the raw [`Notification`]
//! stream the primitive delivers inbound. The actual wireless transport
//! (session establishment, encryption, framing) lives behind this boundary;
//! the [`loopback`] module provides an in-process implementation for tests
//! and demos.

use async_trait::async_trait;
use multipeer_types::{InviteId, PeerId};

pub mod error;
pub mod loopback;

pub use error::TransportError;
pub use loopback::{LoopbackEndpoint, LoopbackHub};

/// A raw notification delivered by the transport primitive.
///
/// Notifications carry bare identifiers and transport-supplied fragments;
/// the session layer resolves them against its registry before anything
/// reaches the application.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A peer appeared on the browsed channel.
    PeerFound { id: PeerId, name: String },
    /// A connection attempt to/from a peer is in progress.
    PeerConnecting { id: PeerId },
    /// A peer connection was established.
    PeerConnected { id: PeerId },
    /// A peer connection was torn down; the peer may still be in range.
    PeerDisconnected { id: PeerId },
    /// A peer left the network entirely.
    PeerLost { id: PeerId },
    /// A peer invited us to connect.
    InviteReceived { id: PeerId, invite: InviteId },
    /// A peer opened a byte stream to us.
    StreamOpened { id: PeerId },
    /// A peer sent us a data payload.
    DataReceived { sender: PeerId, data: Vec<u8> },
}

/// Outbound operations forwarded to the transport primitive.
///
/// All methods are thin pass-throughs with no session state. The original
/// platform API reports completion through optional callbacks; here each
/// fallible operation returns a `Result` and fire-and-forget callers simply
/// ignore it.
#[async_trait]
pub trait MultipeerTransport: Send + Sync + 'static {
    /// Start advertising on `channel` under the given display name.
    async fn advertise(&self, channel: &str, name: &str) -> Result<(), TransportError>;

    /// Start browsing `channel` for advertised peers.
    async fn browse(&self, channel: &str) -> Result<(), TransportError>;

    /// Send a payload to the given connected peers.
    async fn send(&self, recipients: &[PeerId], data: Vec<u8>) -> Result<(), TransportError>;

    /// Send a payload to every connected peer.
    async fn broadcast(&self, data: Vec<u8>) -> Result<(), TransportError>;

    /// Invite a discovered peer to connect.
    async fn invite(&self, peer: PeerId) -> Result<(), TransportError>;

    /// Accept or decline a received invitation.
    async fn rsvp(&self, invite: InviteId, accept: bool) -> Result<(), TransportError>;
}
