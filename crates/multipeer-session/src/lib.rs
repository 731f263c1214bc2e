//! Core session layer for multipeer.
//!
//! Implements the peer registry and the event-normalization state machine:
//! raw transport notifications go in, a deduplicated stream of
//! [`SessionEvent`]s carrying resolved peers comes out, and the
//! [`Roster`] snapshot answers "who do we know about" at any point.
//! Outbound operations go through the stateless [`Commander`] façade.

pub mod commander;
pub mod config;
pub mod error;
pub mod event;
pub mod registry;
pub mod session;
pub mod setup;

pub use commander::{Commander, PeerRef};
pub use config::Config;
pub use error::SessionError;
pub use event::SessionEvent;
pub use registry::{PeerRegistry, Roster};
pub use session::{Session, ShutdownHandle};
