//! The session: registry ownership and event normalization.
//!
//! A [`Session`] owns one [`PeerRegistry`] and the single subscription to a
//! transport's notification stream. [`Session::run`] drains notifications in
//! delivery order; each one is applied to the registry and translated into
//! at most one [`SessionEvent`] carrying the resolved peer. Mutation and
//! emission for a notification are synchronous, so the roster observed
//! alongside an event always reflects that notification and all prior ones.

use multipeer_transport::Notification;
use multipeer_types::{Peer, PeerId};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::config::Config;
use crate::event::SessionEvent;
use crate::registry::{PeerRegistry, Roster};

/// Handle for stopping a running session. Cheap to clone; stopping twice is
/// a no-op.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<()>,
}

impl ShutdownHandle {
    /// Ask the session loop to stop.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(()).await;
    }
}

/// One discovery session: the peer registry plus the normalizer driving it.
pub struct Session {
    registry: PeerRegistry,
    notifications: mpsc::Receiver<Notification>,
    events: mpsc::Sender<SessionEvent>,
    roster_tx: watch::Sender<Roster>,
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Session {
    /// Create a session consuming the given notification stream.
    ///
    /// Returns the session and the normalized event stream. The event
    /// channel is bounded by `config.session.event_buffer`; the stream
    /// closes when the session stops.
    #[must_use]
    pub fn new(
        config: &Config,
        notifications: mpsc::Receiver<Notification>,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events, events_rx) = mpsc::channel(config.session.event_buffer);
        let (roster_tx, _) = watch::channel(Roster::default());
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                registry: PeerRegistry::new(),
                notifications,
                events,
                roster_tx,
                shutdown_tx,
                shutdown_rx,
            },
            events_rx,
        )
    }

    /// Read-only view of the registry, updated after every notification.
    #[must_use]
    pub fn roster(&self) -> watch::Receiver<Roster> {
        self.roster_tx.subscribe()
    }

    /// Handle for stopping the session from outside the loop.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Run the session until the transport closes its notification stream
    /// or a shutdown is requested. Consumes the session; the notification
    /// subscription is released exactly once, on exit.
    pub async fn run(mut self) {
        info!("session running");
        loop {
            tokio::select! {
                notification = self.notifications.recv() => {
                    match notification {
                        Some(notification) => self.process(notification).await,
                        None => {
                            info!("notification stream closed");
                            break;
                        }
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    info!("session shutdown requested");
                    break;
                }
            }
        }
    }

    async fn process(&mut self, notification: Notification) {
        let event = self.normalize(notification);
        self.roster_tx.send_replace(self.registry.snapshot());
        if let Some(event) = event {
            if self.events.send(event).await.is_err() {
                debug!("event receiver dropped, discarding");
            }
        }
    }

    /// Apply one raw notification to the registry and derive the normalized
    /// event, if any. Performs no I/O and cannot fail; notifications that
    /// reference unknown ids are silent no-ops.
    fn normalize(&mut self, notification: Notification) -> Option<SessionEvent> {
        match notification {
            Notification::PeerFound { id, name } => {
                if self.registry.add(Peer::new(id, name)) {
                    info!(peer = %id, "peer discovered");
                } else {
                    debug!(peer = %id, "duplicate found, keeping existing entry");
                }
                let peer = self.registry.lookup(id)?.clone();
                Some(SessionEvent::PeerFound { peer })
            }
            Notification::PeerConnecting { id } => {
                // Observational: surfaces a transient status, never
                // creates or destroys registry state.
                let peer = self.resolve(id, "connecting")?;
                Some(SessionEvent::PeerConnecting { peer })
            }
            Notification::PeerConnected { id } => {
                if !self.registry.mark_connected(id) {
                    debug!(peer = %id, "connected for unknown peer, ignoring");
                    return None;
                }
                let peer = self.registry.lookup(id)?.clone();
                info!(peer = %peer, "peer connected");
                Some(SessionEvent::PeerConnected { peer })
            }
            Notification::PeerDisconnected { id } => {
                if !self.registry.mark_disconnected(id) {
                    debug!(peer = %id, "disconnected for unknown peer, ignoring");
                    return None;
                }
                let peer = self.registry.lookup(id)?.clone();
                info!(peer = %peer, "peer disconnected");
                Some(SessionEvent::PeerDisconnected { peer })
            }
            Notification::PeerLost { id } => {
                // Snapshot taken by eviction itself; a duplicate `lost`
                // finds nothing and stays silent.
                let peer = self.registry.remove(id)?;
                info!(peer = %peer, "peer lost");
                Some(SessionEvent::PeerLost { peer })
            }
            Notification::InviteReceived { id, invite } => {
                let peer = self.resolve(id, "invite")?;
                info!(peer = %peer, invite = %invite, "invite received");
                Some(SessionEvent::InviteReceived { peer, invite })
            }
            Notification::StreamOpened { id } => {
                let peer = self.resolve(id, "stream")?;
                Some(SessionEvent::StreamOpened { peer })
            }
            Notification::DataReceived { sender, data } => {
                let peer = self.resolve(sender, "data")?;
                Some(SessionEvent::DataReceived { peer, data })
            }
        }
    }

    fn resolve(&self, id: PeerId, kind: &str) -> Option<Peer> {
        let peer = self.registry.lookup(id);
        if peer.is_none() {
            debug!(peer = %id, kind, "notification for unknown peer, ignoring");
        }
        peer.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multipeer_types::{InviteId, PeerId};

    fn test_session() -> (Session, mpsc::Receiver<SessionEvent>) {
        let (_tx, notifications) = mpsc::channel(16);
        Session::new(&Config::default(), notifications)
    }

    fn found(id: PeerId, name: &str) -> Notification {
        Notification::PeerFound {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn found_connected_lost_in_order() {
        let (mut session, _events) = test_session();
        let id = PeerId::new();

        let event = session.normalize(found(id, "Alice")).unwrap();
        match &event {
            SessionEvent::PeerFound { peer } => {
                assert_eq!(peer.id, id);
                assert_eq!(peer.name, "Alice");
                assert!(!peer.connected);
            }
            other => panic!("expected PeerFound, got {other:?}"),
        }
        assert_eq!(session.registry.all_peers().len(), 1);

        let event = session
            .normalize(Notification::PeerConnected { id })
            .unwrap();
        match &event {
            SessionEvent::PeerConnected { peer } => assert!(peer.connected),
            other => panic!("expected PeerConnected, got {other:?}"),
        }

        let event = session.normalize(Notification::PeerLost { id }).unwrap();
        match &event {
            // Pre-eviction snapshot still says connected.
            SessionEvent::PeerLost { peer } => {
                assert_eq!(peer.id, id);
                assert!(peer.connected);
            }
            other => panic!("expected PeerLost, got {other:?}"),
        }
        assert!(session.registry.all_peers().is_empty());
        assert!(session.registry.disconnected_ids().contains(&id));
    }

    #[test]
    fn duplicate_found_never_duplicates_roster() {
        let (mut session, _events) = test_session();
        let id = PeerId::new();

        session.normalize(found(id, "Alice"));
        let event = session.normalize(found(id, "Alice-renamed")).unwrap();

        assert_eq!(session.registry.all_peers().len(), 1);
        // Re-announcement carries the existing entry, name unchanged.
        match event {
            SessionEvent::PeerFound { peer } => assert_eq!(peer.name, "Alice"),
            other => panic!("expected PeerFound, got {other:?}"),
        }
    }

    #[test]
    fn connected_flips_only_that_peer() {
        let (mut session, _events) = test_session();
        let alice = PeerId::new();
        let bob = PeerId::new();
        session.normalize(found(alice, "Alice"));
        session.normalize(found(bob, "Bob"));

        session.normalize(Notification::PeerConnected { id: alice });

        assert!(session.registry.lookup(alice).unwrap().connected);
        assert!(!session.registry.lookup(bob).unwrap().connected);
    }

    #[test]
    fn disconnected_retains_peer_in_roster() {
        let (mut session, _events) = test_session();
        let id = PeerId::new();
        session.normalize(found(id, "Alice"));
        session.normalize(Notification::PeerConnected { id });

        let event = session
            .normalize(Notification::PeerDisconnected { id })
            .unwrap();
        match event {
            SessionEvent::PeerDisconnected { peer } => assert!(!peer.connected),
            other => panic!("expected PeerDisconnected, got {other:?}"),
        }
        assert_eq!(session.registry.all_peers().len(), 1);
        assert!(session.registry.disconnected_ids().contains(&id));
    }

    #[test]
    fn duplicate_lost_records_history_once() {
        let (mut session, _events) = test_session();
        let id = PeerId::new();
        session.normalize(found(id, "Alice"));

        assert!(session.normalize(Notification::PeerLost { id }).is_some());
        assert!(session.normalize(Notification::PeerLost { id }).is_none());
        assert_eq!(session.registry.disconnected_ids().len(), 1);
    }

    #[test]
    fn unknown_ids_produce_no_event_and_no_mutation() {
        let (mut session, _events) = test_session();
        let ghost = PeerId::new();

        assert!(session
            .normalize(Notification::PeerConnecting { id: ghost })
            .is_none());
        assert!(session
            .normalize(Notification::PeerConnected { id: ghost })
            .is_none());
        assert!(session
            .normalize(Notification::PeerDisconnected { id: ghost })
            .is_none());
        assert!(session
            .normalize(Notification::PeerLost { id: ghost })
            .is_none());
        assert!(session
            .normalize(Notification::InviteReceived {
                id: ghost,
                invite: InviteId::new(),
            })
            .is_none());
        assert!(session
            .normalize(Notification::DataReceived {
                sender: ghost,
                data: b"hi".to_vec(),
            })
            .is_none());

        assert!(session.registry.all_peers().is_empty());
        assert!(session.registry.disconnected_ids().is_empty());
    }

    #[test]
    fn connecting_is_observational() {
        let (mut session, _events) = test_session();
        let id = PeerId::new();
        session.normalize(found(id, "Alice"));

        let event = session
            .normalize(Notification::PeerConnecting { id })
            .unwrap();
        assert!(matches!(event, SessionEvent::PeerConnecting { .. }));
        // Status untouched.
        assert!(!session.registry.lookup(id).unwrap().connected);
    }

    #[test]
    fn data_and_invite_carry_resolved_peer() {
        let (mut session, _events) = test_session();
        let id = PeerId::new();
        session.normalize(found(id, "Alice"));

        let invite = InviteId::new();
        match session
            .normalize(Notification::InviteReceived { id, invite })
            .unwrap()
        {
            SessionEvent::InviteReceived {
                peer,
                invite: received,
            } => {
                assert_eq!(peer.name, "Alice");
                assert_eq!(received, invite);
            }
            other => panic!("expected InviteReceived, got {other:?}"),
        }

        match session
            .normalize(Notification::DataReceived {
                sender: id,
                data: b"payload".to_vec(),
            })
            .unwrap()
        {
            SessionEvent::DataReceived { peer, data } => {
                assert_eq!(peer.id, id);
                assert_eq!(data, b"payload");
            }
            other => panic!("expected DataReceived, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_emits_events_and_roster_in_order() {
        let (tx, notifications) = mpsc::channel(16);
        let (session, mut events) = Session::new(&Config::default(), notifications);
        let mut roster = session.roster();
        let shutdown = session.shutdown_handle();
        let handle = tokio::spawn(session.run());

        let id = PeerId::new();
        tx.send(found(id, "Alice")).await.unwrap();
        tx.send(Notification::PeerConnected { id }).await.unwrap();
        tx.send(Notification::PeerLost { id }).await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::PeerFound { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::PeerConnected { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::PeerLost { .. }
        ));

        // Roster reflects everything emitted so far.
        let snapshot = roster.borrow_and_update().clone();
        assert!(snapshot.all_peers().is_empty());
        assert!(snapshot.disconnected_ids().contains(&id));

        shutdown.shutdown().await;
        handle.await.unwrap();
        // Event stream closes with the session.
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn run_stops_when_transport_closes() {
        let (tx, notifications) = mpsc::channel(16);
        let (session, _events) = Session::new(&Config::default(), notifications);
        let handle = tokio::spawn(session.run());

        drop(tx);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("session should stop when the stream closes")
            .unwrap();
    }
}
