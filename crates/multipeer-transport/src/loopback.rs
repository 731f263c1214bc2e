//! In-process loopback transport.
//!
//! A [`LoopbackHub`] stands in for the platform primitive: endpoints attach
//! to it, advertise and browse named channels, invite each other, and
//! exchange payloads, all delivered as [`Notification`]s over per-endpoint
//! channels. Used by integration tests and the demo binary.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use multipeer_types::{InviteId, PeerId};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{MultipeerTransport, Notification, TransportError};

const NOTIFY_BUFFER: usize = 256;

type Outgoing = (mpsc::Sender<Notification>, Notification);

struct EndpointState {
    name: String,
    advertising: Option<String>,
    browsing: Option<String>,
    /// Peers this endpoint has been told about via `PeerFound`.
    known: HashSet<PeerId>,
    connected: HashSet<PeerId>,
    notify: mpsc::Sender<Notification>,
}

struct PendingInvite {
    from: PeerId,
    to: PeerId,
}

#[derive(Default)]
struct HubState {
    endpoints: HashMap<PeerId, EndpointState>,
    invites: HashMap<InviteId, PendingInvite>,
}

impl HubState {
    /// Queue a `PeerFound` for `subject` at `observer`, once.
    fn mark_found(&mut self, observer: PeerId, subject: PeerId, out: &mut Vec<Outgoing>) {
        let Some(name) = self.endpoints.get(&subject).map(|e| e.name.clone()) else {
            return;
        };
        if let Some(obs) = self.endpoints.get_mut(&observer) {
            if obs.known.insert(subject) {
                out.push((
                    obs.notify.clone(),
                    Notification::PeerFound { id: subject, name },
                ));
            }
        }
    }

    fn notify(&self, target: PeerId, notification: Notification, out: &mut Vec<Outgoing>) {
        if let Some(endpoint) = self.endpoints.get(&target) {
            out.push((endpoint.notify.clone(), notification));
        }
    }
}

async fn flush(out: Vec<Outgoing>) {
    for (tx, notification) in out {
        if tx.send(notification).await.is_err() {
            debug!("notification receiver dropped, discarding");
        }
    }
}

/// An in-process hub connecting loopback endpoints.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint under the given display name.
    ///
    /// Returns the endpoint handle and the receiver its notifications are
    /// delivered on.
    pub fn attach(&self, name: &str) -> (LoopbackEndpoint, mpsc::Receiver<Notification>) {
        let (notify, rx) = mpsc::channel(NOTIFY_BUFFER);
        let id = PeerId::new();
        let endpoint = EndpointState {
            name: name.to_string(),
            advertising: None,
            browsing: None,
            known: HashSet::new(),
            connected: HashSet::new(),
            notify,
        };
        self.state.lock().unwrap().endpoints.insert(id, endpoint);
        debug!(peer = %id, name, "endpoint attached");
        (
            LoopbackEndpoint {
                id,
                state: Arc::clone(&self.state),
            },
            rx,
        )
    }

    /// Simulate a peer opening a byte stream to `target`.
    pub async fn open_stream(&self, from: PeerId, target: PeerId) {
        let mut out = Vec::new();
        {
            let hub = self.state.lock().unwrap();
            hub.notify(target, Notification::StreamOpened { id: from }, &mut out);
        }
        flush(out).await;
    }

    /// Tear down the connection between two endpoints without removing
    /// either from the network.
    pub async fn disconnect(&self, a: PeerId, b: PeerId) {
        let mut out = Vec::new();
        {
            let mut hub = self.state.lock().unwrap();
            if let Some(ea) = hub.endpoints.get_mut(&a) {
                ea.connected.remove(&b);
            }
            if let Some(eb) = hub.endpoints.get_mut(&b) {
                eb.connected.remove(&a);
            }
            hub.notify(a, Notification::PeerDisconnected { id: b }, &mut out);
            hub.notify(b, Notification::PeerDisconnected { id: a }, &mut out);
        }
        flush(out).await;
    }
}

/// One attached endpoint of a [`LoopbackHub`].
pub struct LoopbackEndpoint {
    id: PeerId,
    state: Arc<Mutex<HubState>>,
}

impl LoopbackEndpoint {
    /// The transport-assigned identifier of this endpoint.
    #[must_use]
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Remove this endpoint from the hub, delivering `PeerLost` to every
    /// endpoint that had found it.
    pub async fn detach(&self) {
        let mut out = Vec::new();
        {
            let mut hub = self.state.lock().unwrap();
            if hub.endpoints.remove(&self.id).is_none() {
                return;
            }
            hub.invites
                .retain(|_, inv| inv.from != self.id && inv.to != self.id);
            for endpoint in hub.endpoints.values_mut() {
                endpoint.connected.remove(&self.id);
                if endpoint.known.remove(&self.id) {
                    out.push((
                        endpoint.notify.clone(),
                        Notification::PeerLost { id: self.id },
                    ));
                }
            }
        }
        debug!(peer = %self.id, "endpoint detached");
        flush(out).await;
    }
}

#[async_trait]
impl MultipeerTransport for LoopbackEndpoint {
    async fn advertise(&self, channel: &str, name: &str) -> Result<(), TransportError> {
        let mut out = Vec::new();
        {
            let mut hub = self.state.lock().unwrap();
            let me = hub
                .endpoints
                .get_mut(&self.id)
                .ok_or(TransportError::Detached)?;
            me.name = name.to_string();
            me.advertising = Some(channel.to_string());

            let browsers: Vec<PeerId> = hub
                .endpoints
                .iter()
                .filter(|(id, e)| **id != self.id && e.browsing.as_deref() == Some(channel))
                .map(|(id, _)| *id)
                .collect();
            for browser in browsers {
                hub.mark_found(browser, self.id, &mut out);
            }
        }
        flush(out).await;
        Ok(())
    }

    async fn browse(&self, channel: &str) -> Result<(), TransportError> {
        let mut out = Vec::new();
        {
            let mut hub = self.state.lock().unwrap();
            let me = hub
                .endpoints
                .get_mut(&self.id)
                .ok_or(TransportError::Detached)?;
            me.browsing = Some(channel.to_string());

            let advertisers: Vec<PeerId> = hub
                .endpoints
                .iter()
                .filter(|(id, e)| **id != self.id && e.advertising.as_deref() == Some(channel))
                .map(|(id, _)| *id)
                .collect();
            for advertiser in advertisers {
                hub.mark_found(self.id, advertiser, &mut out);
            }
        }
        flush(out).await;
        Ok(())
    }

    async fn send(&self, recipients: &[PeerId], data: Vec<u8>) -> Result<(), TransportError> {
        let mut out = Vec::new();
        {
            let hub = self.state.lock().unwrap();
            let me = hub.endpoints.get(&self.id).ok_or(TransportError::Detached)?;
            for recipient in recipients {
                if !hub.endpoints.contains_key(recipient) {
                    return Err(TransportError::UnknownPeer(*recipient));
                }
                if !me.connected.contains(recipient) {
                    return Err(TransportError::NotConnected(*recipient));
                }
                hub.notify(
                    *recipient,
                    Notification::DataReceived {
                        sender: self.id,
                        data: data.clone(),
                    },
                    &mut out,
                );
            }
        }
        flush(out).await;
        Ok(())
    }

    async fn broadcast(&self, data: Vec<u8>) -> Result<(), TransportError> {
        let mut out = Vec::new();
        {
            let hub = self.state.lock().unwrap();
            let me = hub.endpoints.get(&self.id).ok_or(TransportError::Detached)?;
            for recipient in &me.connected {
                hub.notify(
                    *recipient,
                    Notification::DataReceived {
                        sender: self.id,
                        data: data.clone(),
                    },
                    &mut out,
                );
            }
        }
        flush(out).await;
        Ok(())
    }

    async fn invite(&self, peer: PeerId) -> Result<(), TransportError> {
        let mut out = Vec::new();
        {
            let mut hub = self.state.lock().unwrap();
            if !hub.endpoints.contains_key(&self.id) {
                return Err(TransportError::Detached);
            }
            if !hub.endpoints.contains_key(&peer) {
                return Err(TransportError::UnknownPeer(peer));
            }
            // Advertisers may receive invites from browsers they never
            // browsed for, so surface the inviter first.
            hub.mark_found(peer, self.id, &mut out);

            let invite = InviteId::new();
            hub.invites.insert(
                invite,
                PendingInvite {
                    from: self.id,
                    to: peer,
                },
            );
            hub.notify(
                peer,
                Notification::InviteReceived {
                    id: self.id,
                    invite,
                },
                &mut out,
            );
        }
        flush(out).await;
        Ok(())
    }

    async fn rsvp(&self, invite: InviteId, accept: bool) -> Result<(), TransportError> {
        let mut out = Vec::new();
        {
            let mut hub = self.state.lock().unwrap();
            if !hub.endpoints.contains_key(&self.id) {
                return Err(TransportError::Detached);
            }
            let pending = match hub.invites.remove(&invite) {
                Some(p) if p.to == self.id => p,
                _ => return Err(TransportError::UnknownInvite(invite)),
            };
            if !accept {
                return Ok(());
            }
            let other = pending.from;
            if !hub.endpoints.contains_key(&other) {
                return Err(TransportError::UnknownPeer(other));
            }

            hub.mark_found(self.id, other, &mut out);
            hub.notify(self.id, Notification::PeerConnecting { id: other }, &mut out);
            hub.notify(other, Notification::PeerConnecting { id: self.id }, &mut out);

            if let Some(me) = hub.endpoints.get_mut(&self.id) {
                me.connected.insert(other);
            }
            if let Some(them) = hub.endpoints.get_mut(&other) {
                them.connected.insert(self.id);
            }
            hub.notify(self.id, Notification::PeerConnected { id: other }, &mut out);
            hub.notify(other, Notification::PeerConnected { id: self.id }, &mut out);
        }
        flush(out).await;
        Ok(())
    }
}
