//! Relay hub - names every connection and fans inbound input out to all peers
//!
//! The relay computes no game outcome. It keeps a single piece of state, connection id to
//! display name, and re-emits every valid inbound event on one broadcast channel stamped with
//! the sender's identity. Each connection task calls in here sequentially, so events from one
//! connection are broadcast in the order they were received.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, PeerId, PeerPointer, Point, ServerMsg};

/// Longest display name kept, in characters
pub const MAX_NAME_CHARS: usize = 24;

/// Process-scoped relay registry
pub struct Relay {
    names: DashMap<PeerId, String>,
    connections: AtomicUsize,
    tx: broadcast::Sender<ServerMsg>,
}

impl Relay {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            names: DashMap::new(),
            connections: AtomicUsize::new(0),
            tx,
        }
    }

    /// Subscribe to the fan-out. Subscribe before [`Relay::connect`] so the peer sees its own join.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.tx.subscribe()
    }

    /// Register a new connection and issue its identity
    pub fn connect(&self) -> PeerId {
        let id = Uuid::new_v4();
        let count = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
        info!(conn_id = %id, connections = count, "Peer connected");
        id
    }

    /// Apply one validated inbound message. Returns the broadcast event, if any.
    pub fn handle(&self, id: PeerId, msg: ClientMsg) -> Option<ServerMsg> {
        match msg {
            ClientMsg::SetName { name } => self.set_name(id, &name),
            ClientMsg::Aim(point) => Some(self.aim(id, point)),
            ClientMsg::Slash(point) => Some(self.slash(id, point)),
        }
    }

    /// Store a trimmed, truncated name and announce it. Blank names are ignored.
    pub fn set_name(&self, id: PeerId, raw: &str) -> Option<ServerMsg> {
        let name = clean_name(raw)?;
        self.names.insert(id, name.clone());
        debug!(conn_id = %id, name = %name, "Name set");
        Some(self.emit(ServerMsg::Join { id, name }))
    }

    pub fn aim(&self, id: PeerId, point: Point) -> ServerMsg {
        self.emit(ServerMsg::Aim(self.stamp(id, point)))
    }

    pub fn slash(&self, id: PeerId, point: Point) -> ServerMsg {
        self.emit(ServerMsg::Slash(self.stamp(id, point)))
    }

    /// Announce the departure and forget the name
    pub fn disconnect(&self, id: PeerId) -> ServerMsg {
        let msg = self.emit(ServerMsg::Leave { id });
        self.names.remove(&id);
        let count = self
            .connections
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1);
        info!(conn_id = %id, connections = count, "Peer disconnected");
        msg
    }

    pub fn name_of(&self, id: &PeerId) -> Option<String> {
        self.names.get(id).map(|n| n.value().clone())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn named_count(&self) -> usize {
        self.names.len()
    }

    fn stamp(&self, id: PeerId, point: Point) -> PeerPointer {
        PeerPointer {
            id,
            x: point.x,
            y: point.y,
            name: self.name_of(&id).unwrap_or_default(),
        }
    }

    fn emit(&self, msg: ServerMsg) -> ServerMsg {
        // No subscribers is fine: nobody is watching yet
        let _ = self.tx.send(msg.clone());
        msg
    }
}

/// Trim, reject blank, keep at most [`MAX_NAME_CHARS`] characters
pub fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn relay() -> (Relay, broadcast::Receiver<ServerMsg>) {
        let relay = Relay::new(16);
        let rx = relay.subscribe();
        (relay, rx)
    }

    #[test]
    fn aim_preserves_coordinates_and_stamps_identity() {
        let (relay, mut rx) = relay();
        let id = relay.connect();

        relay.aim(id, Point { x: 0.123456789, y: 1.0 });
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerMsg::Aim(PeerPointer {
                id,
                x: 0.123456789,
                y: 1.0,
                name: String::new(),
            })
        );

        relay.set_name(id, "Mika");
        let _join = rx.try_recv().unwrap();
        relay.slash(id, Point { x: 0.0, y: 0.5 });
        match rx.try_recv().unwrap() {
            ServerMsg::Slash(p) => {
                assert_eq!(p.name, "Mika");
                assert_eq!((p.x, p.y), (0.0, 0.5));
            }
            other => panic!("expected slash, got {other:?}"),
        }
    }

    #[test]
    fn blank_names_are_ignored() {
        let (relay, mut rx) = relay();
        let id = relay.connect();

        assert!(relay.set_name(id, "").is_none());
        assert!(relay.set_name(id, "   ").is_none());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(relay.named_count(), 0);
    }

    #[test]
    fn long_names_are_truncated_to_24_chars() {
        let (relay, mut rx) = relay();
        let id = relay.connect();

        relay.set_name(id, &"a".repeat(100));
        let expected = "a".repeat(24);
        assert_eq!(relay.name_of(&id), Some(expected.clone()));
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerMsg::Join { id, name: expected }
        );
    }

    #[test]
    fn names_are_trimmed_and_counted_in_chars() {
        assert_eq!(clean_name("  Ren  "), Some("Ren".to_string()));
        let emoji = "🍉".repeat(30);
        assert_eq!(clean_name(&emoji).map(|n| n.chars().count()), Some(24));
    }

    #[test]
    fn disconnect_announces_leave_and_forgets_name() {
        let (relay, mut rx) = relay();
        let id = relay.connect();
        relay.set_name(id, "Aoi");
        let _join = rx.try_recv().unwrap();

        assert_eq!(relay.disconnect(id), ServerMsg::Leave { id });
        assert_eq!(rx.try_recv().unwrap(), ServerMsg::Leave { id });
        assert_eq!(relay.name_of(&id), None);
        assert_eq!(relay.connection_count(), 0);
    }

    #[test]
    fn events_from_one_connection_keep_their_order() {
        let (relay, mut rx) = relay();
        let id = relay.connect();

        relay.handle(id, ClientMsg::SetName { name: "Kai".into() });
        relay.handle(id, ClientMsg::Aim(Point { x: 0.1, y: 0.1 }));
        relay.handle(id, ClientMsg::Slash(Point { x: 0.2, y: 0.2 }));
        relay.disconnect(id);

        let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|m| match m {
                ServerMsg::Join { .. } => "join",
                ServerMsg::Aim(_) => "aim",
                ServerMsg::Slash(_) => "slash",
                ServerMsg::Leave { .. } => "leave",
            })
            .collect();
        assert_eq!(kinds, ["join", "aim", "slash", "leave"]);
    }
}
