//! Identity- and room-keyed registry of live connections.

use super::HubError;
use crate::crypto::{CredentialVerifier, ParticipantId};
use crate::messages::OutboundMessage;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub type ConnectionId = u64;

/// Outbound side of one client connection
pub type OutboundSender = mpsc::UnboundedSender<OutboundMessage>;

struct ConnectionEntry {
    sender: OutboundSender,
    identity: Option<ParticipantId>,
    rooms: HashSet<String>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    by_identity: HashMap<ParticipantId, HashSet<ConnectionId>>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

impl Registry {
    fn unbind_identity(&mut self, id: ConnectionId, identity: &ParticipantId) {
        if let Some(set) = self.by_identity.get_mut(identity) {
            set.remove(&id);
            if set.is_empty() {
                self.by_identity.remove(identity);
            }
        }
    }

    fn remove_from_room(&mut self, id: ConnectionId, game_id: &str) {
        if let Some(set) = self.rooms.get_mut(game_id) {
            set.remove(&id);
            if set.is_empty() {
                self.rooms.remove(game_id);
            }
        }
    }

    fn senders<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ConnectionId>,
    ) -> Vec<(ConnectionId, OutboundSender)> {
        ids.into_iter()
            .filter_map(|id| {
                self.connections
                    .get(id)
                    .map(|entry| (*id, entry.sender.clone()))
            })
            .collect()
    }
}

/// Shared broadcast registry.
///
/// All structural changes happen under one write lock; sends work on a snapshot
/// of the target senders taken under the read lock, so a broadcast reaches
/// exactly the connections registered when it started.
pub struct ConnectionHub {
    verifier: Arc<dyn CredentialVerifier>,
    registry: RwLock<Registry>,
    next_id: AtomicU64,
}

impl ConnectionHub {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            registry: RwLock::new(Registry::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new unauthenticated connection
    pub fn register(&self, sender: OutboundSender) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.write().connections.insert(
            id,
            ConnectionEntry {
                sender,
                identity: None,
                rooms: HashSet::new(),
            },
        );
        debug!(connection = id, "Connection registered");
        id
    }

    /// Verify `credential` and bind the connection to the identity it names.
    ///
    /// Re-authenticating moves the connection to the new identity.
    pub fn authenticate(
        &self,
        connection: ConnectionId,
        credential: &str,
    ) -> Result<ParticipantId, HubError> {
        let identity = self.verifier.verify(credential).map_err(|e| {
            warn!(connection, error = %e, "Credential rejected");
            HubError::Unauthenticated(e.to_string())
        })?;

        let mut registry = self.registry.write();
        let previous = match registry.connections.get_mut(&connection) {
            Some(entry) => entry.identity.replace(identity.clone()),
            None => return Err(HubError::Unauthenticated("connection closed".to_string())),
        };

        if let Some(previous) = previous {
            registry.unbind_identity(connection, &previous);
        }
        registry
            .by_identity
            .entry(identity.clone())
            .or_default()
            .insert(connection);

        info!(connection, participant = %identity, "Connection authenticated");
        Ok(identity)
    }

    pub fn identity_of(&self, connection: ConnectionId) -> Option<ParticipantId> {
        self.registry
            .read()
            .connections
            .get(&connection)
            .and_then(|entry| entry.identity.clone())
    }

    /// Identity bound to `connection`, or `Unauthenticated`
    pub fn require_identity(&self, connection: ConnectionId) -> Result<ParticipantId, HubError> {
        self.identity_of(connection)
            .ok_or_else(HubError::unauthenticated)
    }

    /// Subscribe an authenticated connection to a game room
    pub fn join(&self, connection: ConnectionId, game_id: &str) -> Result<(), HubError> {
        let mut registry = self.registry.write();
        let entry = registry
            .connections
            .get_mut(&connection)
            .filter(|entry| entry.identity.is_some())
            .ok_or_else(HubError::unauthenticated)?;

        entry.rooms.insert(game_id.to_string());
        registry
            .rooms
            .entry(game_id.to_string())
            .or_default()
            .insert(connection);

        debug!(connection, game_id, "Joined room");
        Ok(())
    }

    /// Subscribe every live connection of `identity` to a room; returns how many
    pub fn join_identity(&self, identity: &ParticipantId, game_id: &str) -> usize {
        let mut registry = self.registry.write();
        let ids: Vec<ConnectionId> = registry
            .by_identity
            .get(identity)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        if ids.is_empty() {
            return 0;
        }

        for id in &ids {
            if let Some(entry) = registry.connections.get_mut(id) {
                entry.rooms.insert(game_id.to_string());
            }
        }
        registry
            .rooms
            .entry(game_id.to_string())
            .or_default()
            .extend(ids.iter().copied());

        ids.len()
    }

    /// Unsubscribe from a room, reporting whether the connection was in it
    pub fn leave(&self, connection: ConnectionId, game_id: &str) -> Result<bool, HubError> {
        let mut registry = self.registry.write();
        let entry = registry
            .connections
            .get_mut(&connection)
            .filter(|entry| entry.identity.is_some())
            .ok_or_else(HubError::unauthenticated)?;

        let was_member = entry.rooms.remove(game_id);
        registry.remove_from_room(connection, game_id);

        debug!(connection, game_id, was_member, "Left room");
        Ok(was_member)
    }

    /// Remove every trace of a connection. Safe to call more than once.
    pub fn on_disconnect(&self, connection: ConnectionId) {
        let mut registry = self.registry.write();
        let Some(entry) = registry.connections.remove(&connection) else {
            return;
        };

        if let Some(identity) = &entry.identity {
            registry.unbind_identity(connection, identity);
        }
        for game_id in &entry.rooms {
            registry.remove_from_room(connection, game_id);
        }

        debug!(connection, "Connection removed from hub");
    }

    /// Send directly to one connection
    pub fn send_to(&self, connection: ConnectionId, message: OutboundMessage) -> bool {
        let sender = self
            .registry
            .read()
            .connections
            .get(&connection)
            .map(|entry| entry.sender.clone());

        match sender {
            Some(sender) => deliver(connection, &sender, message),
            None => false,
        }
    }

    /// Best-effort send to every live connection of `identity`; returns deliveries
    pub fn notify_identity(&self, identity: &ParticipantId, message: OutboundMessage) -> usize {
        let targets = {
            let registry = self.registry.read();
            match registry.by_identity.get(identity) {
                Some(ids) => registry.senders(ids),
                None => Vec::new(),
            }
        };
        fan_out(targets, message)
    }

    /// Best-effort send to every connection in a room; returns deliveries
    pub fn broadcast_room(&self, game_id: &str, message: OutboundMessage) -> usize {
        let targets = {
            let registry = self.registry.read();
            match registry.rooms.get(game_id) {
                Some(ids) => registry.senders(ids),
                None => Vec::new(),
            }
        };
        fan_out(targets, message)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.read().connections.len()
    }

    pub fn room_size(&self, game_id: &str) -> usize {
        self.registry
            .read()
            .rooms
            .get(game_id)
            .map_or(0, HashSet::len)
    }
}

fn deliver(connection: ConnectionId, sender: &OutboundSender, message: OutboundMessage) -> bool {
    match sender.send(message) {
        Ok(()) => true,
        Err(_) => {
            warn!(connection, "Dropping message for closed connection");
            false
        }
    }
}

fn fan_out(targets: Vec<(ConnectionId, OutboundSender)>, message: OutboundMessage) -> usize {
    targets
        .iter()
        .filter(|(id, sender)| deliver(*id, sender, message.clone()))
        .count()
}
