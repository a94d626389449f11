// Connection registry: the waiting pool and per-connection room membership.

use super::outbox::Outbox;
use super::types::{ConnectionHandle, ConnectionId, WaiterInfo};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Waiting,
    Subscribed { room_id: Arc<str> },
    Disconnected,
}

/// Errors returned when claiming a connection for a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    NotFound,
    /// Already subscribed to the given room.
    Busy { room_id: Arc<str> },
}

#[derive(Debug)]
struct Entry {
    handle: ConnectionHandle,
    addr: SocketAddr,
    state: ConnectionState,
}

/// Thread-safe registry of live connections.
#[derive(Debug)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, Entry>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Assigns the next id and places the connection in the waiting pool.
    pub async fn register(&self, name: Arc<str>, addr: SocketAddr, outbox: Outbox) -> ConnectionHandle {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = ConnectionHandle {
            connection_id,
            name,
            outbox,
        };
        let mut connections = self.connections.write().await;
        connections.insert(
            connection_id,
            Entry {
                handle: handle.clone(),
                addr,
                state: ConnectionState::Waiting,
            },
        );
        handle
    }

    /// Unknown ids report `Disconnected`.
    pub async fn state(&self, connection_id: ConnectionId) -> ConnectionState {
        let connections = self.connections.read().await;
        connections
            .get(&connection_id)
            .map(|entry| entry.state.clone())
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Marks a waiting connection as subscribed to `room_id`.
    pub async fn claim(
        &self,
        connection_id: ConnectionId,
        room_id: Arc<str>,
    ) -> Result<ConnectionHandle, ConnectionError> {
        let mut connections = self.connections.write().await;
        let entry = connections
            .get_mut(&connection_id)
            .ok_or(ConnectionError::NotFound)?;
        match &entry.state {
            ConnectionState::Subscribed { room_id } => Err(ConnectionError::Busy {
                room_id: room_id.clone(),
            }),
            ConnectionState::Disconnected => Err(ConnectionError::NotFound),
            ConnectionState::Waiting => {
                entry.state = ConnectionState::Subscribed { room_id };
                Ok(entry.handle.clone())
            }
        }
    }

    /// Returns a connection to the waiting pool, yielding the room it left.
    pub async fn release(&self, connection_id: ConnectionId) -> Option<Arc<str>> {
        let mut connections = self.connections.write().await;
        let entry = connections.get_mut(&connection_id)?;
        match std::mem::replace(&mut entry.state, ConnectionState::Waiting) {
            ConnectionState::Subscribed { room_id } => Some(room_id),
            other => {
                entry.state = other;
                None
            }
        }
    }

    /// Drops the connection, yielding the room it was subscribed to.
    pub async fn remove(&self, connection_id: ConnectionId) -> Option<Arc<str>> {
        let mut connections = self.connections.write().await;
        match connections.remove(&connection_id)?.state {
            ConnectionState::Subscribed { room_id } => Some(room_id),
            _ => None,
        }
    }

    /// Connections not subscribed to any room, ordered by id.
    pub async fn waiters(&self) -> Vec<WaiterInfo> {
        let connections = self.connections.read().await;
        let mut waiters: Vec<WaiterInfo> = connections
            .values()
            .filter(|entry| entry.state == ConnectionState::Waiting)
            .map(|entry| WaiterInfo {
                connection_id: entry.handle.connection_id,
                name: entry.handle.name.to_string(),
                addr: entry.addr.to_string(),
            })
            .collect();
        waiters.sort_by_key(|waiter| waiter.connection_id);
        waiters
    }
}
