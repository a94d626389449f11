// Arena: the control surface tying connections to rooms.

use super::connections::{ConnectionError, ConnectionRegistry, ConnectionState};
use super::outbox::Outbox;
use super::registry::{RoomRegistry, RoomRegistryError};
use super::room::{RoomError, RoomHandle};
use super::types::{
    ConnectionHandle, ConnectionId, MatchHistory, MoveRejection, Notice, RoomConfig, RoomStatus,
    RoomSummary, WaiterInfo,
};
use crate::domain::MoveIntent;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Shared configuration for rooms created through the arena.
#[derive(Debug, Clone)]
pub struct ArenaSettings {
    /// Capacity of each room's command queue.
    pub command_channel_capacity: usize,
    /// Tick timeout for rooms created without one; `None` waits for every intent.
    pub default_tick_timeout: Option<Duration>,
}

/// Errors returned by arena control operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    RoomNotFound,
    RoomExists,
    ConnectionNotFound,
    ConnectionBusy { room_id: Arc<str> },
    NotSubscribed,
    Room(RoomError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::RoomNotFound => write!(f, "room not found"),
            RegistryError::RoomExists => write!(f, "room already exists"),
            RegistryError::ConnectionNotFound => write!(f, "connection not found"),
            RegistryError::ConnectionBusy { room_id } => {
                write!(f, "connection is already subscribed to room {room_id}")
            }
            RegistryError::NotSubscribed => write!(f, "connection is not subscribed"),
            RegistryError::Room(err) => write!(f, "{err}"),
        }
    }
}

impl From<RoomError> for RegistryError {
    fn from(err: RoomError) -> Self {
        RegistryError::Room(err)
    }
}

impl From<ConnectionError> for RegistryError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::NotFound => RegistryError::ConnectionNotFound,
            ConnectionError::Busy { room_id } => RegistryError::ConnectionBusy { room_id },
        }
    }
}

impl From<RoomRegistryError> for RegistryError {
    fn from(err: RoomRegistryError) -> Self {
        match err {
            RoomRegistryError::AlreadyExists => RegistryError::RoomExists,
        }
    }
}

#[derive(Debug)]
pub struct Arena {
    settings: ArenaSettings,
    rooms: RoomRegistry,
    connections: ConnectionRegistry,
}

impl Arena {
    pub fn new(settings: ArenaSettings) -> Self {
        Self {
            rooms: RoomRegistry::new(settings.command_channel_capacity),
            connections: ConnectionRegistry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ArenaSettings {
        &self.settings
    }

    async fn room(&self, room_id: &str) -> Result<RoomHandle, RegistryError> {
        self.rooms
            .get_room(room_id)
            .await
            .ok_or(RegistryError::RoomNotFound)
    }

    pub async fn create_room(
        &self,
        room_id: Option<String>,
        config: RoomConfig,
    ) -> Result<RoomStatus, RegistryError> {
        let room = self.rooms.create_room(room_id, config).await?;
        info!(room_id = %room.room_id, "room created");
        Ok(room.status().await?)
    }

    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::new();
        for room in self.rooms.rooms().await {
            match room.status().await {
                Ok(status) => summaries.push(status.into()),
                Err(err) => warn!(room_id = %room.room_id, error = %err, "room unavailable"),
            }
        }
        summaries
    }

    pub async fn room_status(&self, room_id: &str) -> Result<RoomStatus, RegistryError> {
        Ok(self.room(room_id).await?.status().await?)
    }

    pub async fn start(&self, room_id: &str) -> Result<RoomStatus, RegistryError> {
        let room = self.room(room_id).await?;
        room.start().await?;
        Ok(room.status().await?)
    }

    pub async fn reset(&self, room_id: &str) -> Result<RoomStatus, RegistryError> {
        let room = self.room(room_id).await?;
        room.reset().await?;
        Ok(room.status().await?)
    }

    pub async fn history(&self, room_id: &str) -> Result<MatchHistory, RegistryError> {
        Ok(self.room(room_id).await?.history().await?)
    }

    /// Registers a named connection in the waiting pool and greets it.
    pub async fn connect(&self, name: Arc<str>, addr: SocketAddr, outbox: Outbox) -> ConnectionHandle {
        let handle = self.connections.register(name, addr, outbox).await;
        handle.outbox.push(Notice::Waiting {
            connection_id: handle.connection_id,
            name: handle.name.clone(),
        });
        handle
    }

    pub async fn waiters(&self) -> Vec<WaiterInfo> {
        self.connections.waiters().await
    }

    pub async fn connection_state(&self, connection_id: ConnectionId) -> ConnectionState {
        self.connections.state(connection_id).await
    }

    pub async fn subscribe(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
    ) -> Result<(), RegistryError> {
        let room = self.room(room_id).await?;
        let handle = self
            .connections
            .claim(connection_id, room.room_id.clone())
            .await?;

        if let Err(err) = room.subscribe(handle).await {
            self.connections.release(connection_id).await;
            return Err(err.into());
        }
        info!(connection_id, room_id = %room.room_id, "connection subscribed");
        Ok(())
    }

    /// Leaves the current room and returns to the waiting pool.
    pub async fn unsubscribe(&self, connection_id: ConnectionId) -> Result<Arc<str>, RegistryError> {
        let Some(room_id) = self.connections.release(connection_id).await else {
            return match self.connections.state(connection_id).await {
                ConnectionState::Disconnected => Err(RegistryError::ConnectionNotFound),
                _ => Err(RegistryError::NotSubscribed),
            };
        };

        if let Some(room) = self.rooms.get_room(&room_id).await {
            if let Err(err) = room.unsubscribe(connection_id).await {
                warn!(connection_id, room_id = %room_id, error = %err, "room did not know the member");
            }
        }
        info!(connection_id, room_id = %room_id, "connection unsubscribed");
        Ok(room_id)
    }

    /// Routes one parsed move line to the connection's room.
    pub async fn submit_intent(
        &self,
        connection_id: ConnectionId,
        intent: MoveIntent,
    ) -> Result<(), MoveRejection> {
        let ConnectionState::Subscribed { room_id } = self.connections.state(connection_id).await
        else {
            return Err(MoveRejection::NotSubscribed);
        };
        let room = self
            .rooms
            .get_room(&room_id)
            .await
            .ok_or(MoveRejection::NotSubscribed)?;

        room.submit_intent(connection_id, intent)
            .map_err(|err| match err {
                RoomError::Saturated => MoveRejection::Backlogged,
                _ => MoveRejection::NotRunning,
            })
    }

    /// Drops the connection; a living snake it steered dies.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let Some(room_id) = self.connections.remove(connection_id).await else {
            return;
        };
        if let Some(room) = self.rooms.get_room(&room_id).await {
            room.disconnect(connection_id).await;
        }
    }
}
