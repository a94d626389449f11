// Room registry: creates room actors and looks them up by id.

use super::room::{RoomHandle, spawn_room};
use super::types::RoomConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Errors returned by room registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRegistryError {
    /// Room already exists and cannot be re-created.
    AlreadyExists,
}

#[derive(Debug, Default)]
struct Rooms {
    by_id: HashMap<String, RoomHandle>,
    // Creation order for listings.
    order: Vec<String>,
}

/// Thread-safe registry for active rooms.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Capacity of each room's command queue.
    command_capacity: usize,
    next_id: AtomicU64,
    rooms: RwLock<Rooms>,
}

impl RoomRegistry {
    pub fn new(command_capacity: usize) -> Self {
        Self {
            command_capacity,
            next_id: AtomicU64::new(1),
            rooms: RwLock::new(Rooms::default()),
        }
    }

    /// Creates a room and spawns its task. Without an id the next free number is used.
    pub async fn create_room(
        &self,
        room_id: Option<String>,
        config: RoomConfig,
    ) -> Result<RoomHandle, RoomRegistryError> {
        let mut rooms = self.rooms.write().await;
        let room_id = match room_id {
            Some(room_id) => {
                if rooms.by_id.contains_key(&room_id) {
                    return Err(RoomRegistryError::AlreadyExists);
                }
                room_id
            }
            None => loop {
                let candidate = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
                if !rooms.by_id.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        let room = spawn_room(Arc::from(room_id.as_str()), config, self.command_capacity);
        rooms.by_id.insert(room_id.clone(), room.clone());
        rooms.order.push(room_id);
        Ok(room)
    }

    /// Returns a room handle for the provided id, if it exists.
    pub async fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.by_id.get(room_id).cloned()
    }

    /// All rooms in creation order.
    pub async fn rooms(&self) -> Vec<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms
            .order
            .iter()
            .filter_map(|room_id| rooms.by_id.get(room_id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Layout;

    fn config() -> RoomConfig {
        RoomConfig::new("open", Layout::open(4, 4).unwrap())
    }

    #[tokio::test]
    async fn when_no_id_is_given_then_rooms_get_sequential_ids() {
        let registry = RoomRegistry::new(8);

        let first = registry.create_room(None, config()).await.unwrap();
        let second = registry.create_room(None, config()).await.unwrap();

        assert_eq!(&*first.room_id, "1");
        assert_eq!(&*second.room_id, "2");
    }

    #[tokio::test]
    async fn when_an_id_is_taken_then_create_fails() {
        let registry = RoomRegistry::new(8);
        registry
            .create_room(Some("2".to_string()), config())
            .await
            .unwrap();

        let err = registry
            .create_room(Some("2".to_string()), config())
            .await
            .unwrap_err();
        assert_eq!(err, RoomRegistryError::AlreadyExists);

        // The generated ids skip over the taken one.
        registry.create_room(None, config()).await.unwrap();
        let generated = registry.create_room(None, config()).await.unwrap();
        assert_eq!(&*generated.room_id, "3");
    }

    #[tokio::test]
    async fn when_listing_then_rooms_come_back_in_creation_order() {
        let registry = RoomRegistry::new(8);
        for room_id in ["b", "a", "c"] {
            registry
                .create_room(Some(room_id.to_string()), config())
                .await
                .unwrap();
        }

        let ids: Vec<String> = registry
            .rooms()
            .await
            .iter()
            .map(|room| room.room_id.to_string())
            .collect();

        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(registry.get_room("a").await.is_some());
        assert!(registry.get_room("z").await.is_none());
    }
}
