// Use cases layer: room actors, registries and the arena control surface.

pub mod arena;
pub mod connections;
pub mod outbox;
pub mod registry;
pub mod room;
pub mod types;

pub use arena::{Arena, ArenaSettings, RegistryError};
pub use connections::ConnectionState;
pub use outbox::Outbox;
pub use room::{MAX_BACKLOG, RoomError};
pub use types::{
    ConnectionHandle, ConnectionId, MatchHistory, MoveRejection, Notice, RoomConfig, RoomState,
    RoomStatus, RoomSummary, Standing, WaiterInfo,
};
