// Use-case level inputs/outputs for room actors and their subscribers.

use super::outbox::Outbox;
use crate::domain::{Layout, SimTuning, SnakeId, TurnRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub type ConnectionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    Idle,
    Running,
    Finished,
}

/// Everything needed to run matches in one room.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub name: String,
    pub description: String,
    pub layout: Layout,
    pub tuning: SimTuning,
    /// Per-tick wait for intents; `None` waits until every living snake has one.
    pub tick_timeout: Option<Duration>,
    /// Fixed RNG seed for reproducible matches. A fresh seed is drawn per match otherwise.
    pub seed: Option<u64>,
}

impl RoomConfig {
    pub fn new(name: impl Into<String>, layout: Layout) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            layout,
            tuning: SimTuning::default(),
            tick_timeout: None,
            seed: None,
        }
    }
}

/// Why a move line was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    NotSubscribed,
    NotRunning,
    /// Subscribed after the match started; there is no snake to steer.
    Spectator,
    Dead,
    Backlogged,
}

impl MoveRejection {
    pub fn reason(self) -> &'static str {
        match self {
            MoveRejection::NotSubscribed => "not subscribed to a room",
            MoveRejection::NotRunning => "room is not running",
            MoveRejection::Spectator => "spectators cannot move",
            MoveRejection::Dead => "snake is dead",
            MoveRejection::Backlogged => "too many queued moves",
        }
    }
}

/// The recipient's own standing in a published tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Alive { score: u32 },
    Dead { score: u32 },
    Spectator,
}

/// Per-connection notifications queued by rooms and the session layer.
#[derive(Debug, Clone)]
pub enum Notice {
    Waiting {
        connection_id: ConnectionId,
        name: Arc<str>,
    },
    Subscribed {
        room_id: Arc<str>,
    },
    Unsubscribed,
    Start {
        snake_id: SnakeId,
    },
    Tick {
        record: Arc<TurnRecord>,
        standing: Standing,
    },
    Done {
        scores: Arc<BTreeMap<SnakeId, u32>>,
    },
    Reset,
    Rejected(MoveRejection),
    Error {
        msg: String,
    },
}

/// What a room needs to know about a subscriber.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: ConnectionId,
    pub name: Arc<str>,
    pub outbox: Outbox,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberStatus {
    pub connection_id: ConnectionId,
    pub name: String,
    pub snake_id: Option<SnakeId>,
    pub alive: Option<bool>,
    pub score: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomStatus {
    pub room_id: String,
    pub name: String,
    pub description: String,
    pub state: RoomState,
    pub width: usize,
    pub height: usize,
    pub tick: Option<u64>,
    pub members: Vec<MemberStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerEntry {
    pub snake_id: SnakeId,
    pub connection_id: ConnectionId,
    pub name: String,
}

/// Ordered turn records of the current (or last finished) match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchHistory {
    pub room_id: String,
    pub name: String,
    pub state: RoomState,
    pub seed: Option<u64>,
    pub players: Vec<PlayerEntry>,
    pub turns: Vec<Arc<TurnRecord>>,
    pub final_scores: Option<BTreeMap<SnakeId, u32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaiterInfo {
    pub connection_id: ConnectionId,
    pub name: String,
    pub addr: String,
}

/// One row of the room listing.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub name: String,
    pub description: String,
    pub state: RoomState,
    pub members: usize,
}

impl From<RoomStatus> for RoomSummary {
    fn from(status: RoomStatus) -> Self {
        Self {
            members: status.members.len(),
            room_id: status.room_id,
            name: status.name,
            description: status.description,
            state: status.state,
        }
    }
}
