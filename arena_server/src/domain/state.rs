// World state, per-tick events and the history records built from them.

use super::grid::{Cell, Grid};
use super::snake::{Snake, SnakeId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Boundary,
    Wall,
    SelfCollision,
    Collision { with: SnakeId },
    HeadOn { with: SnakeId },
    /// Left the room while the match was running.
    Forfeit,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Moved,
    AteDoodah,
    Died { cause: DeathCause },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickEvent {
    pub snake_id: SnakeId,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnakeStatus {
    pub id: SnakeId,
    pub alive: bool,
    pub score: u32,
    pub length: usize,
}

impl From<&Snake> for SnakeStatus {
    fn from(snake: &Snake) -> Self {
        Self {
            id: snake.id(),
            alive: snake.is_alive(),
            score: snake.score(),
            length: snake.length(),
        }
    }
}

/// Immutable snapshot of one tick: the map plus every snake's standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub tick: u64,
    pub map: Grid,
    pub snakes: Vec<SnakeStatus>,
    pub events: Vec<TickEvent>,
}

/// Authoritative state for one match. `snakes` is kept sorted by id.
#[derive(Debug, Clone)]
pub struct World {
    pub tick: u64,
    pub grid: Grid,
    pub snakes: Vec<Snake>,
}

impl World {
    pub fn snake(&self, id: SnakeId) -> Option<&Snake> {
        self.snakes.iter().find(|snake| snake.id() == id)
    }

    pub fn is_alive(&self, id: SnakeId) -> bool {
        self.snake(id).is_some_and(Snake::is_alive)
    }

    pub fn living(&self) -> usize {
        self.snakes.iter().filter(|snake| snake.is_alive()).count()
    }

    /// Marks a snake dead outside of a step. Its body stays on the grid.
    /// Returns true if the snake was alive.
    pub fn kill(&mut self, id: SnakeId) -> bool {
        self.snakes
            .iter_mut()
            .find(|snake| snake.id() == id)
            .is_some_and(Snake::kill)
    }

    pub fn scores(&self) -> BTreeMap<SnakeId, u32> {
        self.snakes
            .iter()
            .map(|snake| (snake.id(), snake.score()))
            .collect()
    }

    pub fn record(&self, events: Vec<TickEvent>) -> TurnRecord {
        TurnRecord {
            tick: self.tick,
            map: self.grid.clone(),
            snakes: self.snakes.iter().map(SnakeStatus::from).collect(),
            events,
        }
    }

    /// True when the snake tiles on the grid are exactly the union of all
    /// snake bodies, each cell owned by the matching snake.
    pub fn occupancy_consistent(&self) -> bool {
        let mut expected: HashMap<Cell, SnakeId> = HashMap::new();
        for snake in &self.snakes {
            for cell in snake.cells() {
                if expected.insert(cell, snake.id()).is_some() {
                    return false;
                }
            }
        }

        for (cell, tile) in self.grid.cells() {
            if let Some(owner) = tile.occupant() {
                if expected.remove(&cell) != Some(owner) {
                    return false;
                }
            }
        }
        expected.is_empty()
    }
}
