// Domain-level errors for grid access, layouts and the simulation step.

use super::grid::Cell;
use super::snake::SnakeId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    OutOfBounds {
        cell: Cell,
        width: usize,
        height: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds {
                cell,
                width,
                height,
            } => write!(
                f,
                "cell ({}, {}) is outside the {width}x{height} grid",
                cell.x, cell.y
            ),
        }
    }
}

/// Rejected room layouts. Surfaced to operators when a room is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Empty,
    TooLarge { width: usize, height: usize },
    RaggedRow { row: usize, expected: usize, found: usize },
    UnknownGlyph { glyph: char, x: usize, y: usize },
    OutOfBounds(GridError),
    SpawnOnWall { cell: Cell },
    DuplicateSpawn { cell: Cell },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Empty => write!(f, "layout must have a non-zero width and height"),
            LayoutError::TooLarge { width, height } => {
                write!(f, "layout {width}x{height} exceeds the maximum grid size")
            }
            LayoutError::RaggedRow {
                row,
                expected,
                found,
            } => write!(f, "layout row {row} has {found} columns, expected {expected}"),
            LayoutError::UnknownGlyph { glyph, x, y } => {
                write!(f, "unknown layout glyph {glyph:?} at ({x}, {y})")
            }
            LayoutError::OutOfBounds(err) => write!(f, "{err}"),
            LayoutError::SpawnOnWall { cell } => {
                write!(f, "spawn point ({}, {}) is on a wall", cell.x, cell.y)
            }
            LayoutError::DuplicateSpawn { cell } => {
                write!(f, "spawn point ({}, {}) is listed twice", cell.x, cell.y)
            }
        }
    }
}

impl From<GridError> for LayoutError {
    fn from(err: GridError) -> Self {
        LayoutError::OutOfBounds(err)
    }
}

/// Failures inside a simulation step. Any of these aborts the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    Grid(GridError),
    NoSpawnRoom { snake_id: SnakeId },
    UnknownSnake { snake_id: SnakeId },
    OccupancyMismatch { tick: u64 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Grid(err) => write!(f, "{err}"),
            SimError::NoSpawnRoom { snake_id } => {
                write!(f, "no free cells left to spawn snake {snake_id}")
            }
            SimError::UnknownSnake { snake_id } => write!(f, "snake {snake_id} is not in the world"),
            SimError::OccupancyMismatch { tick } => {
                write!(f, "grid occupancy diverged from snake bodies at tick {tick}")
            }
        }
    }
}

impl From<GridError> for SimError {
    fn from(err: GridError) -> Self {
        SimError::Grid(err)
    }
}
