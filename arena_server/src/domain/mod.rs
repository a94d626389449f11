// Domain layer: grid world, snakes and the turn rules.

pub mod errors;
pub mod grid;
pub mod layouts;
pub mod policy;
pub mod snake;
pub mod state;
pub mod systems;
pub mod tuning;

pub use errors::{GridError, LayoutError, SimError};
pub use grid::{Cell, Grid, Tile};
pub use layouts::{Layout, Preset, SpawnPoint};
pub use policy::{HoldCourse, MovePolicy};
pub use snake::{Heading, MoveIntent, Snake, SnakeId};
pub use state::{DeathCause, EventKind, SnakeStatus, TickEvent, TurnRecord, World};
pub use tuning::SimTuning;
