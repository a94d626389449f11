// Systems that advance a match: spawning, the turn step and doodah upkeep.

pub mod doodahs;
pub mod simulation;
pub mod spawn;

pub use simulation::{StepOutcome, step};
pub use spawn::spawn_world;
