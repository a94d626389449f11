// Move policies: anything that turns a tick snapshot into an intent.

use super::snake::{MoveIntent, SnakeId};
use super::state::TurnRecord;

/// Chooses a move for one snake given the latest published tick.
///
/// Remote clients play this role over the wire; the room only uses it to
/// fill in for snakes whose intent did not arrive in time.
pub trait MovePolicy: Send {
    fn choose(&mut self, snake_id: SnakeId, latest: &TurnRecord) -> MoveIntent;
}

/// Keeps the current heading.
#[derive(Debug, Default, Clone, Copy)]
pub struct HoldCourse;

impl MovePolicy for HoldCourse {
    fn choose(&mut self, _snake_id: SnakeId, _latest: &TurnRecord) -> MoveIntent {
        MoveIntent::Forward
    }
}
