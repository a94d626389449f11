use super::doodahs::replenish;
use crate::domain::errors::{GridError, SimError};
use crate::domain::grid::{Cell, Grid, Tile};
use crate::domain::snake::{Heading, MoveIntent, Snake, SnakeId};
use crate::domain::state::{DeathCause, EventKind, TickEvent, World};
use crate::domain::tuning::SimTuning;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub world: World,
    /// One event per snake that was alive going into the tick, in id order.
    pub events: Vec<TickEvent>,
}

#[derive(Debug, Clone, Copy)]
struct Plan {
    snake_id: SnakeId,
    heading: Heading,
    target: Cell,
}

enum Resolution {
    Advance { ate: bool },
    Die(DeathCause),
}

/// Advances `world` by one tick and returns the next world.
///
/// Snakes without an entry in `intents` keep going forward. Candidate heads
/// are fixed up front so two snakes entering the same cell both die; every
/// other collision is resolved in ascending id order against the grid as
/// updated by the snakes processed before. The input world is left untouched
/// when an error is returned.
pub fn step<R: Rng + ?Sized>(
    world: &World,
    intents: &BTreeMap<SnakeId, MoveIntent>,
    tuning: &SimTuning,
    rng: &mut R,
) -> Result<StepOutcome, SimError> {
    let mut next = world.clone();
    next.tick += 1;

    let plans: Vec<Plan> = next
        .snakes
        .iter()
        .filter(|snake| snake.is_alive())
        .map(|snake| {
            let intent = intents
                .get(&snake.id())
                .copied()
                .unwrap_or(MoveIntent::Forward);
            let heading = snake.next_heading(intent);
            Plan {
                snake_id: snake.id(),
                heading,
                target: snake.head().step(heading),
            }
        })
        .collect();

    let mut landings: HashMap<Cell, Vec<SnakeId>> = HashMap::new();
    for plan in &plans {
        if next.grid.contains(plan.target) {
            landings.entry(plan.target).or_default().push(plan.snake_id);
        }
    }

    let mut events = Vec::with_capacity(plans.len());
    for plan in &plans {
        let index = next
            .snakes
            .iter()
            .position(|snake| snake.id() == plan.snake_id)
            .ok_or(SimError::UnknownSnake {
                snake_id: plan.snake_id,
            })?;
        let resolution = resolve(&next.grid, &next.snakes[index], plan, &landings)?;

        let snake = &mut next.snakes[index];
        let kind = match resolution {
            Resolution::Die(cause) => {
                snake.kill();
                EventKind::Died { cause }
            }
            Resolution::Advance { ate } => {
                let vacated = snake.advance(plan.target, plan.heading, ate, tuning.doodah_reward);
                if let Some(cell) = vacated {
                    next.grid.place(cell, Tile::Blank)?;
                }
                paint_snake(&mut next.grid, snake)?;
                if ate {
                    EventKind::AteDoodah
                } else {
                    EventKind::Moved
                }
            }
        };
        events.push(TickEvent {
            snake_id: plan.snake_id,
            kind,
        });
    }

    replenish(&mut next.grid, tuning.doodah_count, rng)?;

    if !next.occupancy_consistent() {
        return Err(SimError::OccupancyMismatch { tick: next.tick });
    }

    Ok(StepOutcome {
        world: next,
        events,
    })
}

fn resolve(
    grid: &Grid,
    snake: &Snake,
    plan: &Plan,
    landings: &HashMap<Cell, Vec<SnakeId>>,
) -> Result<Resolution, SimError> {
    if !grid.contains(plan.target) {
        return Ok(Resolution::Die(DeathCause::Boundary));
    }

    let rival = landings
        .get(&plan.target)
        .and_then(|ids| ids.iter().copied().find(|id| *id != snake.id()));
    if let Some(with) = rival {
        return Ok(Resolution::Die(DeathCause::HeadOn { with }));
    }

    let resolution = match grid.cell_at(plan.target)? {
        Tile::Blank => Resolution::Advance { ate: false },
        Tile::Doodah => Resolution::Advance { ate: true },
        Tile::Wall => Resolution::Die(DeathCause::Wall),
        Tile::SnakeHead { id, .. } | Tile::SnakeBody { id, .. } if id == snake.id() => {
            // The tail tip moves out of the way this tick.
            if plan.target == snake.tail_tip() && snake.length() > 1 {
                Resolution::Advance { ate: false }
            } else {
                Resolution::Die(DeathCause::SelfCollision)
            }
        }
        Tile::SnakeHead { id, .. } | Tile::SnakeBody { id, .. } => {
            Resolution::Die(DeathCause::Collision { with: id })
        }
    };
    Ok(resolution)
}

/// Writes the snake's head and numbered body tiles onto the grid.
pub(crate) fn paint_snake(grid: &mut Grid, snake: &Snake) -> Result<(), GridError> {
    for (index, cell) in snake.segments_from_tail().enumerate() {
        grid.place(
            cell,
            Tile::SnakeBody {
                id: snake.id(),
                index,
            },
        )?;
    }
    grid.place(
        snake.head(),
        Tile::SnakeHead {
            id: snake.id(),
            dir: snake.heading(),
        },
    )
}
