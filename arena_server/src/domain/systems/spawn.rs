use super::doodahs::replenish;
use super::simulation::paint_snake;
use crate::domain::errors::SimError;
use crate::domain::grid::{Cell, Grid, Tile};
use crate::domain::layouts::Layout;
use crate::domain::snake::{Heading, Snake, SnakeId};
use crate::domain::state::World;
use crate::domain::tuning::SimTuning;
use rand::Rng;
use rand::seq::SliceRandom;

/// Builds the tick-0 world for `snake_ids`.
///
/// Snakes take the layout's spawn points in order; once those run out (or one
/// is blocked) a random free spot is chosen, preferring spots that do not face
/// straight into a wall or the edge.
pub fn spawn_world<R: Rng + ?Sized>(
    layout: &Layout,
    snake_ids: &[SnakeId],
    tuning: &SimTuning,
    rng: &mut R,
) -> Result<World, SimError> {
    let mut grid = layout.blank_grid();
    let length = tuning.initial_length.max(1);
    // Snakes spawn straight, so nothing longer than the grid's longest side fits.
    match snake_ids.first() {
        Some(&snake_id) if length > layout.width().max(layout.height()) => {
            return Err(SimError::NoSpawnRoom { snake_id });
        }
        _ => {}
    }

    let mut snakes = Vec::with_capacity(snake_ids.len());
    for (slot, &snake_id) in snake_ids.iter().enumerate() {
        let configured = layout
            .spawns()
            .get(slot)
            .map(|point| Snake::spawn(snake_id, point.cell, point.heading, length))
            .filter(|snake| fits(&grid, snake));

        let snake = match configured {
            Some(snake) => snake,
            None => random_spawn(&grid, snake_id, length, rng)
                .ok_or(SimError::NoSpawnRoom { snake_id })?,
        };
        paint_snake(&mut grid, &snake)?;
        snakes.push(snake);
    }
    snakes.sort_by_key(Snake::id);

    replenish(&mut grid, tuning.doodah_count, rng)?;

    Ok(World {
        tick: 0,
        grid,
        snakes,
    })
}

fn fits(grid: &Grid, snake: &Snake) -> bool {
    snake
        .cells()
        .all(|cell| matches!(grid.cell_at(cell), Ok(Tile::Blank)))
}

// Same check as `fits` without building the snake.
fn line_fits(grid: &Grid, head: Cell, heading: Heading, length: usize) -> bool {
    let behind = heading.opposite();
    let mut cursor = head;
    for segment in 0..length {
        if segment > 0 {
            cursor = cursor.step(behind);
        }
        if !matches!(grid.cell_at(cursor), Ok(Tile::Blank)) {
            return false;
        }
    }
    true
}

fn random_spawn<R: Rng + ?Sized>(
    grid: &Grid,
    snake_id: SnakeId,
    length: usize,
    rng: &mut R,
) -> Option<Snake> {
    let candidates: Vec<(Cell, Heading)> = grid
        .blank_cells()
        .into_iter()
        .flat_map(|cell| Heading::ALL.into_iter().map(move |heading| (cell, heading)))
        .filter(|&(cell, heading)| line_fits(grid, cell, heading, length))
        .collect();

    let preferred: Vec<(Cell, Heading)> = candidates
        .iter()
        .copied()
        .filter(|&(cell, heading)| matches!(grid.cell_at(cell.step(heading)), Ok(Tile::Blank)))
        .collect();
    let (head, heading) = preferred
        .choose(rng)
        .or_else(|| candidates.choose(rng))
        .copied()?;
    Some(Snake::spawn(snake_id, head, heading, length))
}
