use crate::domain::errors::GridError;
use crate::domain::grid::{Grid, Tile};
use rand::Rng;
use rand::seq::SliceRandom;

/// Tops the grid up to `target` doodahs on random blank cells.
/// Stops early when the grid has no blank cells left. Returns how many were placed.
pub fn replenish<R: Rng + ?Sized>(
    grid: &mut Grid,
    target: usize,
    rng: &mut R,
) -> Result<usize, GridError> {
    let mut placed = 0;
    for _ in grid.doodah_count()..target {
        let Some(cell) = grid.blank_cells().choose(rng).copied() else {
            break;
        };
        grid.place(cell, Tile::Doodah)?;
        placed += 1;
    }
    Ok(placed)
}
