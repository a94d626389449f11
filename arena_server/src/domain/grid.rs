// Fixed-size tile grid shared by every snake in a room.

use super::errors::GridError;
use super::snake::{Heading, SnakeId};
use serde::{Deserialize, Serialize};

/// Integer grid coordinate. `y` grows towards North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step towards `heading`. May leave the grid.
    pub fn step(self, heading: Heading) -> Cell {
        match heading {
            Heading::North => Cell::new(self.x, self.y + 1),
            Heading::South => Cell::new(self.x, self.y - 1),
            Heading::East => Cell::new(self.x + 1, self.y),
            Heading::West => Cell::new(self.x - 1, self.y),
        }
    }
}

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Tile {
    Blank,
    Wall,
    Doodah,
    SnakeHead { id: SnakeId, dir: Heading },
    /// `index` counts from the tail tip (0) towards the head.
    SnakeBody { id: SnakeId, index: usize },
}

impl Tile {
    pub fn occupant(self) -> Option<SnakeId> {
        match self {
            Tile::SnakeHead { id, .. } | Tile::SnakeBody { id, .. } => Some(id),
            Tile::Blank | Tile::Wall | Tile::Doodah => None,
        }
    }
}

/// Row-major tile storage; the tile for `(x, y)` lives at `x + y * width`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::Blank; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height
    }

    fn index(&self, cell: Cell) -> Result<usize, GridError> {
        if !self.contains(cell) {
            return Err(GridError::OutOfBounds {
                cell,
                width: self.width,
                height: self.height,
            });
        }
        Ok(cell.x as usize + cell.y as usize * self.width)
    }

    pub fn cell_at(&self, cell: Cell) -> Result<Tile, GridError> {
        let index = self.index(cell)?;
        Ok(self.tiles[index])
    }

    pub fn place(&mut self, cell: Cell, tile: Tile) -> Result<(), GridError> {
        let index = self.index(cell)?;
        self.tiles[index] = tile;
        Ok(())
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Every cell with its tile, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Cell, Tile)> + '_ {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let cell = Cell::new((index % width) as i32, (index / width) as i32);
            (cell, *tile)
        })
    }

    pub fn blank_cells(&self) -> Vec<Cell> {
        self.cells()
            .filter(|(_, tile)| *tile == Tile::Blank)
            .map(|(cell, _)| cell)
            .collect()
    }

    pub fn doodah_count(&self) -> usize {
        self.tiles.iter().filter(|tile| **tile == Tile::Doodah).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_at_rejects_coordinates_outside_the_grid() {
        let grid = Grid::new(4, 3);

        for cell in [
            Cell::new(-1, 0),
            Cell::new(0, -1),
            Cell::new(4, 0),
            Cell::new(0, 3),
        ] {
            assert_eq!(
                grid.cell_at(cell),
                Err(GridError::OutOfBounds {
                    cell,
                    width: 4,
                    height: 3
                })
            );
        }
    }

    #[test]
    fn place_overwrites_the_previous_tile() {
        let mut grid = Grid::new(3, 3);
        let cell = Cell::new(2, 1);

        grid.place(cell, Tile::Doodah).unwrap();
        grid.place(cell, Tile::Wall).unwrap();

        assert_eq!(grid.cell_at(cell), Ok(Tile::Wall));
        assert_eq!(grid.tiles()[2 + 3], Tile::Wall);
        assert_eq!(grid.blank_cells().len(), 8);
    }

    #[test]
    fn north_increases_y() {
        let origin = Cell::new(2, 2);
        assert_eq!(origin.step(Heading::North), Cell::new(2, 3));
        assert_eq!(origin.step(Heading::South), Cell::new(2, 1));
        assert_eq!(origin.step(Heading::East), Cell::new(3, 2));
        assert_eq!(origin.step(Heading::West), Cell::new(1, 2));
    }

    #[test]
    fn tiles_serialize_with_a_type_tag() {
        let head = serde_json::to_value(Tile::SnakeHead {
            id: 1,
            dir: Heading::West,
        })
        .unwrap();
        assert_eq!(head, serde_json::json!({"type": "SnakeHead", "id": 1, "dir": "West"}));

        let blank = serde_json::to_value(Tile::Blank).unwrap();
        assert_eq!(blank, serde_json::json!({"type": "Blank"}));
    }
}
