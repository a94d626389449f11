// Static room layouts: dimensions, walls and optional spawn points.

use super::errors::LayoutError;
use super::grid::{Cell, Grid, Tile};
use super::snake::Heading;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MAX_DIMENSION: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub cell: Cell,
    pub heading: Heading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    width: usize,
    height: usize,
    walls: Vec<Cell>,
    spawns: Vec<SpawnPoint>,
    base: Grid,
}

impl Layout {
    pub fn new(
        width: usize,
        height: usize,
        walls: Vec<Cell>,
        spawns: Vec<SpawnPoint>,
    ) -> Result<Self, LayoutError> {
        if width == 0 || height == 0 {
            return Err(LayoutError::Empty);
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(LayoutError::TooLarge { width, height });
        }

        let mut base = Grid::new(width, height);
        for wall in &walls {
            base.place(*wall, Tile::Wall)?;
        }

        let mut seen = HashSet::new();
        for spawn in &spawns {
            if base.cell_at(spawn.cell)? == Tile::Wall {
                return Err(LayoutError::SpawnOnWall { cell: spawn.cell });
            }
            if !seen.insert(spawn.cell) {
                return Err(LayoutError::DuplicateSpawn { cell: spawn.cell });
            }
        }
        Ok(Self {
            width,
            height,
            walls,
            spawns,
            base,
        })
    }

    pub fn open(width: usize, height: usize) -> Result<Self, LayoutError> {
        Self::new(width, height, Vec::new(), Vec::new())
    }

    /// Parses one string per row; row `r` holds the cells with `y = r`.
    ///
    /// `#` is a wall, `.` is blank and `N`/`E`/`S`/`W` mark a spawn point
    /// facing that way. Spawn points are handed out in reading order.
    pub fn from_ascii<S: AsRef<str>>(rows: &[S]) -> Result<Self, LayoutError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());

        let mut walls = Vec::new();
        let mut spawns = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let cell = Cell::new(x as i32, y as i32);
                let heading = match glyph {
                    '.' => continue,
                    '#' => {
                        walls.push(cell);
                        continue;
                    }
                    'N' => Heading::North,
                    'E' => Heading::East,
                    'S' => Heading::South,
                    'W' => Heading::West,
                    other => return Err(LayoutError::UnknownGlyph { glyph: other, x, y }),
                };
                spawns.push(SpawnPoint { cell, heading });
            }
        }

        Self::new(width, height, walls, spawns)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn walls(&self) -> &[Cell] {
        &self.walls
    }

    pub fn spawns(&self) -> &[SpawnPoint] {
        &self.spawns
    }

    /// A grid holding only this layout's walls.
    pub fn blank_grid(&self) -> Grid {
        self.base.clone()
    }
}

/// A named layout created at startup.
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    /// Per-tick wait for intents, in milliseconds.
    pub tick_timeout_ms: u64,
    pub layout: Layout,
}

const SIMPLE: [&str; 5] = ["#####", ".....", ".....", ".....", "....."];

const BOXED: [&str; 10] = [
    "##########",
    "#........#",
    "#........#",
    "#........#",
    "#........#",
    "#........#",
    "#........#",
    "#........#",
    "#........#",
    "##########",
];

const SPECKLED: [&str; 8] = [
    "........",
    "....#...",
    ".##.....",
    "......#.",
    "..#..##.",
    "......#.",
    ".#.#....",
    "........",
];

const LARGE: [&str; 16] = [
    "............#.......",
    "............#.......",
    "....###.....#.......",
    "....#.......#.......",
    "....#.#..#.....##...",
    ".........#.....##...",
    "...#.....#..#####...",
    "............###.....",
    "............###.....",
    "###.####....####.###",
    ".......#.........#..",
    ".......#............",
    ".......#....#.......",
    ".......#....#....#..",
    "########....#....###",
    "............#.......",
];

pub fn presets() -> Result<Vec<Preset>, LayoutError> {
    Ok(vec![
        Preset {
            name: "Simple",
            description: "A very small and simple room for testing with.",
            tick_timeout_ms: 500,
            layout: Layout::from_ascii(&SIMPLE)?,
        },
        Preset {
            name: "Boxed",
            description: "A moderate-sized room that is boxed in around the outside.",
            tick_timeout_ms: 1_000,
            layout: Layout::from_ascii(&BOXED)?,
        },
        Preset {
            name: "Speckled",
            description: "A medium-sized room with random walls placed in the centre.",
            tick_timeout_ms: 4_000,
            layout: Layout::from_ascii(&SPECKLED)?,
        },
        Preset {
            name: "Large",
            description: "A very large room with interesting wall placing.",
            tick_timeout_ms: 12_000,
            layout: Layout::from_ascii(&LARGE)?,
        },
    ])
}
