// Snake entity: body, heading and score for one player.

use super::grid::Cell;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub type SnakeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    /// Quarter turn counter-clockwise.
    pub fn left(self) -> Heading {
        match self {
            Heading::North => Heading::West,
            Heading::West => Heading::South,
            Heading::South => Heading::East,
            Heading::East => Heading::North,
        }
    }

    /// Quarter turn clockwise.
    pub fn right(self) -> Heading {
        match self {
            Heading::North => Heading::East,
            Heading::East => Heading::South,
            Heading::South => Heading::West,
            Heading::West => Heading::North,
        }
    }

    pub fn opposite(self) -> Heading {
        self.left().left()
    }

    pub fn turn(self, intent: MoveIntent) -> Heading {
        match intent {
            MoveIntent::Left => self.left(),
            MoveIntent::Right => self.right(),
            MoveIntent::Forward => self,
        }
    }
}

/// A turn relative to the snake's current heading, requested for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIntent {
    Left,
    Right,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    id: SnakeId,
    head: Cell,
    // Segments behind the head, nearest first.
    trailing: VecDeque<Cell>,
    heading: Heading,
    alive: bool,
    score: u32,
}

impl Snake {
    /// A straight snake of `length` cells with its body trailing away from `heading`.
    pub fn spawn(id: SnakeId, head: Cell, heading: Heading, length: usize) -> Self {
        let behind = heading.opposite();
        let mut trailing = VecDeque::with_capacity(length.saturating_sub(1));
        let mut cursor = head;
        for _ in 1..length {
            cursor = cursor.step(behind);
            trailing.push_back(cursor);
        }
        Self {
            id,
            head,
            trailing,
            heading,
            alive: true,
            score: 0,
        }
    }

    pub fn id(&self) -> SnakeId {
        self.id
    }

    pub fn head(&self) -> Cell {
        self.head
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn length(&self) -> usize {
        1 + self.trailing.len()
    }

    /// The last body cell; the head itself for a one-cell snake.
    pub fn tail_tip(&self) -> Cell {
        self.trailing.back().copied().unwrap_or(self.head)
    }

    /// All occupied cells, head first.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        std::iter::once(self.head).chain(self.trailing.iter().copied())
    }

    /// Body cells behind the head, tail tip first.
    pub fn segments_from_tail(&self) -> impl Iterator<Item = Cell> + '_ {
        self.trailing.iter().rev().copied()
    }

    pub fn next_heading(&self, intent: MoveIntent) -> Heading {
        self.heading.turn(intent)
    }

    /// Moves the head to `new_head`. Returns the vacated tail cell unless the
    /// snake ate this tick, in which case it grows by one instead.
    pub fn advance(&mut self, new_head: Cell, heading: Heading, ate: bool, reward: u32) -> Option<Cell> {
        self.trailing.push_front(self.head);
        self.head = new_head;
        self.heading = heading;
        if ate {
            self.score += reward;
            None
        } else {
            self.trailing.pop_back()
        }
    }

    /// Returns true if the snake was alive before the call.
    pub fn kill(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_are_relative_to_the_current_heading() {
        assert_eq!(Heading::North.turn(MoveIntent::Left), Heading::West);
        assert_eq!(Heading::North.turn(MoveIntent::Right), Heading::East);
        assert_eq!(Heading::West.turn(MoveIntent::Left), Heading::South);
        assert_eq!(Heading::South.turn(MoveIntent::Forward), Heading::South);
        for heading in Heading::ALL {
            assert_eq!(heading.left().right(), heading);
            assert_eq!(heading.opposite().opposite(), heading);
        }
    }

    #[test]
    fn spawn_lays_the_body_behind_the_head() {
        let snake = Snake::spawn(3, Cell::new(4, 4), Heading::East, 3);

        let cells: Vec<Cell> = snake.cells().collect();
        assert_eq!(cells, vec![Cell::new(4, 4), Cell::new(3, 4), Cell::new(2, 4)]);
        assert_eq!(snake.tail_tip(), Cell::new(2, 4));
        assert_eq!(snake.length(), 3);
    }

    #[test]
    fn advance_without_food_keeps_the_length() {
        let mut snake = Snake::spawn(0, Cell::new(1, 1), Heading::North, 2);

        let vacated = snake.advance(Cell::new(1, 2), Heading::North, false, 1);

        assert_eq!(vacated, Some(Cell::new(1, 0)));
        assert_eq!(snake.length(), 2);
        assert_eq!(snake.tail_tip(), Cell::new(1, 1));
        assert_eq!(snake.score(), 0);
    }

    #[test]
    fn advance_after_eating_grows_and_scores() {
        let mut snake = Snake::spawn(0, Cell::new(1, 1), Heading::North, 1);

        let vacated = snake.advance(Cell::new(1, 2), Heading::North, true, 5);

        assert_eq!(vacated, None);
        assert_eq!(snake.length(), 2);
        assert_eq!(snake.score(), 5);
        let from_tail: Vec<Cell> = snake.segments_from_tail().collect();
        assert_eq!(from_tail, vec![Cell::new(1, 1)]);
    }

    #[test]
    fn kill_reports_only_the_first_death() {
        let mut snake = Snake::spawn(0, Cell::new(0, 0), Heading::North, 1);
        assert!(snake.kill());
        assert!(!snake.kill());
        assert!(!snake.is_alive());
    }
}
