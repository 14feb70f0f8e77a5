//! Core type definitions shared by the engine and the codecs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid position. The origin is the bottom-left cell and `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Neighbouring position one step in `dir`.
    pub fn step(&self, dir: Direction) -> Self {
        let (dx, dy) = dir.to_delta();
        self.add(dx, dy)
    }

    pub fn above(&self) -> Self {
        self.add(0, 1)
    }

    pub fn below(&self) -> Self {
        self.add(0, -1)
    }

    /// Manhattan distance to another position
    pub fn manhattan_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal direction. `None` is the idle direction of an intent and the
/// facing of objects that have no orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Counter-clockwise quarter turn.
    pub fn turn_left(&self) -> Self {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
            Direction::None => Direction::None,
        }
    }

    /// Clockwise quarter turn.
    pub fn turn_right(&self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::None => Direction::None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// The four movement directions, in demo-code order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    pub fn index(&self) -> u8 {
        match self {
            Direction::None => 0,
            Direction::Up => 1,
            Direction::Down => 2,
            Direction::Left => 3,
            Direction::Right => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Direction::None),
            1 => Some(Direction::Up),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            4 => Some(Direction::Right),
            _ => None,
        }
    }
}

/// What a miner does with its direction this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Action {
    /// Step into the neighbouring cell (digging, collecting or pushing).
    #[default]
    Move,
    /// Act on the neighbouring cell without leaving the current one.
    Take,
    /// Drop an armed time bomb into the neighbouring cell.
    PlaceBomb,
}

impl Action {
    pub fn index(&self) -> u8 {
        match self {
            Action::Move => 0,
            Action::Take => 1,
            Action::PlaceBomb => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Action::Move),
            1 => Some(Action::Take),
            2 => Some(Action::PlaceBomb),
            _ => None,
        }
    }
}

/// A player's control input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Intent {
    pub dir: Direction,
    pub action: Action,
}

impl Intent {
    pub const IDLE: Intent = Intent {
        dir: Direction::None,
        action: Action::Move,
    };

    pub fn new(dir: Direction, action: Action) -> Self {
        Self { dir, action }
    }

    pub fn step(dir: Direction) -> Self {
        Self::new(dir, Action::Move)
    }

    pub fn is_idle(&self) -> bool {
        self.dir == Direction::None
    }
}

/// Colour shared by a key and the doors it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl KeyColor {
    pub fn all() -> [KeyColor; 4] {
        [KeyColor::Red, KeyColor::Green, KeyColor::Blue, KeyColor::Yellow]
    }

    /// Bit of this colour in a miner's key ring.
    pub fn bit(&self) -> u8 {
        match self {
            KeyColor::Red => 1,
            KeyColor::Green => 2,
            KeyColor::Blue => 4,
            KeyColor::Yellow => 8,
        }
    }
}
