//! Direction classification for one axis of pointer or hand movement.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Direction / Axis
// ════════════════════════════════════════════════════════════════════════════

/// Logical movement direction.  Horizontal and vertical are independent
/// axes; a single sample can move along both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }

    /// +1 for Right/Up, −1 for Left/Down.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Right | Direction::Up => 1.0,
            Direction::Left | Direction::Down => -1.0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl Axis {
    /// The `(positive, negative)` direction pair passed to [`classify`].
    pub fn pair(self) -> (Direction, Direction) {
        match self {
            Axis::Horizontal => (Direction::Right, Direction::Left),
            Axis::Vertical => (Direction::Up, Direction::Down),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// classify
// ════════════════════════════════════════════════════════════════════════════

/// Result of [`classify`]: which way, and how far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classified {
    pub direction: Direction,
    pub magnitude: f64,
}

/// Classify the move from `old` to `new`.
///
/// `magnitude` is `|new − old|`.  The direction is `positive` when the
/// delta is zero or positive, `negative` otherwise.  The same function
/// serves both axes; the caller picks the pair (see [`Axis::pair`]).
pub fn classify(new: f64, old: f64, positive: Direction, negative: Direction) -> Classified {
    let delta = new - old;
    let direction = if delta >= 0.0 { positive } else { negative };
    Classified { direction, magnitude: delta.abs() }
}

/// True when `position` lies within `±band` of `old` (inclusive).
pub fn is_static(position: f64, old: f64, band: f64) -> bool {
    position >= old - band && position <= old + band
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
