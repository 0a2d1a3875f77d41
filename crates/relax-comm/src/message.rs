//! Messages exchanged between ranks.

use std::fmt;

/// Direction a row travels between row-adjacent ranks.
///
/// Used as the message tag, so a rank receiving from a neighbour can tell
/// which boundary the row belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards higher ranks (larger row indices).
    Down,
    /// Towards lower ranks (smaller row indices).
    Up,
}

impl Direction {
    /// The direction of the reply in a symmetric exchange.
    pub fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
        }
    }

    /// Numeric tag for runtimes that tag messages with integers.
    pub fn tag(self) -> i32 {
        match self {
            Self::Down => 0,
            Self::Up => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Up => write!(f, "up"),
        }
    }
}

/// One grid row in flight between two ranks.
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeMessage {
    /// Direction of travel.
    pub direction: Direction,
    /// The row's `m` values.
    pub row: Vec<f32>,
}

/// One rank's contribution to a MAX all-reduce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ReduceMessage {
    /// Zero-based count of reductions the sender has entered.
    pub round: u64,
    pub value: f32,
}
