//! Error types for grid storage and row decomposition.

use std::error::Error;
use std::fmt;

/// Errors from allocating or addressing grid buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// The allocator refused the requested buffer.
    AllocationFailed {
        /// Number of bytes requested.
        bytes: usize,
    },
    /// `rows * cols` does not fit in `usize`.
    SizeOverflow {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },
    /// Two grids that must share a shape do not.
    ShapeMismatch {
        /// Shape of the reference grid as `(rows, cols)`.
        expected: (usize, usize),
        /// Shape of the offending grid.
        actual: (usize, usize),
    },
    /// A row range reaches past the last row of the grid.
    RowsOutOfRange {
        /// Exclusive end of the requested range.
        end: usize,
        /// Number of rows in the grid.
        rows: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { bytes } => {
                write!(f, "grid allocation of {bytes} bytes failed")
            }
            Self::SizeOverflow { rows, cols } => {
                write!(f, "grid of {rows}x{cols} cells overflows usize")
            }
            Self::ShapeMismatch { expected, actual } => write!(
                f,
                "grid shape mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::RowsOutOfRange { end, rows } => {
                write!(f, "row range ends at {end} but grid has {rows} rows")
            }
        }
    }
}

impl Error for GridError {}

/// Errors from [`compute_partition`](crate::compute_partition).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartitionError {
    /// The world has no ranks.
    EmptyWorld,
    /// The rank is not a member of the world.
    RankOutOfRange {
        /// The offending rank.
        rank: usize,
        /// Number of ranks in the world.
        world_size: usize,
    },
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyWorld => write!(f, "world size must be at least 1"),
            Self::RankOutOfRange { rank, world_size } => {
                write!(f, "rank {rank} is outside a world of {world_size} ranks")
            }
        }
    }
}

impl Error for PartitionError {}
