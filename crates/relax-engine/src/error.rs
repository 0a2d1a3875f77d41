//! Top-level error for a solver run.

use std::error::Error;
use std::fmt;

use relax_comm::CommError;
use relax_core::{GridError, PartitionError};

use crate::config::ConfigError;

/// Any fatal condition that stops a rank.
///
/// No variant is recoverable: the run produces no partial result.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveError {
    /// The configuration was rejected before the run started.
    Config(ConfigError),
    /// A grid buffer could not be allocated or addressed.
    Grid(GridError),
    /// The rank could not be placed in the decomposition.
    Partition(PartitionError),
    /// A send, receive or reduction failed.
    Comm(CommError),
    /// A rank thread of the local host panicked.
    RankPanicked {
        /// The rank whose thread panicked.
        rank: usize,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::Partition(e) => write!(f, "partition: {e}"),
            Self::Comm(e) => write!(f, "communication: {e}"),
            Self::RankPanicked { rank } => write!(f, "rank {rank} panicked"),
        }
    }
}

impl Error for SolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Grid(e) => Some(e),
            Self::Partition(e) => Some(e),
            Self::Comm(e) => Some(e),
            Self::RankPanicked { .. } => None,
        }
    }
}

impl From<ConfigError> for SolveError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GridError> for SolveError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<PartitionError> for SolveError {
    fn from(e: PartitionError) -> Self {
        Self::Partition(e)
    }
}

impl From<CommError> for SolveError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

impl SolveError {
    /// Whether this error only reports that a peer went away, as opposed
    /// to being the original failure.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Self::Comm(CommError::Disconnected { .. }))
    }
}
