//! Communication errors.
//!
//! Every variant is fatal for the whole group: ranks advance in lock-step,
//! so a rank that retried on its own would fall out of step with every
//! peer blocked on the same exchange or reduction.

use std::error::Error;
use std::fmt;

use crate::message::Direction;

/// Errors raised by a [`Communicator`](crate::Communicator).
#[derive(Clone, Debug, PartialEq)]
pub enum CommError {
    /// A group needs at least one rank.
    EmptyWorld,
    /// A peer rank outside `[0, size)` or equal to the caller.
    InvalidRank {
        /// The offending rank.
        rank: usize,
        /// World size.
        size: usize,
    },
    /// The peer has left the group (its thread exited or panicked).
    Disconnected {
        /// The peer rank.
        peer: usize,
    },
    /// A row arrived with a tag other than the one being received.
    TagMismatch {
        /// The sending rank.
        peer: usize,
        /// Tag the receiver asked for.
        expected: Direction,
        /// Tag on the message.
        actual: Direction,
    },
    /// A row's length differs from the receive buffer's.
    LengthMismatch {
        /// The sending rank.
        peer: usize,
        /// Receive buffer length.
        expected: usize,
        /// Length of the row on the wire.
        actual: usize,
    },
    /// A reduction contribution belongs to a different round.
    OutOfStep {
        /// The contributing rank.
        peer: usize,
        /// Round the receiver is in.
        expected: u64,
        /// Round the contribution was made for.
        actual: u64,
    },
    /// The thread hosting a rank could not be started.
    SpawnFailed {
        /// Rank that never started.
        rank: usize,
        /// OS error description.
        reason: String,
    },
    /// The message-passing runtime failed to initialise.
    InitFailed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyWorld => write!(f, "communicator group is empty"),
            Self::InvalidRank { rank, size } => {
                write!(f, "rank {rank} is not a valid peer in a group of {size}")
            }
            Self::Disconnected { peer } => write!(f, "rank {peer} disconnected"),
            Self::TagMismatch {
                peer,
                expected,
                actual,
            } => write!(
                f,
                "rank {peer} sent a row tagged {actual}, expected {expected}"
            ),
            Self::LengthMismatch {
                peer,
                expected,
                actual,
            } => write!(
                f,
                "rank {peer} sent a row of {actual} values, expected {expected}"
            ),
            Self::OutOfStep {
                peer,
                expected,
                actual,
            } => write!(
                f,
                "rank {peer} contributed to reduction round {actual} during round {expected}"
            ),
            Self::SpawnFailed { rank, reason } => {
                write!(f, "failed to start rank {rank}: {reason}")
            }
            Self::InitFailed { reason } => {
                write!(f, "message-passing runtime failed to initialise: {reason}")
            }
        }
    }
}

impl Error for CommError {}
