//! Row-wise domain decomposition.
//!
//! Each rank owns a contiguous block of `n / world_size` rows. The block
//! for rank `r` is `[r * row_count, (r + 1) * row_count)`. When the world
//! size does not divide `n`, the trailing `n % world_size` rows belong to
//! nobody and are never updated; callers that cannot accept this reject
//! such configurations before partitioning.

use std::ops::Range;

use crate::error::PartitionError;
use crate::stencil::interior_rows;

/// The rows a single rank owns, plus its view of the neighbouring ranks.
///
/// Computed once at startup and never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Partition {
    rank: usize,
    world_size: usize,
    total_rows: usize,
    start: usize,
    end: usize,
}

/// Compute the owned row range of `rank` in a world of `world_size` ranks
/// over a grid of `n` rows.
///
/// Pure and deterministic.
pub fn compute_partition(
    rank: usize,
    world_size: usize,
    n: usize,
) -> Result<Partition, PartitionError> {
    if world_size == 0 {
        return Err(PartitionError::EmptyWorld);
    }
    if rank >= world_size {
        return Err(PartitionError::RankOutOfRange { rank, world_size });
    }
    let row_count = n / world_size;
    let start = rank * row_count;
    Ok(Partition {
        rank,
        world_size,
        total_rows: n,
        start,
        end: start + row_count,
    })
}

impl Partition {
    /// Partitions for every rank of the world, in rank order.
    pub fn all(world_size: usize, n: usize) -> Result<Vec<Partition>, PartitionError> {
        (0..world_size.max(1))
            .map(|rank| compute_partition(rank, world_size, n))
            .collect()
    }

    /// This rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of ranks in the world.
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// Global row count `n`.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// First owned row.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last owned row.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Owned rows `[start, end)`.
    pub fn owned(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of owned rows.
    pub fn row_count(&self) -> usize {
        self.end - self.start
    }

    /// The rank holding the rows above ours, if any.
    pub fn up_neighbour(&self) -> Option<usize> {
        self.rank.checked_sub(1)
    }

    /// The rank holding the rows below ours, if any.
    pub fn down_neighbour(&self) -> Option<usize> {
        (self.rank + 1 < self.world_size).then_some(self.rank + 1)
    }

    /// Ghost row directly above the owned block, filled from the up neighbour.
    pub fn halo_above(&self) -> Option<usize> {
        self.up_neighbour().map(|_| self.start - 1)
    }

    /// Ghost row directly below the owned block, filled from the down neighbour.
    pub fn halo_below(&self) -> Option<usize> {
        self.down_neighbour().map(|_| self.end)
    }

    /// Owned rows the stencil may write: the owned block minus the global
    /// boundary rows `0` and `n - 1`.
    pub fn update_rows(&self) -> Range<usize> {
        interior_rows(self.owned(), self.total_rows)
    }

    /// Rows owned by no rank because `world_size` does not divide `n`.
    pub fn unowned_rows(&self) -> Range<usize> {
        let covered = self.total_rows - self.total_rows % self.world_size;
        covered..self.total_rows
    }
}
