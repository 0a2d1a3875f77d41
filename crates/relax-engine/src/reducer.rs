//! Global convergence reduction.
//!
//! Each rank scans the cells it just updated for the local error, then
//! joins a MAX all-reduce so every rank holds the same global error. The
//! all-reduce is the synchronisation point of the loop: a rank that skips
//! it leaves every other rank blocked.

use relax_comm::{CommError, Communicator};
use relax_core::{local_error, GridState, Partition};

use crate::error::SolveError;

/// Collective MAX of `local` over all ranks.
pub fn global_error<C: Communicator + ?Sized>(comm: &C, local: f32) -> Result<f32, CommError> {
    comm.all_reduce_max(local)
}

/// Local error between `current` (before the sweep) and `next` (after
/// it) over this rank's update rows, followed by the global reduction.
pub fn reduce<C: Communicator + ?Sized>(
    comm: &C,
    grids: &GridState,
    partition: &Partition,
) -> Result<f32, SolveError> {
    let local = local_error(grids.current(), grids.next(), partition.update_rows())?;
    Ok(global_error(comm, local)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relax_comm::LocalUniverse;
    use relax_core::{compute_partition, Grid};

    #[test]
    fn every_rank_sees_the_largest_local_error() {
        let world = 3;
        let universe = LocalUniverse::new(world).unwrap();
        let results = universe
            .run(|comm| {
                let rows = 9;
                let p = compute_partition(comm.rank(), world, rows).unwrap();
                let mut grids = GridState::zeroed(rows, 4).unwrap();
                // Rank r changes one of its cells by (r + 1)^2, so its
                // local error is r + 1.
                let row = p.update_rows().start;
                let (_, next) = grids.split();
                let delta = ((comm.rank() + 1) * (comm.rank() + 1)) as f32;
                next.set(row, 1, delta);
                reduce(&comm, &grids, &p).unwrap()
            })
            .unwrap();
        for r in results {
            assert_eq!(r.expect("rank panicked"), 3.0);
        }
    }

    #[test]
    fn unchanged_grid_reduces_to_zero() {
        let comm = LocalUniverse::new(1).unwrap().into_comms().remove(0);
        let p = compute_partition(0, 1, 5).unwrap();
        let grids = GridState::from_grid(Grid::zeroed(5, 5).unwrap());
        assert_eq!(reduce(&comm, &grids, &p).unwrap(), 0.0);
    }
}
