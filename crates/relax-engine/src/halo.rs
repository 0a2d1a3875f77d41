//! Ghost row exchange between row-adjacent ranks.
//!
//! Before each sweep a rank needs the row directly above and directly
//! below its owned block. Those rows belong to its neighbours, so each
//! rank sends its own first and last owned rows and receives the
//! neighbours' into the ghost rows:
//!
//! ```text
//! rank r-1:  ... row end-1   ──Down──▶  ghost row start-1 of rank r
//! rank r:    row start ...   ──Up────▶  ghost row end of rank r-1
//! ```
//!
//! The down pair (with rank + 1) completes before the up pair (with
//! rank - 1). Only ghost rows are written.

use relax_comm::{CommError, Communicator, Direction};
use relax_core::{Grid, Partition};

use crate::config::ExchangeStrategy;

/// Refresh the ghost rows of `grid` from the neighbouring ranks.
///
/// Rank 0 skips the up pair and the last rank skips the down pair; a
/// single-rank world exchanges nothing.
pub fn exchange<C: Communicator + ?Sized>(
    grid: &mut Grid,
    partition: &Partition,
    comm: &C,
    strategy: ExchangeStrategy,
) -> Result<(), CommError> {
    if let (Some(peer), Some(ghost)) = (partition.down_neighbour(), partition.halo_below()) {
        swap_rows(grid, comm, strategy, peer, Direction::Down, partition.end() - 1, ghost)?;
    }
    if let (Some(peer), Some(ghost)) = (partition.up_neighbour(), partition.halo_above()) {
        swap_rows(grid, comm, strategy, peer, Direction::Up, partition.start(), ghost)?;
    }
    Ok(())
}

/// Send row `send` to `peer` travelling `direction`, and fill row `ghost`
/// with the peer's reply.
fn swap_rows<C: Communicator + ?Sized>(
    grid: &mut Grid,
    comm: &C,
    strategy: ExchangeStrategy,
    peer: usize,
    direction: Direction,
    send: usize,
    ghost: usize,
) -> Result<(), CommError> {
    tracing::trace!(rank = comm.rank(), peer, %direction, send, ghost, "halo exchange");
    match strategy {
        ExchangeStrategy::SendReceive => {
            let (outgoing, incoming) = split_rows(grid, send, ghost);
            comm.send_receive(outgoing, peer, direction, incoming)
        }
        ExchangeStrategy::Ordered => {
            comm.send(peer, direction, grid.row(send))?;
            comm.receive_into(peer, direction.opposite(), grid.row_mut(ghost))
        }
    }
}

/// Borrow row `send` immutably and row `ghost` mutably at the same time.
fn split_rows(grid: &mut Grid, send: usize, ghost: usize) -> (&[f32], &mut [f32]) {
    debug_assert_ne!(send, ghost);
    let cols = grid.cols();
    let data = grid.as_mut_slice();
    if send < ghost {
        let (head, tail) = data.split_at_mut(ghost * cols);
        (&head[send * cols..(send + 1) * cols], &mut tail[..cols])
    } else {
        let (head, tail) = data.split_at_mut(send * cols);
        (&tail[..cols], &mut head[ghost * cols..(ghost + 1) * cols])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relax_comm::LocalUniverse;
    use relax_core::compute_partition;

    #[test]
    fn split_rows_borrows_the_right_rows() {
        let mut g = Grid::from_vec(3, 2, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]).unwrap();
        {
            let (send, ghost) = split_rows(&mut g, 1, 2);
            assert_eq!(send, &[1.0, 1.0]);
            ghost.copy_from_slice(&[9.0, 9.0]);
        }
        {
            let (send, ghost) = split_rows(&mut g, 1, 0);
            assert_eq!(send, &[1.0, 1.0]);
            ghost.copy_from_slice(&[7.0, 7.0]);
        }
        assert_eq!(g.as_slice(), &[7.0, 7.0, 1.0, 1.0, 9.0, 9.0]);
    }

    #[test]
    fn single_rank_exchange_is_a_no_op() {
        let comm = LocalUniverse::new(1).unwrap().into_comms().remove(0);
        let p = compute_partition(0, 1, 4).unwrap();
        let mut g = Grid::from_vec(4, 2, (0..8).map(|v| v as f32).collect()).unwrap();
        let before = g.clone();
        exchange(&mut g, &p, &comm, ExchangeStrategy::SendReceive).unwrap();
        assert_eq!(g, before);
    }

    fn rank_seeded_exchange(strategy: ExchangeStrategy) {
        let world = 4;
        let (rows, cols) = (16, 5);
        let universe = LocalUniverse::new(world).unwrap();
        let results = universe
            .run(|comm| {
                let p = compute_partition(comm.rank(), world, rows).unwrap();
                let mut g = Grid::zeroed(rows, cols).unwrap();
                g.as_mut_slice().fill(-1.0);
                for r in p.owned() {
                    g.row_mut(r).fill(comm.rank() as f32);
                }
                exchange(&mut g, &p, &comm, strategy).unwrap();
                (p, g)
            })
            .unwrap();

        for result in results {
            let (p, g) = result.expect("rank panicked");
            let rank = p.rank() as f32;
            match p.halo_above() {
                Some(row) => assert!(g.row(row).iter().all(|&v| v == rank - 1.0)),
                None => assert_eq!(p.rank(), 0),
            }
            match p.halo_below() {
                Some(row) => assert!(g.row(row).iter().all(|&v| v == rank + 1.0)),
                None => assert_eq!(p.rank(), world - 1),
            }
            // Owned rows are untouched and nothing beyond the ghosts is written.
            for r in 0..rows {
                let is_ghost = Some(r) == p.halo_above() || Some(r) == p.halo_below();
                let expected = if p.owned().contains(&r) {
                    rank
                } else if is_ghost {
                    continue;
                } else {
                    -1.0
                };
                assert!(g.row(r).iter().all(|&v| v == expected), "row {r}");
            }
        }
    }

    #[test]
    fn ghost_rows_hold_neighbour_ranks_send_receive() {
        rank_seeded_exchange(ExchangeStrategy::SendReceive);
    }

    #[test]
    fn ghost_rows_hold_neighbour_ranks_ordered() {
        rank_seeded_exchange(ExchangeStrategy::Ordered);
    }
}
