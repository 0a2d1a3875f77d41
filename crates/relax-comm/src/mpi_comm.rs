//! MPI host for the process group (feature `mpi`).
//!
//! Requires an MPI installation at build time and a launcher at run time:
//!
//! ```text
//! mpirun -n 4 relax --mpi 4096 4096 1000
//! ```
//!
//! MPI's default error handler aborts the whole job on any communication
//! failure, so every operation here returns `Ok` once it returns at all.

use mpi::collective::SystemOperation;
use mpi::environment::Universe;
use mpi::point_to_point::send_receive_into_with_tags;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::error::CommError;
use crate::message::Direction;
use crate::traits::Communicator;

/// One rank of an MPI world.
pub struct MpiComm {
    world: SimpleCommunicator,
    rank: usize,
    size: usize,
}

impl MpiComm {
    /// Initialise MPI and attach to the world communicator.
    ///
    /// The returned [`Universe`] finalises MPI when dropped; keep it alive
    /// for as long as the communicator is in use.
    pub fn initialize() -> Result<(Universe, Self), CommError> {
        let universe = mpi::initialize().ok_or_else(|| CommError::InitFailed {
            reason: "MPI was already initialised".to_string(),
        })?;
        let comm = Self::new(universe.world());
        Ok((universe, comm))
    }

    /// Wrap an existing communicator.
    pub fn new(world: SimpleCommunicator) -> Self {
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Self { world, rank, size }
    }

    fn check_peer(&self, peer: usize) -> Result<i32, CommError> {
        if peer >= self.size || peer == self.rank {
            return Err(CommError::InvalidRank {
                rank: peer,
                size: self.size,
            });
        }
        Ok(peer as i32)
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, direction: Direction, row: &[f32]) -> Result<(), CommError> {
        let dest = self.check_peer(dest)?;
        self.world
            .process_at_rank(dest)
            .send_with_tag(row, direction.tag());
        Ok(())
    }

    fn receive_into(
        &self,
        source: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        let source = self.check_peer(source)?;
        self.world
            .process_at_rank(source)
            .receive_into_with_tag(buf, direction.tag());
        Ok(())
    }

    fn send_receive(
        &self,
        row: &[f32],
        peer: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        let peer = self.check_peer(peer)?;
        let process = self.world.process_at_rank(peer);
        send_receive_into_with_tags(
            row,
            &process,
            direction.tag(),
            buf,
            &process,
            direction.opposite().tag(),
        );
        Ok(())
    }

    fn all_reduce_max(&self, local: f32) -> Result<f32, CommError> {
        let mut global = local;
        self.world
            .all_reduce_into(&local, &mut global, SystemOperation::max());
        Ok(global)
    }

    fn wtime(&self) -> f64 {
        mpi::environment::time()
    }
}
