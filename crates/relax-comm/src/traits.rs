//! The [`Communicator`] trait.

use crate::error::CommError;
use crate::message::Direction;

/// What a rank needs from the runtime hosting the process group.
///
/// All operations block. Receives wait for the matching send; the
/// all-reduce waits until every rank of the group has contributed. There
/// is no timeout: a peer that never arrives stalls the caller until the
/// peer leaves the group, at which point the call fails.
pub trait Communicator {
    /// This rank, in `[0, size)`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Send `row` to `dest`, tagged with `direction`.
    fn send(&self, dest: usize, direction: Direction, row: &[f32]) -> Result<(), CommError>;

    /// Receive a row tagged `direction` from `source` into `buf`.
    fn receive_into(
        &self,
        source: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError>;

    /// Send `row` to `peer` tagged `direction` and receive the peer's
    /// reply, tagged `direction.opposite()`, into `buf`.
    ///
    /// Both sides of a symmetric exchange may call this at the same time
    /// without deadlocking. The default implementation relies on `send`
    /// returning before the peer has received; runtimes with rendezvous
    /// sends must override it.
    fn send_receive(
        &self,
        row: &[f32],
        peer: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        self.send(peer, direction, row)?;
        self.receive_into(peer, direction.opposite(), buf)
    }

    /// Collective MAX over one value per rank.
    ///
    /// Every rank must call this the same number of times; each call
    /// returns the same value on every rank.
    fn all_reduce_max(&self, local: f32) -> Result<f32, CommError>;

    /// Monotonic wall-clock time in seconds from an arbitrary epoch.
    fn wtime(&self) -> f64;
}
