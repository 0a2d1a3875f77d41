//! Mock communicators.
//!
//! - [`SoloComm`]: a one-rank world with no peers and a reduction counter.
//! - [`FailingComm`]: wraps another communicator and fails its reduction
//!   deterministically after N successful calls.
//! - [`SlowReduceComm`]: wraps another communicator and sleeps before each
//!   reduction, so timings can tell the reduction apart from the sweep.

use std::cell::Cell;
use std::thread;
use std::time::Duration;

use relax_comm::{CommError, Communicator, Direction};

/// A world of exactly one rank.
///
/// Point-to-point calls fail with [`CommError::InvalidRank`] since there
/// is nobody to talk to; the all-reduce returns its input.
#[derive(Debug, Default)]
pub struct SoloComm {
    reductions: Cell<usize>,
}

impl SoloComm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of all-reduce calls so far.
    pub fn reductions(&self) -> usize {
        self.reductions.get()
    }
}

impl Communicator for SoloComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, dest: usize, _direction: Direction, _row: &[f32]) -> Result<(), CommError> {
        Err(CommError::InvalidRank {
            rank: dest,
            size: 1,
        })
    }

    fn receive_into(
        &self,
        source: usize,
        _direction: Direction,
        _buf: &mut [f32],
    ) -> Result<(), CommError> {
        Err(CommError::InvalidRank {
            rank: source,
            size: 1,
        })
    }

    fn all_reduce_max(&self, local: f32) -> Result<f32, CommError> {
        self.reductions.set(self.reductions.get() + 1);
        Ok(local)
    }

    fn wtime(&self) -> f64 {
        0.0
    }
}

/// Delegates to `inner` until `fail_after` reductions have succeeded,
/// then returns `error` from every further reduction.
#[derive(Debug)]
pub struct FailingComm<C> {
    inner: C,
    fail_after: usize,
    error: CommError,
    calls: Cell<usize>,
}

impl<C: Communicator> FailingComm<C> {
    pub fn new(inner: C, fail_after: usize, error: CommError) -> Self {
        Self {
            inner,
            fail_after,
            error,
            calls: Cell::new(0),
        }
    }

    /// Number of reductions attempted so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<C: Communicator> Communicator for FailingComm<C> {
    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn send(&self, dest: usize, direction: Direction, row: &[f32]) -> Result<(), CommError> {
        self.inner.send(dest, direction, row)
    }

    fn receive_into(
        &self,
        source: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        self.inner.receive_into(source, direction, buf)
    }

    fn send_receive(
        &self,
        row: &[f32],
        peer: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        self.inner.send_receive(row, peer, direction, buf)
    }

    fn all_reduce_max(&self, local: f32) -> Result<f32, CommError> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        if n >= self.fail_after {
            return Err(self.error.clone());
        }
        self.inner.all_reduce_max(local)
    }

    fn wtime(&self) -> f64 {
        self.inner.wtime()
    }
}

/// Delegates everything to `inner`, but sleeps for `delay` before each
/// reduction.
#[derive(Debug)]
pub struct SlowReduceComm<C> {
    inner: C,
    delay: Duration,
}

impl<C: Communicator> SlowReduceComm<C> {
    pub fn new(inner: C, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<C: Communicator> Communicator for SlowReduceComm<C> {
    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn send(&self, dest: usize, direction: Direction, row: &[f32]) -> Result<(), CommError> {
        self.inner.send(dest, direction, row)
    }

    fn receive_into(
        &self,
        source: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        self.inner.receive_into(source, direction, buf)
    }

    fn send_receive(
        &self,
        row: &[f32],
        peer: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        self.inner.send_receive(row, peer, direction, buf)
    }

    fn all_reduce_max(&self, local: f32) -> Result<f32, CommError> {
        thread::sleep(self.delay);
        self.inner.all_reduce_max(local)
    }

    fn wtime(&self) -> f64 {
        self.inner.wtime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solo_reduction_is_identity() {
        let comm = SoloComm::new();
        assert_eq!(comm.all_reduce_max(0.25).unwrap(), 0.25);
        assert_eq!(comm.reductions(), 1);
        assert!(comm.send(1, Direction::Down, &[0.0]).is_err());
    }

    #[test]
    fn failing_comm_fails_on_schedule() {
        let err = CommError::Disconnected { peer: 3 };
        let comm = FailingComm::new(SoloComm::new(), 2, err.clone());
        assert!(comm.all_reduce_max(1.0).is_ok());
        assert!(comm.all_reduce_max(1.0).is_ok());
        assert_eq!(comm.all_reduce_max(1.0), Err(err));
        assert_eq!(comm.calls(), 3);
    }

    #[test]
    fn slow_reduce_comm_still_reduces() {
        let comm = SlowReduceComm::new(SoloComm::new(), Duration::from_millis(1));
        assert_eq!(comm.all_reduce_max(0.5).unwrap(), 0.5);
        assert_eq!(comm.rank(), 0);
    }
}
