//! In-process process group: one OS thread per rank.
//!
//! [`LocalUniverse::new`] wires a full mesh of crossbeam channels between
//! `size` ranks: for every ordered pair `(src, dst)` one channel for rows
//! and one for reduction contributions. Each channel has exactly one
//! sender (held by `src`) and one receiver (held by `dst`), so messages
//! between two ranks are delivered in the order they were sent.
//!
//! Channels are unbounded, which makes `send` return immediately like an
//! eagerly buffered MPI send. The lock-step protocol bounds the backlog
//! anyway: a rank cannot run more than one reduction ahead of any peer.
//!
//! Rank threads share nothing but the channels. When a rank's
//! [`LocalComm`] is dropped (the rank returned or panicked) its senders
//! close, and every peer blocked on it observes
//! [`CommError::Disconnected`].

use std::cell::Cell;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::CommError;
use crate::message::{Direction, ExchangeMessage, ReduceMessage};
use crate::traits::Communicator;

/// A freshly wired group of ranks, not yet running.
pub struct LocalUniverse {
    comms: Vec<LocalComm>,
}

/// One rank's endpoint into a [`LocalUniverse`].
///
/// `Send` so it can move onto the rank's thread, but not `Sync`: a rank
/// is driven by exactly one thread.
pub struct LocalComm {
    rank: usize,
    size: usize,
    epoch: Instant,
    row_tx: Vec<Option<Sender<ExchangeMessage>>>,
    row_rx: Vec<Option<Receiver<ExchangeMessage>>>,
    reduce_tx: Vec<Option<Sender<ReduceMessage>>>,
    reduce_rx: Vec<Option<Receiver<ReduceMessage>>>,
    round: Cell<u64>,
}

// Compile-time assertion: LocalComm must be movable onto a rank thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<LocalComm>();
    }
};

impl LocalUniverse {
    /// Wire up a group of `size` ranks.
    pub fn new(size: usize) -> Result<Self, CommError> {
        if size == 0 {
            return Err(CommError::EmptyWorld);
        }
        let epoch = Instant::now();
        let mut comms: Vec<LocalComm> = (0..size)
            .map(|rank| LocalComm {
                rank,
                size,
                epoch,
                row_tx: (0..size).map(|_| None).collect(),
                row_rx: (0..size).map(|_| None).collect(),
                reduce_tx: (0..size).map(|_| None).collect(),
                reduce_rx: (0..size).map(|_| None).collect(),
                round: Cell::new(0),
            })
            .collect();

        for src in 0..size {
            for dst in 0..size {
                if src == dst {
                    continue;
                }
                let (tx, rx) = unbounded();
                comms[src].row_tx[dst] = Some(tx);
                comms[dst].row_rx[src] = Some(rx);
                let (tx, rx) = unbounded();
                comms[src].reduce_tx[dst] = Some(tx);
                comms[dst].reduce_rx[src] = Some(rx);
            }
        }
        Ok(Self { comms })
    }

    /// Number of ranks.
    pub fn size(&self) -> usize {
        self.comms.len()
    }

    /// Take the per-rank endpoints, in rank order.
    pub fn into_comms(self) -> Vec<LocalComm> {
        self.comms
    }

    /// Run `body` once per rank, each on its own named thread, and wait
    /// for all of them.
    ///
    /// Results come back in rank order. A rank that panicked yields
    /// `Err` with the panic payload; its endpoint is dropped during
    /// unwinding, so its peers fail with [`CommError::Disconnected`]
    /// instead of hanging.
    pub fn run<T, F>(self, body: F) -> Result<Vec<thread::Result<T>>, CommError>
    where
        T: Send,
        F: Fn(LocalComm) -> T + Sync,
    {
        let body = &body;
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.comms.len());
            let mut spawn_error = None;
            for comm in self.comms {
                let rank = comm.rank;
                let spawned = thread::Builder::new()
                    .name(format!("rank-{rank}"))
                    .spawn_scoped(scope, move || body(comm));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // The closure (and its endpoint) is dropped here,
                        // which disconnects the ranks already running.
                        tracing::error!(rank, error = %e, "failed to spawn rank thread");
                        spawn_error = Some(CommError::SpawnFailed {
                            rank,
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }
            let results: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
            match spawn_error {
                Some(e) => Err(e),
                None => Ok(results),
            }
        })
    }
}

impl LocalComm {
    fn row_sender(&self, dest: usize) -> Result<&Sender<ExchangeMessage>, CommError> {
        self.row_tx
            .get(dest)
            .and_then(Option::as_ref)
            .ok_or(CommError::InvalidRank {
                rank: dest,
                size: self.size,
            })
    }

    fn row_receiver(&self, source: usize) -> Result<&Receiver<ExchangeMessage>, CommError> {
        self.row_rx
            .get(source)
            .and_then(Option::as_ref)
            .ok_or(CommError::InvalidRank {
                rank: source,
                size: self.size,
            })
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, direction: Direction, row: &[f32]) -> Result<(), CommError> {
        let message = ExchangeMessage {
            direction,
            row: row.to_vec(),
        };
        self.row_sender(dest)?
            .send(message)
            .map_err(|_| CommError::Disconnected { peer: dest })
    }

    fn receive_into(
        &self,
        source: usize,
        direction: Direction,
        buf: &mut [f32],
    ) -> Result<(), CommError> {
        let message = self
            .row_receiver(source)?
            .recv()
            .map_err(|_| CommError::Disconnected { peer: source })?;
        if message.direction != direction {
            return Err(CommError::TagMismatch {
                peer: source,
                expected: direction,
                actual: message.direction,
            });
        }
        if message.row.len() != buf.len() {
            return Err(CommError::LengthMismatch {
                peer: source,
                expected: buf.len(),
                actual: message.row.len(),
            });
        }
        buf.copy_from_slice(&message.row);
        Ok(())
    }

    fn all_reduce_max(&self, local: f32) -> Result<f32, CommError> {
        let round = self.round.get();
        self.round.set(round + 1);

        let contribution = ReduceMessage {
            round,
            value: local,
        };
        // Every live peer gets our contribution, even when another peer is gone.
        let mut failure = None;
        for (peer, tx) in self.reduce_tx.iter().enumerate() {
            if let Some(tx) = tx {
                if tx.send(contribution).is_err() {
                    failure.get_or_insert(CommError::Disconnected { peer });
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        // Peers are drained in rank order; MAX is order-independent, so
        // every rank folds to the same value.
        let mut global = local;
        for (peer, rx) in self.reduce_rx.iter().enumerate() {
            if let Some(rx) = rx {
                let msg = rx.recv().map_err(|_| CommError::Disconnected { peer })?;
                if msg.round != round {
                    return Err(CommError::OutOfStep {
                        peer,
                        expected: round,
                        actual: msg.round,
                    });
                }
                global = global.max(msg.value);
            }
        }
        Ok(global)
    }

    fn wtime(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

impl std::fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("round", &self.round.get())
            .finish()
    }
}
