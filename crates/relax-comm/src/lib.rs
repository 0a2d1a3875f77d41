//! Message-passing runtime interface for the relax solver.
//!
//! The solver never touches another rank's memory. Everything it needs
//! from the hosting runtime is captured by [`Communicator`]: rank and
//! world-size discovery, blocking exchange of tagged rows, a MAX
//! all-reduce over one `f32`, and a wall-clock timer.
//!
//! Two hosts implement it:
//!
//! - [`LocalComm`]: every rank is an OS thread of the current process and
//!   ranks talk over crossbeam channels. Created by [`LocalUniverse`].
//! - `MpiComm` (feature `mpi`): ranks are MPI processes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod local;
pub mod message;
#[cfg(feature = "mpi")]
pub mod mpi_comm;
pub mod traits;

pub use error::CommError;
pub use local::{LocalComm, LocalUniverse};
pub use message::{Direction, ExchangeMessage};
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
pub use traits::Communicator;
