//! Core types and kernels for the relax Jacobi solver.
//!
//! This is the leaf crate with zero internal dependencies. It holds
//! everything a single rank can do without talking to its peers: the
//! double-buffered grid, the row decomposition, the four-point stencil
//! and the local half of the convergence reduction.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod convergence;
pub mod error;
pub mod grid;
pub mod partition;
pub mod stencil;

pub use convergence::local_error;
pub use error::{GridError, PartitionError};
pub use grid::{apply_boundary, Grid, GridState};
pub use partition::{compute_partition, Partition};
pub use stencil::{compute, compute_parallel, interior_rows, Stencil};
