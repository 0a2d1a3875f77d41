//! relax: a distributed Jacobi relaxation solver for the 2D Laplace
//! equation.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the relax sub-crates. For most users, adding `relax` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use relax::prelude::*;
//!
//! // 16 rows split over 4 in-process ranks.
//! let config = SolverConfig {
//!     iter_max: 5000,
//!     ..SolverConfig::with_shape(16, 16)
//! };
//! let solution = solve_local(&config, 4).unwrap();
//! assert_eq!(solution.report.termination, Termination::Converged);
//! assert!(solution.report.final_error <= config.tolerance);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`grid`] | `relax-core` | Grid buffers, partition, stencil, local error |
//! | [`comm`] | `relax-comm` | `Communicator` trait, thread and MPI hosts |
//! | [`engine`] | `relax-engine` | Halo exchange, reduction, iteration loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Grid buffers and single-rank kernels (`relax-core`).
pub use relax_core as grid;

/// Message-passing runtime interface (`relax-comm`).
///
/// Implement [`comm::Communicator`] to host ranks on a new runtime.
pub use relax_comm as comm;

/// The distributed iteration loop (`relax-engine`).
///
/// [`engine::IterationController`] drives one rank;
/// [`engine::solve_local`] runs a whole group on threads.
pub use relax_engine as engine;

/// Common imports for typical relax usage.
///
/// ```rust
/// use relax::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use relax_core::{Grid, GridState, Partition, Stencil};

    // Communication
    pub use relax_comm::{Communicator, LocalUniverse};

    // Engine
    pub use relax_engine::{
        run_local, solve_local, ExchangeStrategy, IterationController, RemainderPolicy, RunReport,
        SolverConfig, SolverState, Termination,
    };

    // Errors
    pub use relax_comm::CommError;
    pub use relax_core::GridError;
    pub use relax_engine::{ConfigError, SolveError};
}
