//! Distributed Jacobi iteration loop.
//!
//! [`IterationController`] drives one rank through the lock-step cycle
//! exchange → sweep → reduce → swap, and decides termination from the
//! globally reduced error so that every rank stops on the same iteration.
//! [`cluster::run_local`] hosts a whole group of ranks on threads of the
//! current process.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod controller;
pub mod error;
pub mod halo;
pub mod metrics;
pub mod reducer;

pub use cluster::{run_local, solve_local, LocalSolution, RankOutcome};
pub use config::{ConfigError, ExchangeStrategy, RemainderPolicy, SolverConfig};
pub use controller::{IterationController, SolverContext, SolverState, StepOutcome};
pub use error::SolveError;
pub use metrics::{RunMetrics, RunReport, StepMetrics, Termination};
