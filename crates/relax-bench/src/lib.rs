//! Benchmark profiles for the relax Jacobi solver.
//!
//! - [`reference_profile`]: 512x512 grid with a fixed iteration count
//! - [`stress_profile`]: 2048x2048 grid with a fixed iteration count
//! - [`boundary_state`]: double-buffered grid ready for a sweep

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use relax_core::{GridError, GridState};
use relax_engine::SolverConfig;

/// 512x512 grid, `iter_max` iterations, unreachable tolerance so every
/// run does the same amount of work.
pub fn reference_profile(iter_max: usize) -> SolverConfig {
    SolverConfig {
        iter_max,
        tolerance: -1.0,
        report_interval: Some(usize::MAX),
        ..SolverConfig::with_shape(512, 512)
    }
}

/// Same as [`reference_profile`] at 16x the cell count.
pub fn stress_profile(iter_max: usize) -> SolverConfig {
    SolverConfig {
        iter_max,
        tolerance: -1.0,
        report_interval: Some(usize::MAX),
        ..SolverConfig::with_shape(2048, 2048)
    }
}

/// Both buffers of a `rows x cols` grid with the boundary applied.
pub fn boundary_state(rows: usize, cols: usize) -> Result<GridState, GridError> {
    GridState::with_boundary(rows, cols)
}
