//! Test utilities for relax development.
//!
//! Provides a straight-line single-process Jacobi solver to compare the
//! distributed engine against, grid checks shared by the integration
//! tests, and mock [`Communicator`](relax_comm::Communicator)s in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use relax_core::{apply_boundary, Grid};

/// Result of [`reference_solve`].
#[derive(Clone, Debug)]
pub struct ReferenceRun {
    pub grid: Grid,
    pub iterations: usize,
    pub error: f32,
}

/// Solve the whole grid in one loop with no decomposition, no buffer
/// swapping and no communication.
///
/// Uses the same summation order as the engine's stencil, so results
/// are bit-identical to a correct distributed run.
pub fn reference_solve(rows: usize, cols: usize, iter_max: usize, tolerance: f32) -> ReferenceRun {
    let mut a = vec![0.0f32; rows * cols];
    let mut boundary = Grid::from_vec(rows, cols, a.clone()).expect("shape");
    apply_boundary(&mut boundary);
    a.copy_from_slice(boundary.as_slice());
    let mut anew = a.clone();

    let mut error = 1.0f32;
    let mut iterations = 0;
    while error > tolerance && iterations < iter_max {
        error = 0.0;
        for i in 1..rows - 1 {
            for j in 1..cols - 1 {
                let c = i * cols + j;
                anew[c] = (a[c + 1] + a[c - 1] + a[c - cols] + a[c + cols]) / 4.0;
                error = error.max((anew[c] - a[c]).abs().sqrt());
            }
        }
        for i in 1..rows - 1 {
            for j in 1..cols - 1 {
                let c = i * cols + j;
                a[c] = anew[c];
            }
        }
        iterations += 1;
    }

    ReferenceRun {
        grid: Grid::from_vec(rows, cols, a).expect("shape"),
        iterations,
        error,
    }
}

/// Largest `|avg(neighbours) - value|` over the interior of `grid`.
///
/// Zero for an exact discrete harmonic function.
pub fn max_residual(grid: &Grid) -> f32 {
    let (rows, cols) = grid.shape();
    let mut worst = 0.0f32;
    for i in 1..rows.saturating_sub(1) {
        for j in 1..cols.saturating_sub(1) {
            let avg = (grid.get(i, j + 1)
                + grid.get(i, j - 1)
                + grid.get(i - 1, j)
                + grid.get(i + 1, j))
                / 4.0;
            worst = worst.max((avg - grid.get(i, j)).abs());
        }
    }
    worst
}

/// The boundary condition on a fresh `rows x cols` grid.
pub fn boundary_grid(rows: usize, cols: usize) -> Grid {
    let mut g = Grid::zeroed(rows, cols).expect("alloc");
    apply_boundary(&mut g);
    g
}

/// Whether `grid`'s outer frame equals the boundary condition exactly.
pub fn boundary_intact(grid: &Grid) -> bool {
    let (rows, cols) = grid.shape();
    let expected = boundary_grid(rows, cols);
    let on_frame = |i: usize, j: usize| i == 0 || j == 0 || i == rows - 1 || j == cols - 1;
    (0..rows).all(|i| {
        (0..cols)
            .filter(|&j| on_frame(i, j))
            .all(|j| grid.get(i, j).to_bits() == expected.get(i, j).to_bits())
    })
}

/// Bitwise grid equality, including the sign of zeros.
pub fn bit_identical(a: &Grid, b: &Grid) -> bool {
    a.shape() == b.shape()
        && a
            .as_slice()
            .iter()
            .zip(b.as_slice())
            .all(|(x, y)| x.to_bits() == y.to_bits())
}
