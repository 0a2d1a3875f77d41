//! Integration test: the decomposition does not change the numbers.
//!
//! A Jacobi sweep reads only the previous iteration, so splitting the rows
//! over any number of ranks must reproduce the single-process trajectory
//! exactly: same iteration count, same final error, bit-identical grid.

use proptest::prelude::*;
use relax_core::Stencil;
use relax_engine::{solve_local, ExchangeStrategy, SolverConfig, Termination};
use relax_test_utils::{bit_identical, reference_solve};

fn config(rows: usize, cols: usize, iter_max: usize, tolerance: f32) -> SolverConfig {
    SolverConfig {
        iter_max,
        tolerance,
        ..SolverConfig::with_shape(rows, cols)
    }
}

#[test]
fn one_and_four_ranks_are_bit_identical() {
    let c = config(32, 24, 200, 3.0e-3);
    let one = solve_local(&c, 1).unwrap();
    let four = solve_local(&c, 4).unwrap();
    assert_eq!(one.report.iterations, four.report.iterations);
    assert_eq!(
        one.report.final_error.to_bits(),
        four.report.final_error.to_bits()
    );
    assert!(bit_identical(&one.grid, &four.grid));
}

#[test]
fn every_even_world_size_matches_the_reference() {
    let (rows, cols, iter_max) = (24, 20, 60);
    let reference = reference_solve(rows, cols, iter_max, -1.0);
    for world in [1, 2, 3, 4, 6, 8, 12, 24] {
        let sol = solve_local(&config(rows, cols, iter_max, -1.0), world).unwrap();
        assert_eq!(sol.report.iterations, reference.iterations, "world {world}");
        assert_eq!(
            sol.report.final_error.to_bits(),
            reference.error.to_bits(),
            "world {world}"
        );
        assert!(bit_identical(&sol.grid, &reference.grid), "world {world}");
    }
}

#[test]
fn convergence_point_matches_the_reference() {
    let (rows, cols) = (16, 16);
    let reference = reference_solve(rows, cols, 5000, 3.0e-3);
    let sol = solve_local(&config(rows, cols, 5000, 3.0e-3), 4).unwrap();
    assert_eq!(sol.report.termination, Termination::Converged);
    assert_eq!(sol.report.iterations, reference.iterations);
    assert!(bit_identical(&sol.grid, &reference.grid));
}

#[test]
fn exchange_strategies_agree() {
    let base = config(20, 16, 40, -1.0);
    let send_receive = solve_local(&base, 5).unwrap();
    let ordered = solve_local(
        &SolverConfig {
            strategy: ExchangeStrategy::Ordered,
            ..base
        },
        5,
    )
    .unwrap();
    assert!(bit_identical(&send_receive.grid, &ordered.grid));
    assert_eq!(
        send_receive.report.final_error.to_bits(),
        ordered.report.final_error.to_bits()
    );
}

#[test]
fn parallel_stencil_agrees_with_serial() {
    let base = config(32, 48, 30, -1.0);
    let serial = solve_local(&base, 2).unwrap();
    let parallel = solve_local(
        &SolverConfig {
            stencil: Stencil::Parallel,
            ..base
        },
        2,
    )
    .unwrap();
    assert!(bit_identical(&serial.grid, &parallel.grid));
}

#[test]
fn all_ranks_agree_on_every_report() {
    let sol = solve_local(&config(12, 12, 500, 3.0e-3), 3).unwrap();
    for report in &sol.reports {
        assert_eq!(report.iterations, sol.report.iterations);
        assert_eq!(report.final_error.to_bits(), sol.report.final_error.to_bits());
        assert_eq!(report.termination, sol.report.termination);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_even_split_matches_the_reference(
        world in 1usize..6,
        per_rank in 1usize..6,
        cols in 3usize..10,
        iter_max in 0usize..15,
    ) {
        let rows = world * per_rank;
        prop_assume!(rows >= 3);
        let reference = reference_solve(rows, cols, iter_max, -1.0);
        let sol = solve_local(&config(rows, cols, iter_max, -1.0), world).unwrap();
        prop_assert_eq!(sol.report.iterations, reference.iterations);
        prop_assert!(bit_identical(&sol.grid, &reference.grid));
    }
}
