//! Hosting a whole group of ranks inside one process.
//!
//! [`run_local`] starts one thread per rank over a [`LocalUniverse`] and
//! returns every rank's outcome. [`solve_local`] additionally stitches the
//! owned rows of each rank back into one global grid, which is what tests
//! and the CLI compare against single-rank runs.

use relax_comm::{Communicator, LocalUniverse};
use relax_core::{Grid, Partition};

use crate::config::SolverConfig;
use crate::controller::IterationController;
use crate::error::SolveError;
use crate::metrics::RunReport;

/// What one rank hands back after a successful run.
#[derive(Clone, Debug)]
pub struct RankOutcome {
    /// The rank's own report.
    pub report: RunReport,
    /// The rows this rank owned.
    pub partition: Partition,
    /// The rank's final grid. Only the owned rows are authoritative.
    pub grid: Grid,
}

/// Run `config` on `world_size` threads and collect every rank's outcome,
/// in rank order.
///
/// If any rank fails the whole run fails. The error reported is the
/// original failure rather than the disconnects it caused on the peers.
pub fn run_local(config: &SolverConfig, world_size: usize) -> Result<Vec<RankOutcome>, SolveError> {
    config.validate(world_size)?;
    let universe = LocalUniverse::new(world_size)?;

    let results = universe.run(|comm| -> Result<RankOutcome, SolveError> {
        let span = tracing::info_span!("rank", rank = comm.rank());
        let _guard = span.enter();
        let mut controller = IterationController::new(config.clone(), &comm)?;
        let report = controller.run()?;
        let context = controller.into_context();
        Ok(RankOutcome {
            report,
            partition: context.partition,
            grid: context.grids.into_current(),
        })
    })?;

    let mut outcomes = Vec::with_capacity(world_size);
    let mut primary: Option<SolveError> = None;
    let mut panicked: Option<SolveError> = None;
    let mut secondary: Option<SolveError> = None;

    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(Ok(outcome)) => outcomes.push(outcome),
            Ok(Err(e)) => {
                tracing::warn!(rank, error = %e, "rank failed");
                let slot = if e.is_secondary() {
                    &mut secondary
                } else {
                    &mut primary
                };
                slot.get_or_insert(e);
            }
            Err(_) => {
                tracing::error!(rank, "rank panicked");
                panicked.get_or_insert(SolveError::RankPanicked { rank });
            }
        }
    }

    match primary.or(panicked).or(secondary) {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

/// The assembled result of a local run.
#[derive(Clone, Debug)]
pub struct LocalSolution {
    /// Global grid: each rank's owned rows, plus the unowned rows at
    /// their initial values.
    pub grid: Grid,
    /// Rank 0's report.
    pub report: RunReport,
    /// Every rank's report, in rank order.
    pub reports: Vec<RunReport>,
}

/// Run `config` on `world_size` threads and assemble the global grid.
pub fn solve_local(config: &SolverConfig, world_size: usize) -> Result<LocalSolution, SolveError> {
    let mut outcomes = run_local(config, world_size)?.into_iter();
    // run_local validated world_size >= 1, so rank 0 is present.
    let Some(first) = outcomes.next() else {
        return Err(SolveError::Config(crate::config::ConfigError::EmptyWorld));
    };

    let mut grid = first.grid;
    let mut reports = vec![first.report];
    for outcome in outcomes {
        let rows = outcome.partition.owned();
        let src = outcome.grid.rows_slice(rows.clone())?;
        grid.rows_slice_mut(rows)?.copy_from_slice(src);
        reports.push(outcome.report);
    }

    Ok(LocalSolution {
        grid,
        report: reports[0].clone(),
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::metrics::Termination;

    #[test]
    fn invalid_world_rejected_before_spawning() {
        let config = SolverConfig::with_shape(10, 10);
        assert!(matches!(
            run_local(&config, 3),
            Err(SolveError::Config(ConfigError::UnevenRows { .. }))
        ));
        assert!(matches!(
            run_local(&config, 0),
            Err(SolveError::Config(ConfigError::EmptyWorld))
        ));
    }

    #[test]
    fn every_rank_reports_the_same_iteration_and_error() {
        let config = SolverConfig {
            iter_max: 25,
            ..SolverConfig::with_shape(16, 12)
        };
        let outcomes = run_local(&config, 4).unwrap();
        assert_eq!(outcomes.len(), 4);
        let first = &outcomes[0].report;
        for (rank, o) in outcomes.iter().enumerate() {
            assert_eq!(o.report.rank, rank);
            assert_eq!(o.partition.rank(), rank);
            assert_eq!(o.report.iterations, first.iterations);
            assert_eq!(o.report.final_error.to_bits(), first.final_error.to_bits());
            assert_eq!(o.report.termination, first.termination);
        }
        assert_eq!(first.termination, Termination::MaxIterations);
        assert_eq!(first.iterations, 25);
    }

    #[test]
    fn solution_report_is_rank_zero() {
        let config = SolverConfig {
            iter_max: 3,
            ..SolverConfig::with_shape(8, 8)
        };
        let sol = solve_local(&config, 2).unwrap();
        assert_eq!(sol.report.rank, 0);
        assert_eq!(sol.reports.len(), 2);
        assert_eq!(sol.grid.shape(), (8, 8));
    }
}
