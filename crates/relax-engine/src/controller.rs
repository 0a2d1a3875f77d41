//! The per-rank iteration loop.
//!
//! [`IterationController`] runs one rank through the cycle
//!
//! ```text
//! exchange ghost rows → sweep owned rows → reduce error → swap buffers
//! ```
//!
//! and evaluates `error > tolerance && iteration < iter_max` after the
//! reduction. The error is the globally reduced value and the iteration
//! count advances in lock-step, so every rank evaluates the condition on
//! identical inputs and leaves the loop on the same iteration. A rank that
//! left early would strand its peers in the next exchange or reduction.
//!
//! # State machine
//!
//! ```text
//! Init ──step──▶ Running ──step──▶ … ──▶ Converged | MaxIterations
//! ```
//!
//! `Init` has the boundary condition applied, error 1.0 and iteration 0.

use std::time::Instant;

use relax_comm::Communicator;
use relax_core::{compute_partition, local_error, Grid, GridState, Partition};

use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::halo;
use crate::metrics::{RunMetrics, RunReport, StepMetrics, Termination};
use crate::reducer;

/// Error value before the first iteration.
pub const INITIAL_ERROR: f32 = 1.0;

// ── SolverContext ───────────────────────────────────────────────

/// Everything a rank mutates during a run: its two grid buffers and its
/// place in the decomposition.
#[derive(Clone, Debug)]
pub struct SolverContext {
    /// The double-buffered grid.
    pub grids: GridState,
    /// This rank's rows.
    pub partition: Partition,
}

impl SolverContext {
    /// Allocate both buffers with the boundary condition applied and
    /// place `rank` in a world of `world_size`.
    ///
    /// Validates `config` first.
    pub fn new(config: &SolverConfig, rank: usize, world_size: usize) -> Result<Self, SolveError> {
        config.validate(world_size)?;
        let partition = compute_partition(rank, world_size, config.rows)?;
        let grids = GridState::with_boundary(config.rows, config.cols)?;
        Ok(Self { grids, partition })
    }

    /// Start from an arbitrary initial grid instead of the standard
    /// boundary condition.
    pub fn from_grid(initial: Grid, partition: Partition) -> Self {
        Self {
            grids: GridState::from_grid(initial),
            partition,
        }
    }
}

// ── State ───────────────────────────────────────────────────────

/// Lifecycle of a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverState {
    /// Boundary applied, no iteration run yet.
    Init,
    /// At least one iteration run, loop condition still true.
    Running,
    /// Global error at or below the tolerance.
    Converged,
    /// Iteration cap reached with the error above the tolerance.
    MaxIterations,
}

impl SolverState {
    /// Whether the state is `Converged` or `MaxIterations`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::MaxIterations)
    }
}

/// Result of one [`IterationController::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// 1-based index of the iteration just completed.
    pub iteration: usize,
    /// Global error of that iteration, identical on every rank.
    pub error: f32,
    /// Timing of that iteration on this rank.
    pub metrics: StepMetrics,
}

// ── IterationController ─────────────────────────────────────────

/// Drives one rank of a Jacobi run.
pub struct IterationController<'c, C: Communicator + ?Sized> {
    comm: &'c C,
    config: SolverConfig,
    context: SolverContext,
    state: SolverState,
    error: f32,
    iteration: usize,
    metrics: RunMetrics,
}

impl<'c, C: Communicator + ?Sized> IterationController<'c, C> {
    /// Validate `config` against the communicator's world and set up this
    /// rank's context.
    pub fn new(config: SolverConfig, comm: &'c C) -> Result<Self, SolveError> {
        let context = SolverContext::new(&config, comm.rank(), comm.size())?;
        Ok(Self::with_context(config, context, comm))
    }

    /// Use a prepared context. The caller is responsible for it matching
    /// `config` and the communicator.
    pub fn with_context(config: SolverConfig, context: SolverContext, comm: &'c C) -> Self {
        Self {
            comm,
            config,
            context,
            state: SolverState::Init,
            error: INITIAL_ERROR,
            iteration: 0,
            metrics: RunMetrics::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Iterations completed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Global error of the last iteration (1.0 before the first).
    pub fn error(&self) -> f32 {
        self.error
    }

    /// The configuration in use.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Grid buffers and partition.
    pub fn context(&self) -> &SolverContext {
        &self.context
    }

    /// Give up the controller, keeping the context.
    pub fn into_context(self) -> SolverContext {
        self.context
    }

    /// Accumulated timings.
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// The loop condition. Only meaningful after a reduction, when every
    /// rank holds the same error and iteration count.
    pub fn should_continue(&self) -> bool {
        self.error > self.config.tolerance && self.iteration < self.config.iter_max
    }

    /// Run exactly one iteration, regardless of the loop condition.
    pub fn step(&mut self) -> Result<StepOutcome, SolveError> {
        let step_start = Instant::now();
        let SolverContext { grids, partition } = &mut self.context;

        let exchange_start = Instant::now();
        halo::exchange(grids.current_mut(), partition, self.comm, self.config.strategy)?;
        let exchange_us = exchange_start.elapsed().as_micros() as u64;

        let compute_start = Instant::now();
        {
            let (current, next) = grids.split();
            self.config
                .stencil
                .apply(current, next, partition.update_rows())?;
        }
        let local = local_error(grids.current(), grids.next(), partition.update_rows())?;
        let compute_us = compute_start.elapsed().as_micros() as u64;

        let reduce_start = Instant::now();
        let error = reducer::global_error(self.comm, local)?;
        let reduce_us = reduce_start.elapsed().as_micros() as u64;

        grids.swap();
        self.iteration += 1;
        self.error = error;
        self.state = self.classify();

        let metrics = StepMetrics {
            total_us: step_start.elapsed().as_micros() as u64,
            exchange_us,
            compute_us,
            reduce_us,
        };
        self.metrics.record(&metrics);

        if self.comm.rank() == 0 && self.iteration % self.config.report_every() == 0 {
            tracing::info!(iteration = self.iteration, error = %format_args!("{:.6}", error), "progress");
        }

        Ok(StepOutcome {
            iteration: self.iteration,
            error,
            metrics,
        })
    }

    /// Iterate until the loop condition fails, then report.
    ///
    /// Only rank 0 logs the result; every rank returns its own report.
    pub fn run(&mut self) -> Result<RunReport, SolveError> {
        let rank = self.comm.rank();
        if rank == 0 {
            tracing::info!(
                rows = self.config.rows,
                cols = self.config.cols,
                iter_max = self.config.iter_max,
                ranks = self.comm.size(),
                "Jacobi relaxation calculation"
            );
        }

        let start = self.comm.wtime();
        while self.should_continue() {
            self.step()?;
        }
        let elapsed_secs = self.comm.wtime() - start;
        self.state = self.classify();

        let report = RunReport {
            rank,
            iterations: self.iteration,
            final_error: self.error,
            elapsed_secs,
            termination: match self.state {
                SolverState::Converged => Termination::Converged,
                _ => Termination::MaxIterations,
            },
            metrics: self.metrics.clone(),
        };

        if report.is_designated() {
            tracing::info!(
                iterations = report.iterations,
                error = %format_args!("{:.6}", report.final_error),
                elapsed_secs = %format_args!("{:.6}", report.elapsed_secs),
                termination = ?report.termination,
                "finished"
            );
        }
        Ok(report)
    }

    fn classify(&self) -> SolverState {
        if self.error <= self.config.tolerance {
            SolverState::Converged
        } else if self.iteration >= self.config.iter_max {
            SolverState::MaxIterations
        } else if self.iteration == 0 {
            SolverState::Init
        } else {
            SolverState::Running
        }
    }
}

impl<C: Communicator + ?Sized> std::fmt::Debug for IterationController<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationController")
            .field("rank", &self.comm.rank())
            .field("state", &self.state)
            .field("iteration", &self.iteration)
            .field("error", &self.error)
            .finish()
    }
}
