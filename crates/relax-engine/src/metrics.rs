//! Per-iteration timings and the end-of-run report.
//!
//! [`StepMetrics`] captures where one iteration spent its time;
//! [`RunMetrics`] accumulates them over a run. Durations are in
//! microseconds.

/// Timing of a single iteration on one rank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the whole iteration.
    pub total_us: u64,
    /// Time spent refreshing ghost rows (includes waiting for neighbours).
    pub exchange_us: u64,
    /// Time spent in the stencil sweep and the local error scan.
    pub compute_us: u64,
    /// Time spent in the global all-reduce alone (includes waiting for the
    /// slowest rank).
    pub reduce_us: u64,
}

/// Totals over every iteration of a run on one rank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Iterations recorded.
    pub steps: u64,
    /// Sum of [`StepMetrics::total_us`].
    pub total_us: u64,
    /// Sum of [`StepMetrics::exchange_us`].
    pub exchange_us: u64,
    /// Sum of [`StepMetrics::compute_us`].
    pub compute_us: u64,
    /// Sum of [`StepMetrics::reduce_us`].
    pub reduce_us: u64,
}

impl RunMetrics {
    /// Fold one iteration into the totals.
    pub fn record(&mut self, step: &StepMetrics) {
        self.steps += 1;
        self.total_us += step.total_us;
        self.exchange_us += step.exchange_us;
        self.compute_us += step.compute_us;
        self.reduce_us += step.reduce_us;
    }

    /// Share of iteration time spent communicating, in `[0, 1]`.
    pub fn communication_fraction(&self) -> f64 {
        if self.total_us == 0 {
            return 0.0;
        }
        (self.exchange_us + self.reduce_us) as f64 / self.total_us as f64
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The global error reached the tolerance.
    Converged,
    /// The iteration cap was hit first.
    MaxIterations,
}

/// Outcome of a completed run, as seen by one rank.
///
/// Every rank builds one; only rank 0 logs it.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// The rank that produced this report.
    pub rank: usize,
    /// Iterations executed.
    pub iterations: usize,
    /// Global error after the last iteration (1.0 if none ran).
    pub final_error: f32,
    /// Wall-clock seconds spent in the iteration loop.
    pub elapsed_secs: f64,
    /// Why the loop ended.
    pub termination: Termination,
    /// Accumulated per-iteration timings.
    pub metrics: RunMetrics,
}

impl RunReport {
    /// Whether this rank is the one that reports results.
    pub fn is_designated(&self) -> bool {
        self.rank == 0
    }
}
