//! Solver configuration, validation, and error types.
//!
//! [`SolverConfig`] carries the launch parameters. Every rank validates the
//! same configuration against the same world size, so either all ranks
//! start or all ranks fail with the same [`ConfigError`] before any
//! message is exchanged.

use std::error::Error;
use std::fmt;

use relax_core::Stencil;

// ── Policies ───────────────────────────────────────────────────────

/// What to do when the world size does not divide the row count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemainderPolicy {
    /// Refuse to start with [`ConfigError::UnevenRows`].
    #[default]
    Reject,
    /// Start anyway. The trailing `rows % world_size` rows are owned by
    /// no rank and keep their initial values for the whole run.
    Truncate,
}

/// How ranks swap boundary rows with their neighbours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExchangeStrategy {
    /// One combined send-and-receive per neighbour. Deadlock-free on any
    /// runtime.
    #[default]
    SendReceive,
    /// A send followed by a receive per neighbour, down pair first. Only
    /// safe when the runtime buffers sends.
    Ordered,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SolverConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Fewer than three rows leaves no interior.
    TooFewRows {
        /// The configured row count.
        rows: usize,
    },
    /// Fewer than three columns leaves no interior.
    TooFewColumns {
        /// The configured column count.
        cols: usize,
    },
    /// The world has no ranks.
    EmptyWorld,
    /// Some rank would own no rows at all.
    MoreRanksThanRows {
        /// The configured row count.
        rows: usize,
        /// The world size.
        world_size: usize,
    },
    /// The world size does not divide the row count under
    /// [`RemainderPolicy::Reject`].
    UnevenRows {
        /// The configured row count.
        rows: usize,
        /// The world size.
        world_size: usize,
    },
    /// The tolerance is NaN.
    InvalidTolerance {
        /// The invalid value.
        value: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewRows { rows } => write!(f, "need at least 3 rows, got {rows}"),
            Self::TooFewColumns { cols } => write!(f, "need at least 3 columns, got {cols}"),
            Self::EmptyWorld => write!(f, "world size must be at least 1"),
            Self::MoreRanksThanRows { rows, world_size } => {
                write!(f, "{world_size} ranks cannot share {rows} rows")
            }
            Self::UnevenRows { rows, world_size } => write!(
                f,
                "{rows} rows do not divide evenly over {world_size} ranks \
                 ({} trailing rows would be left unowned)",
                rows % world_size
            ),
            Self::InvalidTolerance { value } => {
                write!(f, "tolerance must be a number, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── SolverConfig ───────────────────────────────────────────────────

/// Launch parameters shared by every rank.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    /// Global row count `n`. Default: 4096.
    pub rows: usize,
    /// Global column count `m`. Default: 4096.
    pub cols: usize,
    /// Iteration cap. Default: 1000.
    pub iter_max: usize,
    /// Stop once the global error is at or below this. Default: 3.0e-3.
    pub tolerance: f32,
    /// Boundary row exchange pattern.
    pub strategy: ExchangeStrategy,
    /// Handling of rows left over by an uneven split.
    pub remainder: RemainderPolicy,
    /// Thread layout of the local sweep.
    pub stencil: Stencil,
    /// Progress is logged every this many iterations. `None` means
    /// `iter_max / 10`. Values are clamped to at least 1.
    pub report_interval: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rows: 4096,
            cols: 4096,
            iter_max: 1000,
            tolerance: 3.0e-3,
            strategy: ExchangeStrategy::default(),
            remainder: RemainderPolicy::default(),
            stencil: Stencil::default(),
            report_interval: None,
        }
    }
}

impl SolverConfig {
    /// Default parameters on an `rows x cols` grid.
    pub fn with_shape(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Check the configuration against a world of `world_size` ranks.
    pub fn validate(&self, world_size: usize) -> Result<(), ConfigError> {
        if self.rows < 3 {
            return Err(ConfigError::TooFewRows { rows: self.rows });
        }
        if self.cols < 3 {
            return Err(ConfigError::TooFewColumns { cols: self.cols });
        }
        if world_size == 0 {
            return Err(ConfigError::EmptyWorld);
        }
        if world_size > self.rows {
            return Err(ConfigError::MoreRanksThanRows {
                rows: self.rows,
                world_size,
            });
        }
        if self.remainder == RemainderPolicy::Reject && self.rows % world_size != 0 {
            return Err(ConfigError::UnevenRows {
                rows: self.rows,
                world_size,
            });
        }
        if self.tolerance.is_nan() {
            return Err(ConfigError::InvalidTolerance {
                value: self.tolerance,
            });
        }
        Ok(())
    }

    /// Iterations between progress lines.
    pub fn report_every(&self) -> usize {
        self.report_interval.unwrap_or(self.iter_max / 10).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let c = SolverConfig::default();
        assert_eq!((c.rows, c.cols, c.iter_max), (4096, 4096, 1000));
        assert_eq!(c.tolerance, 3.0e-3);
        assert_eq!(c.strategy, ExchangeStrategy::SendReceive);
        assert_eq!(c.remainder, RemainderPolicy::Reject);
        assert_eq!(c.report_every(), 100);
    }

    #[test]
    fn report_interval_never_zero() {
        let c = SolverConfig {
            iter_max: 5,
            ..SolverConfig::default()
        };
        assert_eq!(c.report_every(), 1);
        let c = SolverConfig {
            report_interval: Some(0),
            ..SolverConfig::default()
        };
        assert_eq!(c.report_every(), 1);
    }

    #[test]
    fn valid_default_config() {
        assert!(SolverConfig::default().validate(4).is_ok());
        assert!(SolverConfig::default().validate(1).is_ok());
    }

    #[test]
    fn tiny_grids_rejected() {
        assert_eq!(
            SolverConfig::with_shape(2, 10).validate(1),
            Err(ConfigError::TooFewRows { rows: 2 })
        );
        assert_eq!(
            SolverConfig::with_shape(10, 2).validate(1),
            Err(ConfigError::TooFewColumns { cols: 2 })
        );
    }

    #[test]
    fn world_size_checks() {
        let c = SolverConfig::with_shape(8, 8);
        assert_eq!(c.validate(0), Err(ConfigError::EmptyWorld));
        assert_eq!(
            c.validate(9),
            Err(ConfigError::MoreRanksThanRows {
                rows: 8,
                world_size: 9
            })
        );
    }

    #[test]
    fn uneven_rows_follow_policy() {
        let mut c = SolverConfig::with_shape(10, 8);
        assert_eq!(
            c.validate(3),
            Err(ConfigError::UnevenRows {
                rows: 10,
                world_size: 3
            })
        );
        c.remainder = RemainderPolicy::Truncate;
        assert!(c.validate(3).is_ok());
    }

    #[test]
    fn nan_tolerance_rejected() {
        let c = SolverConfig {
            tolerance: f32::NAN,
            ..SolverConfig::with_shape(8, 8)
        };
        assert!(matches!(
            c.validate(1),
            Err(ConfigError::InvalidTolerance { .. })
        ));
    }

    #[test]
    fn uneven_message_counts_leftover_rows() {
        let e = ConfigError::UnevenRows {
            rows: 10,
            world_size: 4,
        };
        assert!(e.to_string().contains("2 trailing rows"));
    }
}
