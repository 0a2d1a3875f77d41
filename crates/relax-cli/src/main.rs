//! relax CLI: solve the 2D Laplace equation by Jacobi relaxation.
//!
//! ```bash
//! # 4096 x 4096 grid, at most 1000 iterations, on 4 in-process ranks
//! relax 4096 4096 1000 --ranks 4
//!
//! # One process per rank under MPI (build with --features mpi)
//! mpirun -n 4 relax 4096 4096 1000 --mpi
//! ```
//!
//! Only rank 0 prints. The exit status is 0 whether the run converged or
//! hit the iteration cap.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use relax_core::Stencil;
use relax_engine::{
    solve_local, ExchangeStrategy, RemainderPolicy, RunReport, SolverConfig, Termination,
};
use tracing_subscriber::EnvFilter;

/// Distributed Jacobi relaxation for the 2D Laplace equation
#[derive(Debug, Parser)]
#[command(name = "relax")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Grid rows
    #[arg(default_value_t = 4096)]
    rows: usize,

    /// Grid columns
    #[arg(default_value_t = 4096)]
    cols: usize,

    /// Maximum number of iterations
    #[arg(default_value_t = 1000)]
    iter_max: usize,

    /// Stop once the global error is at or below this
    #[arg(short, long, default_value_t = 3.0e-3, allow_negative_numbers = true)]
    tolerance: f32,

    /// Number of in-process ranks (ignored with --mpi)
    #[arg(short = 'n', long, default_value_t = 1)]
    ranks: usize,

    /// Ghost row exchange pattern
    #[arg(short, long, value_enum, default_value_t = StrategyArg::SendReceive)]
    strategy: StrategyArg,

    /// Leave the trailing rows unowned when ranks do not divide rows
    #[arg(long)]
    allow_truncation: bool,

    /// Sweep each rank's rows on the rayon thread pool
    #[arg(long)]
    parallel_stencil: bool,

    /// Progress line every this many iterations (default: iter_max / 10)
    #[arg(long)]
    report_interval: Option<usize>,

    /// Run as one MPI process per rank
    #[cfg(feature = "mpi")]
    #[arg(long)]
    mpi: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Combined send-and-receive per neighbour
    SendReceive,
    /// Send then receive, down neighbour first
    Ordered,
}

impl From<StrategyArg> for ExchangeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::SendReceive => ExchangeStrategy::SendReceive,
            StrategyArg::Ordered => ExchangeStrategy::Ordered,
        }
    }
}

impl Cli {
    fn config(&self) -> SolverConfig {
        SolverConfig {
            rows: self.rows,
            cols: self.cols,
            iter_max: self.iter_max,
            tolerance: self.tolerance,
            strategy: self.strategy.into(),
            remainder: if self.allow_truncation {
                RemainderPolicy::Truncate
            } else {
                RemainderPolicy::Reject
            },
            stencil: if self.parallel_stencil {
                Stencil::Parallel
            } else {
                Stencil::Serial
            },
            report_interval: self.report_interval,
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn print_banner(config: &SolverConfig) {
    println!(
        "Jacobi relaxation Calculation: {} rows x {} columns mesh, maximum of {} iterations",
        config.rows, config.cols, config.iter_max
    );
}

fn print_report(report: &RunReport) {
    if !report.is_designated() {
        return;
    }
    let outcome = match report.termination {
        Termination::Converged => "converged",
        Termination::MaxIterations => "iteration cap reached",
    };
    println!(
        "{} after {} iterations, error {:.6}",
        outcome, report.iterations, report.final_error
    );
    println!("Elapsed time: {:.6} seconds", report.elapsed_secs);
}

fn run_threads(cli: &Cli) -> Result<()> {
    let config = cli.config();
    tracing::debug!(?config, ranks = cli.ranks, "starting in-process ranks");
    print_banner(&config);
    let solution = solve_local(&config, cli.ranks)
        .with_context(|| format!("solver failed on {} in-process ranks", cli.ranks))?;
    print_report(&solution.report);
    Ok(())
}

/// Ordered exchange relies on the runtime buffering sends; MPI may not.
#[cfg_attr(not(feature = "mpi"), allow(dead_code))]
fn sends_may_block(config: &SolverConfig) -> bool {
    config.strategy == ExchangeStrategy::Ordered
}

#[cfg(feature = "mpi")]
fn run_mpi(cli: &Cli) -> Result<()> {
    use relax_comm::{Communicator, MpiComm};
    use relax_engine::IterationController;

    let (_universe, comm) = MpiComm::initialize().context("MPI initialisation failed")?;
    let config = cli.config();
    if comm.rank() == 0 {
        if sends_may_block(&config) {
            tracing::warn!(
                "ordered exchange can deadlock when MPI does not buffer sends; \
                 use --strategy send-receive"
            );
        }
        print_banner(&config);
    }
    let mut controller = IterationController::new(config, &comm)
        .with_context(|| format!("rank {} could not start", comm.rank()))?;
    let report = controller
        .run()
        .with_context(|| format!("rank {} failed", comm.rank()))?;
    print_report(&report);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    #[cfg(feature = "mpi")]
    {
        if cli.mpi {
            return run_mpi(&cli);
        }
    }
    run_threads(&cli)
}
