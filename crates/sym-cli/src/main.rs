//! CLI driver for Symbiont populations.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use commands::RunOptions;

#[derive(Parser)]
#[command(
    name = "sym",
    about = "Symbiont: linking, sharing and starving agents in a circular field",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs a population.
#[derive(Args)]
struct PopulationArgs {
    /// Number of agents to seed
    #[arg(short, long, default_value = "60")]
    agents: usize,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "100")]
    ticks: u64,

    /// Simulated seconds per tick
    #[arg(long, default_value = "0.1")]
    dt: f64,

    /// RNG seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,
}

impl PopulationArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            agents: self.agents,
            ticks: self.ticks,
            dt: self.dt,
            seed: self.seed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a population and print its health dashboard
    Run {
        #[command(flatten)]
        population: PopulationArgs,

        /// Dashboard rows to show, least healthy first
        #[arg(short, long, default_value = "20")]
        rows: usize,

        /// Show all events (not just deaths)
        #[arg(short, long)]
        verbose: bool,

        /// Audit link and resource invariants after every tick
        #[arg(long)]
        check: bool,
    },

    /// Run a population and export its final state as JSON
    Snapshot {
        #[command(flatten)]
        population: PopulationArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            population,
            rows,
            verbose,
            check,
        } => commands::run::run(&population.options(), rows, verbose, check),
        Commands::Snapshot { population, output } => {
            commands::snapshot::run(&population.options(), output.as_deref())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
