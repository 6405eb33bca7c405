//! lissa-scan - coverage simulation and scan-parameter search for Lissajous scans
//!
//! Usage:
//!   lissa-scan trace --fx 2160 --fy 2100        Fill factor of one scan
//!   lissa-scan phases --fx 2160 --fy 2100 -n 8  Multi-phase combined coverage
//!   lissa-scan search --config scan.yaml        Best frequency pair in a range
//!   lissa-scan sweep --from 2 --to 36           Harmonic ratio sweep
//!   lissa-scan map photo.png                    Resample an image along the scan
//!   lissa-scan example-config                   Print a YAML config template

mod cli;

use clap::{Parser, Subcommand};

use cli::{MapArgs, PhasesArgs, SearchArgs, SweepArgs, TraceArgs};

#[derive(Parser)]
#[command(name = "lissa-scan")]
#[command(about = "Simulate Lissajous scan coverage and search for scan frequencies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rasterize a single scan and report its coverage.
    Trace(TraceArgs),

    /// Combine several phase-shifted scans of the same frequencies.
    Phases(PhasesArgs),

    /// Search a frequency range for the scan with the most lobes.
    Search(SearchArgs),

    /// Sweep neighbouring harmonics of a base frequency.
    Sweep(SweepArgs),

    /// Transfer a grayscale image onto the grid along the scan path.
    Map(MapArgs),

    /// Print an example YAML configuration for `search` and `sweep`.
    ExampleConfig,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Trace(args) => cli::cmd_trace(args),
        Commands::Phases(args) => cli::cmd_phases(args),
        Commands::Search(args) => cli::cmd_search(args),
        Commands::Sweep(args) => cli::cmd_sweep(args),
        Commands::Map(args) => cli::cmd_map(args),
        Commands::ExampleConfig => cli::cmd_example_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
