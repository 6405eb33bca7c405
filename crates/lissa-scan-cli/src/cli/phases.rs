//! Phases command: OR the coverage of several phase-shifted scans.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use lissa_scan::{combine_phases, PhaseFill, PhaseSet, ScanParameters};

use super::common::{print_json, write_mask_png, CliResult, ScanArgs};

#[derive(Debug, Clone, Args)]
pub struct PhasesArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Number of phases, evenly spaced over 2π
    #[arg(short = 'n', long = "phases", default_value_t = 8)]
    pub phase_count: usize,

    /// Write the combined coverage as a PNG (red on black)
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PhasesReport<'a> {
    params: ScanParameters,
    per_phase: &'a [PhaseFill],
    combined_fill_factor: f64,
    best_single_phase: Option<PhaseFill>,
}

/// Execute the phases command.
pub fn cmd_phases(args: &PhasesArgs) -> CliResult<()> {
    let params = args.scan.to_params();
    let phases = PhaseSet::uniform(args.phase_count)?;

    eprintln!(
        "Combining {} phases of fx={} fy={} on {}x{}...",
        phases.len(),
        params.fx,
        params.fy,
        params.resolution,
        params.resolution
    );
    let coverage = combine_phases(&params, &phases)?;

    if let Some(path) = &args.png {
        write_mask_png(&coverage.combined, path)?;
    }

    if args.json {
        return print_json(&PhasesReport {
            params,
            per_phase: &coverage.per_phase,
            combined_fill_factor: coverage.combined_fill_factor,
            best_single_phase: coverage.best_single_phase(),
        });
    }

    println!("{:>10}  {:>8}", "phase", "fill %");
    for fill in &coverage.per_phase {
        println!("{:>10.4}  {:>8.2}", fill.phase, fill.fill_factor);
    }
    println!("{:>10}  {:>8.2}", "combined", coverage.combined_fill_factor);
    Ok(())
}
