//! Trace command: one scan, one raster.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use serde::Serialize;

use lissa_scan::{
    rasterize, Convention, CoverageSummary, PixelPolicy, RasterStats, ScanParameters, Trajectory,
};

use super::common::{print_json, trajectory_to_svg, write_mask_png, write_text, CliResult, ScanArgs};

#[derive(Debug, Clone, Args)]
pub struct TraceArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Y phase offset (radians)
    #[arg(short = 'p', long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub phase: f64,

    /// Write the covered cells as a PNG (red on black)
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Write the trajectory as an SVG polyline
    #[arg(long)]
    pub svg: Option<PathBuf>,

    /// Maximum polyline vertices in the SVG
    #[arg(long, default_value_t = 20_000)]
    pub max_points: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct TraceReport {
    params: ScanParameters,
    frame_rate: u64,
    samples: u64,
    stats: RasterStats,
    coverage: CoverageSummary,
    elapsed_ms: f64,
}

/// Execute the trace command.
pub fn cmd_trace(args: &TraceArgs) -> CliResult<()> {
    let params = args.scan.to_params().with_phase(args.phase);
    params.validate()?;

    let size = params.resolution as f64;
    let trajectory = Trajectory::from_params(&params, Convention::frame(size))?;
    eprintln!(
        "Tracing fx={} fy={} phase={:.4}: {} samples on {}x{}",
        params.fx,
        params.fy,
        params.phase,
        trajectory.len(),
        params.resolution,
        params.resolution
    );

    let start = Instant::now();
    let policy = PixelPolicy::frame_pixels(params.resolution);
    let raster = rasterize(&trajectory, params.resolution, policy)?;
    let elapsed = start.elapsed();

    if let Some(path) = &args.png {
        write_mask_png(&raster.map.mask(), path)?;
    }
    if let Some(path) = &args.svg {
        write_text(path, &trajectory_to_svg(&trajectory, size, args.max_points))?;
    }

    let report = TraceReport {
        params,
        frame_rate: params.frame_rate(),
        samples: trajectory.len() as u64,
        stats: raster.stats,
        coverage: raster.map.summary(),
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
    };

    if args.json {
        return print_json(&report);
    }

    let c = &report.coverage;
    println!("fx / fy:        {} / {} Hz", params.fx, params.fy);
    println!("Frame rate:     {} Hz", report.frame_rate);
    println!("Samples:        {} ({} dropped)", report.samples, report.stats.dropped);
    println!("Fill factor:    {:.2}% ({})", c.fill_factor, c.rating.name());
    println!("Covered cells:  {} / {}", c.covered_cells, c.total_cells);
    println!("Hits per cell:  {:.2} mean, {} max", c.mean_hits_per_covered_cell, c.max_hits);
    println!("Time:           {:.2}ms", report.elapsed_ms);
    Ok(())
}
