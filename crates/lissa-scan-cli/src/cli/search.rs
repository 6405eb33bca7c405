//! Search command: best scan frequencies within a range.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use serde::Serialize;

use lissa_scan::optimizer::SearchStats;
use lissa_scan::{search, BestParameters, CandidateRecord, SearchConfig, TieBreak};

use super::common::{print_json, CliResult};
use super::config::ConfigFile;

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// YAML config file (`search:` section); flags override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// First fx to try (Hz)
    #[arg(long)]
    pub fx_start: Option<u32>,

    /// End of the fx range, exclusive (Hz)
    #[arg(long)]
    pub fx_end: Option<u32>,

    /// First fy to try (Hz)
    #[arg(long)]
    pub fy_start: Option<u32>,

    /// End of the fy range, exclusive (Hz)
    #[arg(long)]
    pub fy_end: Option<u32>,

    /// Spot size FWHM (µm)
    #[arg(long)]
    pub fwhm: Option<f64>,

    /// Detector pixel pitch (µm)
    #[arg(long)]
    pub pixel_pitch: Option<f64>,

    /// Sample clock (Hz)
    #[arg(short = 's', long)]
    pub sampling_frequency: Option<u64>,

    /// Lowest acceptable frame rate (Hz)
    #[arg(long)]
    pub min_frame_rate: Option<u32>,

    /// Grid side length for fill-factor scoring
    #[arg(short = 'r', long)]
    pub resolution: Option<usize>,

    /// Phase used for fill-factor scoring (radians)
    #[arg(long, allow_negative_numbers = true)]
    pub phase: Option<f64>,

    /// Tie-break among equal lobe counts: first, min-fcp
    #[arg(short = 't', long)]
    pub tie_break: Option<String>,

    /// How many ranked candidates to list
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// Config file values with command-line overrides applied.
    fn resolve(&self) -> CliResult<SearchConfig> {
        let mut config = ConfigFile::load_or_default(self.config.as_deref())?.search;

        if let Some(v) = self.fx_start {
            config.fx_range.start = v;
        }
        if let Some(v) = self.fx_end {
            config.fx_range.end = v;
        }
        if let Some(v) = self.fy_start {
            config.fy_range.start = v;
        }
        if let Some(v) = self.fy_end {
            config.fy_range.end = v;
        }
        if let Some(v) = self.fwhm {
            config.fwhm = v;
        }
        if let Some(v) = self.pixel_pitch {
            config.pixel_pitch = v;
        }
        if let Some(v) = self.sampling_frequency {
            config.sampling_frequency = v;
        }
        if let Some(v) = self.min_frame_rate {
            config.min_frame_rate = v;
        }
        if let Some(v) = self.resolution {
            config.resolution = v;
        }
        if let Some(v) = self.phase {
            config.phase = v;
        }
        if let Some(name) = &self.tie_break {
            config.tie_break = TieBreak::from_name(name).ok_or_else(|| {
                let known: Vec<&str> = TieBreak::all().iter().map(|t| t.name()).collect();
                format!("Unknown tie-break '{}' (expected one of: {})", name, known.join(", "))
            })?;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    timestamp: String,
    config: &'a SearchConfig,
    best: &'a BestParameters,
    stats: &'a SearchStats,
    top: Vec<&'a CandidateRecord>,
    elapsed_ms: f64,
}

/// Execute the search command.
pub fn cmd_search(args: &SearchArgs) -> CliResult<()> {
    let config = args.resolve()?;

    eprintln!(
        "Searching fx {}..{} x fy {}..{} ({} pairs, tie-break {})...",
        config.fx_range.start,
        config.fx_range.end,
        config.fy_range.start,
        config.fy_range.end,
        config.pair_count(),
        config.tie_break.name()
    );
    let start = Instant::now();
    let report = search(&config)?;
    let elapsed = start.elapsed();

    let mut top = report.ranked();
    top.truncate(args.top);

    if args.json {
        return print_json(&SearchOutput {
            timestamp: chrono::Local::now().to_rfc3339(),
            config: &config,
            best: &report.best,
            stats: &report.stats,
            top,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        });
    }

    let s = &report.stats;
    println!(
        "Pairs: {}  feasible: {}  below frame rate: {}  undersampled: {}  degenerate: {}",
        s.pairs, s.feasible, s.below_frame_rate, s.undersampled, s.degenerate
    );

    match &report.best {
        BestParameters::NoFeasibleCandidate => {
            println!("No feasible candidate.");
        }
        BestParameters::Found(best) => {
            println!();
            println!("═══════════════════════════════════════════════");
            println!("  BEST: fx = {} Hz, fy = {} Hz", best.fx, best.fy);
            println!("═══════════════════════════════════════════════");
            println!("  Frame rate:        {} Hz", best.frame_rate);
            println!("  Nx / Ny:           {} / {}", best.nx, best.ny);
            println!("  Line spacing h:    {:.4} µm", best.h);
            println!("  FOV:               {:.2} px ({:.2} µm)", best.fov_px, best.fov);
            println!("  Optimal scan size: {:.2} µm", best.optimal_scan_size);
            println!(
                "  Crossing freq:     {} Hz (needs >= {} Hz clock)",
                best.fcp,
                best.min_sampling_frequency()
            );
            println!("  Fill factor:       {:.2}%", best.fill_factor);
            println!("═══════════════════════════════════════════════");

            if top.len() > 1 {
                println!();
                println!(
                    "{:>6} {:>6} {:>6} {:>5} {:>5} {:>10} {:>8}",
                    "fx", "fy", "rate", "Nx", "Ny", "Fcp", "fill %"
                );
                for c in &top {
                    println!(
                        "{:>6} {:>6} {:>6} {:>5} {:>5} {:>10} {:>8.2}",
                        c.fx, c.fy, c.frame_rate, c.nx, c.ny, c.fcp, c.fill_factor
                    );
                }
            }
        }
    }
    println!("Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}
