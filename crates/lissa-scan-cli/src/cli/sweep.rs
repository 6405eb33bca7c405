//! Sweep command: harmonic ratio table.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use serde::Serialize;

use lissa_scan::{harmonic_ratio_sweep, SweepConfig, SweepReport};

use super::common::{print_json, CliResult};
use super::config::ConfigFile;

#[derive(Debug, Clone, Args)]
pub struct SweepArgs {
    /// YAML config file (`sweep:` section); flags override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Base frequency the harmonics derive from (Hz)
    #[arg(long)]
    pub base: Option<u32>,

    /// First x, inclusive (>= 2)
    #[arg(long)]
    pub from: Option<u32>,

    /// Last x, inclusive
    #[arg(long)]
    pub to: Option<u32>,

    /// Phases per row
    #[arg(short = 'n', long = "phases")]
    pub phase_count: Option<usize>,

    /// Sample clock (Hz)
    #[arg(short = 's', long)]
    pub sampling_rate: Option<u64>,

    /// Grid side length
    #[arg(short = 'r', long)]
    pub resolution: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl SweepArgs {
    fn resolve(&self) -> CliResult<SweepConfig> {
        let mut config = ConfigFile::load_or_default(self.config.as_deref())?.sweep;
        config.base_frequency = self.base.unwrap_or(config.base_frequency);
        config.x_from = self.from.unwrap_or(config.x_from);
        config.x_to = self.to.unwrap_or(config.x_to);
        config.phase_count = self.phase_count.unwrap_or(config.phase_count);
        config.sampling_rate = self.sampling_rate.unwrap_or(config.sampling_rate);
        config.resolution = self.resolution.unwrap_or(config.resolution);
        Ok(config)
    }
}

#[derive(Serialize)]
struct SweepOutput<'a> {
    timestamp: String,
    #[serde(flatten)]
    report: &'a SweepReport,
    elapsed_ms: f64,
}

/// Execute the sweep command.
pub fn cmd_sweep(args: &SweepArgs) -> CliResult<()> {
    let config = args.resolve()?;
    eprintln!(
        "Sweeping x = {}..={} from {} Hz ({} phases, {}x{})...",
        config.x_from,
        config.x_to,
        config.base_frequency,
        config.phase_count,
        config.resolution,
        config.resolution
    );

    let start = Instant::now();
    let report = harmonic_ratio_sweep(&config)?;
    let elapsed = start.elapsed();

    if args.json {
        return print_json(&SweepOutput {
            timestamp: chrono::Local::now().to_rfc3339(),
            report: &report,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        });
    }

    let mut header = format!("{:>4} {:>6} {:>6} {:>6}", "x", "ratio", "fx", "fy");
    for k in 0..report.phases.len() {
        header.push_str(&format!(" {:>7}", format!("p{}", k)));
    }
    header.push_str(&format!(" {:>9}", "combined"));
    println!("{}", header);

    for row in &report.rows {
        let mut line = format!("{:>4} {:>6} {:>6} {:>6}", row.x, row.ratio, row.fx, row.fy);
        for fill in &row.phase_fills {
            line.push_str(&format!(" {:>7.2}", fill));
        }
        line.push_str(&format!(" {:>9.2}", row.combined_fill));
        println!("{}", line);
    }
    eprintln!("Done in {:.2}s", elapsed.as_secs_f64());
    Ok(())
}
