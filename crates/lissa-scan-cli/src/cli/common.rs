//! Common utilities shared across CLI commands.

use std::fs;
use std::path::Path;

use clap::Args;
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Serialize;

use lissa_scan::{CoverageMask, ScanParameters, Trajectory, ValueMap};

pub type CliError = Box<dyn std::error::Error>;
pub type CliResult<T> = Result<T, CliError>;

/// Scan settings shared by `trace` and `phases`.
#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// X drive frequency (Hz)
    #[arg(long, default_value_t = 2160)]
    pub fx: u32,

    /// Y drive frequency (Hz)
    #[arg(long, default_value_t = 2100)]
    pub fy: u32,

    /// Sample clock (Hz)
    #[arg(short = 's', long, default_value_t = 50_000_000)]
    pub sampling_rate: u64,

    /// Grid side length in pixels
    #[arg(short = 'r', long, default_value_t = 512)]
    pub resolution: usize,
}

impl ScanArgs {
    pub fn to_params(&self) -> ScanParameters {
        ScanParameters::new(self.fx, self.fy, self.sampling_rate, self.resolution)
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Covered cells red on black, one image pixel per cell.
pub fn write_mask_png(mask: &CoverageMask, path: &Path) -> CliResult<()> {
    let r = mask.resolution() as u32;
    let img = RgbImage::from_fn(r, r, |x, y| {
        if mask.is_covered(x as usize, y as usize) {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 0])
        }
    });
    img.save(path)?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

/// Transferred values as grayscale; cells the scan never reached stay black.
pub fn write_value_png(values: &ValueMap, path: &Path) -> CliResult<()> {
    let r = values.resolution() as u32;
    let img = GrayImage::from_fn(r, r, |x, y| {
        let v = values.get(x as usize, y as usize).unwrap_or(0.0);
        Luma([v.round().clamp(0.0, 255.0) as u8])
    });
    img.save(path)?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

/// Frame-normalized trajectory as one SVG polyline.
///
/// Long trajectories are decimated to at most `max_points` vertices by
/// keeping every k-th sample.
pub fn trajectory_to_svg(trajectory: &Trajectory, size: f64, max_points: usize) -> String {
    let step = trajectory.len().div_ceil(max_points.max(2)).max(1);

    let points: String = trajectory
        .iter()
        .step_by(step)
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ");

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {size} {size}">
<rect width="100%" height="100%" fill="black"/>
<g stroke="red" stroke-width="0.5" fill="none">
"#
    ));
    svg.push_str(&format!("  <polyline points=\"{}\"/>\n", points));
    svg.push_str("</g>\n</svg>\n");
    svg
}

pub fn write_text(path: &Path, content: &str) -> CliResult<()> {
    fs::write(path, content)?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
