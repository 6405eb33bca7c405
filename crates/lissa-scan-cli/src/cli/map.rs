//! Map command: resample a grayscale image along the scan path.
//!
//! The image is resized to each output resolution, then every cell the scan
//! visits takes the gray value of the matching image pixel. Cells the scan
//! never reaches stay black, so the output shows what a Lissajous scanner
//! of that resolution would actually record.

use std::path::{Path, PathBuf};

use clap::Args;
use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::Serialize;

use lissa_scan::{rasterize_values, Convention, PixelPolicy, RasterStats, Trajectory, ValueSource};

use super::common::{print_json, write_value_png, CliResult};

#[derive(Debug, Clone, Args)]
pub struct MapArgs {
    /// Reference image (any format the `image` crate reads)
    pub image: PathBuf,

    /// X drive frequency (Hz)
    #[arg(long, default_value_t = 2160)]
    pub fx: u32,

    /// Y drive frequency (Hz)
    #[arg(long, default_value_t = 2100)]
    pub fy: u32,

    /// Y phase offset (radians)
    #[arg(short = 'p', long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub phase: f64,

    /// Sample clock (Hz)
    #[arg(short = 's', long, default_value_t = 50_000_000)]
    pub sampling_rate: u64,

    /// Output resolutions, comma separated
    #[arg(short = 'r', long, value_delimiter = ',', default_values_t = [256, 64])]
    pub resolutions: Vec<usize>,

    /// Directory for the output PNGs
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Gray levels of an image as a value source.
struct GraySource<'a>(&'a GrayImage);

impl ValueSource for GraySource<'_> {
    fn dimensions(&self) -> (usize, usize) {
        (self.0.width() as usize, self.0.height() as usize)
    }

    fn value_at(&self, px: usize, py: usize) -> f64 {
        self.0.get_pixel(px as u32, py as u32)[0] as f64
    }
}

#[derive(Serialize)]
struct MapEntry {
    resolution: usize,
    output: PathBuf,
    written_cells: usize,
    total_cells: usize,
    stats: RasterStats,
}

#[derive(Serialize)]
struct MapReport {
    image: PathBuf,
    fx: u32,
    fy: u32,
    phase: f64,
    sampling_rate: u64,
    maps: Vec<MapEntry>,
}

/// Execute the map command.
pub fn cmd_map(args: &MapArgs) -> CliResult<()> {
    if args.resolutions.is_empty() || args.resolutions.contains(&0) {
        return Err("resolutions must be a non-empty list of sizes >= 1".into());
    }

    let img = image::open(&args.image)
        .map_err(|e| format!("Failed to load image {}: {}", args.image.display(), e))?
        .into_luma8();
    eprintln!("Loaded {} ({}x{})", args.image.display(), img.width(), img.height());

    // Unit amplitude, floor-mapped across [-1, 1]
    let trajectory = Trajectory::new(
        args.fx,
        args.fy,
        args.phase,
        args.sampling_rate,
        Convention::centered(1.0),
    )?;
    let policy = PixelPolicy::centered(1.0);
    let stem = args.image.file_stem().and_then(|s| s.to_str()).unwrap_or("map");

    let mut maps = Vec::with_capacity(args.resolutions.len());
    for &resolution in &args.resolutions {
        let side = u32::try_from(resolution)
            .map_err(|_| format!("resolution {} is too large", resolution))?;
        let resized = imageops::resize(&img, side, side, FilterType::Triangle);
        let raster = rasterize_values(&trajectory, resolution, policy, &GraySource(&resized))?;

        let output = output_path(&args.out_dir, stem, resolution);
        write_value_png(&raster.values, &output)?;

        maps.push(MapEntry {
            resolution,
            output,
            written_cells: raster.values.written_cells(),
            total_cells: resolution * resolution,
            stats: raster.stats,
        });
    }

    let report = MapReport {
        image: args.image.clone(),
        fx: args.fx,
        fy: args.fy,
        phase: args.phase,
        sampling_rate: args.sampling_rate,
        maps,
    };

    if args.json {
        return print_json(&report);
    }

    for m in &report.maps {
        println!(
            "{:>5}x{:<5} {:>6.2}% of cells written -> {}",
            m.resolution,
            m.resolution,
            m.written_cells as f64 / m.total_cells as f64 * 100.0,
            m.output.display()
        );
    }
    Ok(())
}

fn output_path(dir: &Path, stem: &str, resolution: usize) -> PathBuf {
    dir.join(format!("{}_lissajous_{}.png", stem, resolution))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_source_reads_luma() {
        let img = GrayImage::from_fn(4, 3, |x, y| image::Luma([(x + 10 * y) as u8]));
        let source = GraySource(&img);
        assert_eq!(source.dimensions(), (4, 3));
        assert_eq!(source.value_at(2, 1), 12.0);
    }

    #[test]
    fn output_names_carry_resolution() {
        let p = output_path(Path::new("out"), "cells", 64);
        assert_eq!(p, PathBuf::from("out/cells_lissajous_64.png"));
    }
}
