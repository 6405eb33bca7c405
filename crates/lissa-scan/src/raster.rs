//! Rasterization of trajectory samples onto square pixel grids.
//!
//! A [`PixelPolicy`] turns one continuous coordinate into a pixel index.
//! The two policies are deliberately different and both are kept:
//!
//! - **Nearest** (`round((coord / scale) * (R - 1))`): used for fill-factor
//!   counting. Ties round to even, so 1.5 -> 2 but 2.5 -> 2.
//! - **Floor** (`floor((coord + offset) * (R - 1) / range)`): used when
//!   transferring values from a reference image.
//!
//! They disagree at half-pixel boundaries (1.5 is pixel 2 under Nearest and
//! pixel 1 under Floor).
//!
//! Samples that land outside `[0, R)` are dropped and counted, never clamped:
//! a trajectory that overshoots the grid loses those samples, and one that
//! undershoots it leaves the border empty.

use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_positive, Result, ScanError};
use crate::geometry::Point;
use crate::trajectory::Trajectory;

/// Rule for mapping a coordinate to a pixel index on an R-wide axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelPolicy {
    /// `round((coord / scale) * (R - 1))`, ties to even.
    Nearest { scale: f64 },
    /// `floor((coord + offset) * (R - 1) / range)`.
    Floor { offset: f64, range: f64 },
}

impl PixelPolicy {
    /// Nearest policy with one coordinate unit per pixel, for frame-normalized
    /// trajectories whose frame size equals the resolution.
    ///
    /// The frame spans `[0, R]`, so samples rounding to `R` fall off the grid.
    pub fn frame_pixels(resolution: usize) -> Self {
        PixelPolicy::Nearest { scale: resolution.saturating_sub(1).max(1) as f64 }
    }

    /// Floor policy spanning a centred trajectory of the given amplitude.
    pub fn centered(amplitude: f64) -> Self {
        PixelPolicy::Floor {
            offset: amplitude,
            range: 2.0 * amplitude,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PixelPolicy::Nearest { .. } => "nearest",
            PixelPolicy::Floor { .. } => "floor",
        }
    }

    fn validate(&self) -> Result<()> {
        let (name, divisor) = match *self {
            PixelPolicy::Nearest { scale } => ("scale", scale),
            PixelPolicy::Floor { offset, range } => {
                require_finite("offset", offset)?;
                ("range", range)
            }
        };
        require_finite(name, divisor)?;
        if divisor <= 0.0 {
            return Err(ScanError::invalid(format!("{name} must be > 0, got {divisor}")));
        }
        Ok(())
    }

    /// Continuous pixel position before rounding.
    #[inline]
    fn position(&self, coord: f64, resolution: usize) -> f64 {
        let steps = (resolution - 1) as f64;
        match *self {
            PixelPolicy::Nearest { scale } => ((coord / scale) * steps).round_ties_even(),
            PixelPolicy::Floor { offset, range } => ((coord + offset) * steps / range).floor(),
        }
    }

    /// Pixel index of `coord` on an axis of `resolution` pixels, or `None`
    /// when it falls outside `[0, resolution)`.
    #[inline]
    pub fn pixel(&self, coord: f64, resolution: usize) -> Option<usize> {
        if resolution == 0 {
            return None;
        }
        let pos = self.position(coord, resolution);
        if pos.is_finite() && pos >= 0.0 && pos < resolution as f64 {
            Some(pos as usize)
        } else {
            None
        }
    }

    /// Pixel cell `(px, py)` of a point.
    #[inline]
    pub fn cell(&self, p: Point, resolution: usize) -> Option<(usize, usize)> {
        Some((self.pixel(p.x, resolution)?, self.pixel(p.y, resolution)?))
    }
}

/// How many samples made it onto the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RasterStats {
    pub accepted: u64,
    pub dropped: u64,
}

impl RasterStats {
    pub fn total(&self) -> u64 {
        self.accepted + self.dropped
    }
}

/// R×R grid of per-cell hit counts, row-major (`y` selects the row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMap {
    resolution: usize,
    counts: Vec<u32>,
}

impl CoverageMap {
    /// Empty map. `resolution` must be at least 1.
    pub fn new(resolution: usize) -> Result<Self> {
        require_positive("resolution", resolution)?;
        Ok(Self { resolution, counts: vec![0; resolution * resolution] })
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Hit count at `(px, py)`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn get(&self, px: usize, py: usize) -> u32 {
        self.counts[py * self.resolution + px]
    }

    /// All counts, row-major.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Rows from `y = 0` upwards.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, u32> {
        self.counts.chunks_exact(self.resolution)
    }

    /// Cells hit at least once.
    pub fn covered_cells(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn max_hits(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total_hits(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Add one hit per in-bounds sample.
    pub fn accumulate<I>(&mut self, points: I, policy: PixelPolicy) -> Result<RasterStats>
    where
        I: IntoIterator<Item = Point>,
    {
        policy.validate()?;
        let resolution = self.resolution;
        let counts = &mut self.counts;
        Ok(walk(points, resolution, policy, |px, py| {
            let cell = &mut counts[py * resolution + px];
            *cell = cell.saturating_add(1);
        }))
    }
}

/// Supplies the value carried into each visited cell in value-transfer mode.
///
/// The lookup is addressed by output pixel coordinates; callers resample
/// their source (e.g. a reference image) to the output resolution first.
pub trait ValueSource {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (usize, usize);

    /// Value at output pixel `(px, py)`; both are within `dimensions()`.
    fn value_at(&self, px: usize, py: usize) -> f64;
}

/// Plain row-major grid of values, the simplest [`ValueSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValueGrid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl ValueGrid {
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != width * height {
            return Err(ScanError::invalid(format!(
                "value grid {}x{} needs {} values, got {}",
                width,
                height,
                width * height,
                values.len()
            )));
        }
        Ok(Self { width, height, values })
    }

    /// Grid filled by `f(px, py)`.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let values = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self { width, height, values }
    }
}

impl ValueSource for ValueGrid {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn value_at(&self, px: usize, py: usize) -> f64 {
        self.values[py * self.width + px]
    }
}

/// R×R grid of transferred values; `None` where no sample landed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMap {
    resolution: usize,
    values: Vec<Option<f64>>,
}

impl ValueMap {
    pub fn new(resolution: usize) -> Result<Self> {
        require_positive("resolution", resolution)?;
        Ok(Self { resolution, values: vec![None; resolution * resolution] })
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn get(&self, px: usize, py: usize) -> Option<f64> {
        self.values[py * self.resolution + px]
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn written_cells(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Unwritten cells read as `fill`.
    pub fn to_dense(&self, fill: f64) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(fill)).collect()
    }
}

/// A hit-count raster and its drop statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub map: CoverageMap,
    pub stats: RasterStats,
}

/// Value-transfer raster: transferred values plus the hit counts behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRaster {
    pub values: ValueMap,
    pub hits: CoverageMap,
    pub stats: RasterStats,
}

/// Hit-count raster of a trajectory at one resolution.
pub fn rasterize(
    trajectory: &Trajectory,
    resolution: usize,
    policy: PixelPolicy,
) -> Result<Raster> {
    let mut map = CoverageMap::new(resolution)?;
    let stats = map.accumulate(trajectory, policy)?;
    Ok(Raster { map, stats })
}

/// Hit-count rasters at several resolutions from one pass over the samples.
pub fn rasterize_many(
    trajectory: &Trajectory,
    resolutions: &[usize],
    policy: PixelPolicy,
) -> Result<Vec<Raster>> {
    policy.validate()?;
    let mut rasters = resolutions
        .iter()
        .map(|&r| {
            Ok(Raster {
                map: CoverageMap::new(r)?,
                stats: RasterStats::default(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    for p in trajectory {
        for raster in rasters.iter_mut() {
            let resolution = raster.map.resolution;
            match policy.cell(p, resolution) {
                Some((px, py)) => {
                    let cell = &mut raster.map.counts[py * resolution + px];
                    *cell = cell.saturating_add(1);
                    raster.stats.accepted += 1;
                }
                None => raster.stats.dropped += 1,
            }
        }
    }

    Ok(rasters)
}

/// Transfer values from `source` into every cell the trajectory visits.
///
/// Cells visited more than once keep the value written last in sample order.
pub fn rasterize_values<S>(
    trajectory: &Trajectory,
    resolution: usize,
    policy: PixelPolicy,
    source: &S,
) -> Result<ValueRaster>
where
    S: ValueSource + ?Sized,
{
    policy.validate()?;
    let (width, height) = source.dimensions();
    if width < resolution || height < resolution {
        return Err(ScanError::invalid(format!(
            "value source is {width}x{height}, smaller than the {resolution}x{resolution} grid"
        )));
    }

    let mut values = ValueMap::new(resolution)?;
    let mut hits = CoverageMap::new(resolution)?;
    let stats = walk(trajectory, resolution, policy, |px, py| {
        let idx = py * resolution + px;
        values.values[idx] = Some(source.value_at(px, py));
        hits.counts[idx] = hits.counts[idx].saturating_add(1);
    });

    Ok(ValueRaster { values, hits, stats })
}

/// Map each point through `policy` and hand accepted cells to `visit`.
fn walk<I, F>(points: I, resolution: usize, policy: PixelPolicy, mut visit: F) -> RasterStats
where
    I: IntoIterator<Item = Point>,
    F: FnMut(usize, usize),
{
    let mut stats = RasterStats::default();
    for p in points {
        match policy.cell(p, resolution) {
            Some((px, py)) => {
                visit(px, py);
                stats.accepted += 1;
            }
            None => stats.dropped += 1,
        }
    }
    stats
}
