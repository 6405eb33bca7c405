//! Fill factor: how much of the grid a scan actually touches.

use serde::Serialize;

use crate::error::{require_positive, Result, ScanError};
use crate::raster::CoverageMap;

/// `100 * covered / R²`.
///
/// `resolution == 0` is a caller bug and is reported, never turned into 0 or NaN.
pub fn fill_factor(covered_cells: usize, resolution: usize) -> Result<f64> {
    require_positive("resolution", resolution)?;
    let total = resolution * resolution;
    if covered_cells > total {
        return Err(ScanError::invalid(format!(
            "{covered_cells} covered cells exceed the {total} cells of a {resolution}x{resolution} grid"
        )));
    }
    Ok(percent(covered_cells, total))
}

#[inline]
fn percent(part: usize, total: usize) -> f64 {
    part as f64 / total as f64 * 100.0
}

impl CoverageMap {
    /// Percentage of cells with at least one hit.
    pub fn fill_factor(&self) -> f64 {
        let r = self.resolution();
        percent(self.covered_cells(), r * r)
    }

    /// Boolean "covered" view of the map.
    pub fn mask(&self) -> CoverageMask {
        CoverageMask {
            resolution: self.resolution(),
            cells: self.counts().iter().map(|&c| c > 0).collect(),
        }
    }

    pub fn summary(&self) -> CoverageSummary {
        let covered = self.covered_cells();
        let total_hits = self.total_hits();
        let fill = self.fill_factor();
        CoverageSummary {
            resolution: self.resolution(),
            fill_factor: fill,
            covered_cells: covered,
            total_cells: self.resolution() * self.resolution(),
            max_hits: self.max_hits(),
            mean_hits_per_covered_cell: if covered > 0 {
                total_hits as f64 / covered as f64
            } else {
                0.0
            },
            rating: CoverageRating::from_fill_factor(fill),
        }
    }
}

/// R×R grid of covered/not-covered cells.
///
/// The unit of multi-phase combination: masks are OR-ed together, which is
/// commutative and associative, so the order masks arrive in never matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMask {
    resolution: usize,
    cells: Vec<bool>,
}

impl CoverageMask {
    /// All-uncovered mask.
    pub fn empty(resolution: usize) -> Result<Self> {
        require_positive("resolution", resolution)?;
        Ok(Self {
            resolution,
            cells: vec![false; resolution * resolution],
        })
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn is_covered(&self, px: usize, py: usize) -> bool {
        self.cells[py * self.resolution + px]
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn covered_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn fill_factor(&self) -> f64 {
        percent(self.covered_cells(), self.cells.len())
    }

    /// OR `other` into `self`.
    pub fn union_with(&mut self, other: &CoverageMask) -> Result<()> {
        if other.resolution != self.resolution {
            return Err(ScanError::invalid(format!(
                "cannot union a {}x{} mask into a {}x{} mask",
                other.resolution, other.resolution, self.resolution, self.resolution
            )));
        }
        for (a, &b) in self.cells.iter_mut().zip(&other.cells) {
            *a |= b;
        }
        Ok(())
    }

    /// Consuming form of [`union_with`](Self::union_with), handy in folds.
    pub fn union(mut self, other: &CoverageMask) -> Result<Self> {
        self.union_with(other)?;
        Ok(self)
    }
}

/// Rough quality bucket for a fill factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageRating {
    /// >= 90%
    Excellent,
    /// 70-90%
    Good,
    /// 50-70%
    Fair,
    /// < 50%
    Poor,
}

impl CoverageRating {
    pub fn from_fill_factor(fill: f64) -> Self {
        if fill >= 90.0 {
            CoverageRating::Excellent
        } else if fill >= 70.0 {
            CoverageRating::Good
        } else if fill >= 50.0 {
            CoverageRating::Fair
        } else {
            CoverageRating::Poor
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CoverageRating::Excellent => "excellent",
            CoverageRating::Good => "good",
            CoverageRating::Fair => "fair",
            CoverageRating::Poor => "poor",
        }
    }
}

/// Coverage statistics for one raster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub resolution: usize,
    /// Percentage of cells hit at least once (0-100)
    pub fill_factor: f64,
    pub covered_cells: usize,
    pub total_cells: usize,
    /// Hits in the busiest cell
    pub max_hits: u32,
    pub mean_hits_per_covered_cell: f64,
    pub rating: CoverageRating,
}
