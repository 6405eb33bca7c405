//! Multi-phase coverage combination.
//!
//! A single Lissajous figure leaves gaps between its lines. Shifting the
//! phase of the y axis moves the lines, so scanning the same frequencies at
//! several phases and OR-ing the covered cells fills more of the frame.
//!
//! Each phase is rasterized independently on the rayon pool; the masks are
//! then OR-ed, so neither evaluation order nor thread scheduling can change
//! the combined result.

use std::f64::consts::TAU;

use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use crate::coverage::CoverageMask;
use crate::error::{require_finite, Result, ScanError};
use crate::params::ScanParameters;
use crate::raster::{rasterize, PixelPolicy};
use crate::trajectory::{Convention, Trajectory};

/// Ordered, non-empty list of phase offsets (radians).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSet {
    phases: Vec<f64>,
}

impl PhaseSet {
    pub fn new(phases: Vec<f64>) -> Result<Self> {
        if phases.is_empty() {
            return Err(ScanError::invalid("phase set must not be empty"));
        }
        for &phase in &phases {
            require_finite("phase", phase)?;
        }
        Ok(Self { phases })
    }

    /// `count` phases evenly spaced over one turn, starting at 0.
    pub fn uniform(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(ScanError::invalid("phase count must be >= 1"));
        }
        Self::new((0..count).map(|k| k as f64 * TAU / count as f64).collect())
    }

    /// The usual eight phases, pi/4 apart.
    pub fn eighths() -> Self {
        Self {
            phases: (0..8).map(|k| k as f64 * TAU / 8.0).collect(),
        }
    }

    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

/// Fill factor of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseFill {
    pub phase: f64,
    pub fill_factor: f64,
}

/// Per-phase and combined coverage of a phase set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseCoverage {
    /// One entry per phase, in phase-set order
    pub per_phase: Vec<PhaseFill>,
    pub combined_fill_factor: f64,
    #[serde(skip)]
    pub combined: CoverageMask,
}

impl PhaseCoverage {
    /// Highest single-phase fill factor.
    pub fn best_single_phase(&self) -> Option<PhaseFill> {
        self.per_phase
            .iter()
            .copied()
            .max_by(|a, b| a.fill_factor.total_cmp(&b.fill_factor))
    }
}

/// Rasterize `params` at every phase of `phases` and union the coverage.
///
/// `params.phase` is ignored; each entry of `phases` is used as the absolute
/// phase. Trajectories use the frame-normalized form with `S = resolution`
/// and the [`PixelPolicy::frame_pixels`] nearest policy.
pub fn combine_phases(params: &ScanParameters, phases: &PhaseSet) -> Result<PhaseCoverage> {
    params.validate()?;
    if phases.is_empty() {
        return Err(ScanError::invalid("phase set must not be empty"));
    }

    let resolution = params.resolution;
    let convention = Convention::frame(resolution as f64);
    let policy = PixelPolicy::frame_pixels(resolution);

    let rasters = phases
        .phases()
        .par_iter()
        .map(|&phase| -> Result<(PhaseFill, CoverageMask)> {
            let trajectory = Trajectory::from_params(&params.with_phase(phase), convention)?;
            let raster = rasterize(&trajectory, resolution, policy)?;
            let fill = raster.map.fill_factor();
            debug!(
                "fx={} fy={} phase={:.4}: fill {:.2}% ({} dropped of {})",
                params.fx,
                params.fy,
                phase,
                fill,
                raster.stats.dropped,
                raster.stats.total()
            );
            Ok((PhaseFill { phase, fill_factor: fill }, raster.map.mask()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut combined = CoverageMask::empty(resolution)?;
    let mut per_phase = Vec::with_capacity(rasters.len());
    for (fill, mask) in &rasters {
        combined.union_with(mask)?;
        per_phase.push(*fill);
    }

    Ok(PhaseCoverage {
        per_phase,
        combined_fill_factor: combined.fill_factor(),
        combined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn uniform_spacing() {
        let set = PhaseSet::uniform(4).unwrap();
        let expected = [0.0, PI / 2.0, PI, 3.0 * PI / 2.0];
        for (got, want) in set.phases().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(PhaseSet::eighths().len(), 8);
        assert!((PhaseSet::eighths().phases()[1] - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(PhaseSet::new(vec![]).is_err());
        assert!(PhaseSet::uniform(0).is_err());
        assert!(PhaseSet::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn combined_at_least_best_phase() {
        let params = ScanParameters::new(300, 280, 1_000_000, 128);
        let coverage = combine_phases(&params, &PhaseSet::eighths()).unwrap();

        assert_eq!(coverage.per_phase.len(), 8);
        let best = coverage.best_single_phase().unwrap();
        assert!(coverage.combined_fill_factor >= best.fill_factor);
        assert!(coverage.combined_fill_factor <= 100.0);
        assert_eq!(coverage.combined.fill_factor(), coverage.combined_fill_factor);
    }

    #[test]
    fn per_phase_order_follows_set() {
        let phases = PhaseSet::new(vec![PI, 0.0, PI / 2.0]).unwrap();
        let params = ScanParameters::new(31, 30, 100_000, 64);
        let coverage = combine_phases(&params, &phases).unwrap();
        let order: Vec<f64> = coverage.per_phase.iter().map(|p| p.phase).collect();
        assert_eq!(order, vec![PI, 0.0, PI / 2.0]);
    }

    #[test]
    fn single_phase_combined_equals_phase() {
        let params = ScanParameters::new(31, 30, 100_000, 64);
        let coverage = combine_phases(&params, &PhaseSet::new(vec![0.5]).unwrap()).unwrap();
        assert_eq!(coverage.combined_fill_factor, coverage.per_phase[0].fill_factor);
    }

    #[test]
    fn invalid_params_rejected() {
        let params = ScanParameters::new(30, 30, 100_000, 64);
        assert!(matches!(
            combine_phases(&params, &PhaseSet::eighths()),
            Err(ScanError::DegenerateFrequencyPair { .. })
        ));
    }
}
