//! Harmonic ratio sweep.
//!
//! For each `x` the scan uses neighbouring harmonics of a common frame rate:
//! `ratio = base / x`, `fx = ratio·(x-1)`, `fy = ratio·x`. Larger `x` means
//! more lobes per frame and a lower frame rate. Every row is scored with the
//! multi-phase combiner.

use std::ops::RangeInclusive;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, Result, ScanError};
use crate::params::ScanParameters;
use crate::phases::{combine_phases, PhaseSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Frequency the harmonics are derived from, Hz
    pub base_frequency: u32,
    /// First x (inclusive, >= 2)
    pub x_from: u32,
    /// Last x (inclusive)
    pub x_to: u32,
    /// Phases per row, evenly spaced over one turn
    pub phase_count: usize,
    pub sampling_rate: u64,
    pub resolution: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            base_frequency: 2160,
            x_from: 2,
            x_to: 36,
            phase_count: 8,
            sampling_rate: 50_000_000,
            resolution: 512,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("base_frequency", self.base_frequency)?;
        require_positive("phase_count", self.phase_count)?;
        require_positive("sampling_rate", self.sampling_rate)?;
        require_positive("resolution", self.resolution)?;
        if self.x_from < 2 {
            return Err(ScanError::invalid(format!(
                "x_from must be >= 2 (x = 1 gives fx = 0), got {}",
                self.x_from
            )));
        }
        if self.x_from > self.x_to {
            return Err(ScanError::invalid(format!(
                "x range {}..={} is empty",
                self.x_from, self.x_to
            )));
        }
        if self.x_to > self.base_frequency {
            return Err(ScanError::invalid(format!(
                "x_to {} exceeds base_frequency {} (ratio would be 0)",
                self.x_to, self.base_frequency
            )));
        }
        Ok(())
    }

    pub fn xs(&self) -> RangeInclusive<u32> {
        self.x_from..=self.x_to
    }
}

/// Frequencies for one step of the sweep: `(ratio, fx, fy)`.
///
/// Needs `2 <= x <= base_frequency`; below that `fx` is zero, above it the
/// ratio is.
pub fn harmonic_pair(base_frequency: u32, x: u32) -> Result<(u32, u32, u32)> {
    if x < 2 {
        return Err(ScanError::invalid(format!("harmonic x must be >= 2, got {x}")));
    }
    if x > base_frequency {
        return Err(ScanError::invalid(format!(
            "harmonic x {x} exceeds base_frequency {base_frequency}"
        )));
    }
    let ratio = base_frequency / x;
    Ok((ratio, ratio * (x - 1), ratio * x))
}

/// One sweep step. Fill factors are percentages rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub x: u32,
    /// Common factor of fx and fy; also the frame rate in Hz
    pub ratio: u32,
    pub fx: u32,
    pub fy: u32,
    pub phase_fills: Vec<f64>,
    pub combined_fill: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub config: SweepConfig,
    pub phases: Vec<f64>,
    pub rows: Vec<SweepRow>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Run the sweep, one row per `x` in ascending order.
pub fn harmonic_ratio_sweep(config: &SweepConfig) -> Result<SweepReport> {
    config.validate()?;
    let phases = PhaseSet::uniform(config.phase_count)?;

    let mut rows = Vec::with_capacity(config.xs().count());
    for x in config.xs() {
        let (ratio, fx, fy) = harmonic_pair(config.base_frequency, x)?;
        let params = ScanParameters::new(fx, fy, config.sampling_rate, config.resolution);
        let coverage = combine_phases(&params, &phases)?;

        let row = SweepRow {
            x,
            ratio,
            fx,
            fy,
            phase_fills: coverage.per_phase.iter().map(|p| round2(p.fill_factor)).collect(),
            combined_fill: round2(coverage.combined_fill_factor),
        };
        debug!(
            "x={} ratio={} fx={} fy={}: combined {:.2}%",
            x, ratio, fx, fy, row.combined_fill
        );
        rows.push(row);
    }

    info!(
        "sweep of {} rows done (base {} Hz, {} phases, {}x{})",
        rows.len(),
        config.base_frequency,
        config.phase_count,
        config.resolution,
        config.resolution
    );

    Ok(SweepReport {
        config: config.clone(),
        phases: phases.phases().to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SweepConfig {
        SweepConfig {
            base_frequency: 360,
            x_from: 2,
            x_to: 6,
            phase_count: 4,
            sampling_rate: 200_000,
            resolution: 64,
        }
    }

    #[test]
    fn harmonic_pairs() {
        assert_eq!(harmonic_pair(2160, 2).unwrap(), (1080, 1080, 2160));
        assert_eq!(harmonic_pair(2160, 36).unwrap(), (60, 2100, 2160));
        // floor division
        assert_eq!(harmonic_pair(2160, 7).unwrap(), (308, 1848, 2156));
        assert_eq!(harmonic_pair(5, 5).unwrap(), (1, 4, 5));
    }

    #[test]
    fn harmonic_pair_rejects_x_outside_range() {
        for x in [0, 1] {
            assert!(matches!(
                harmonic_pair(2160, x),
                Err(ScanError::InvalidParameter(_))
            ));
        }
        assert!(harmonic_pair(10, 11).is_err());
    }

    #[test]
    fn rows_follow_x_order() {
        let report = harmonic_ratio_sweep(&small()).unwrap();
        let xs: Vec<u32> = report.rows.iter().map(|r| r.x).collect();
        assert_eq!(xs, vec![2, 3, 4, 5, 6]);
        assert_eq!(report.phases.len(), 4);
        for row in &report.rows {
            assert_eq!(row.phase_fills.len(), 4);
            assert_eq!(row.fy - row.fx, row.ratio);
            let best = row.phase_fills.iter().cloned().fold(0.0, f64::max);
            assert!(row.combined_fill >= best);
        }
    }

    #[test]
    fn fills_are_rounded() {
        let report = harmonic_ratio_sweep(&small()).unwrap();
        for row in &report.rows {
            for v in row.phase_fills.iter().chain(std::iter::once(&row.combined_fill)) {
                assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn rejects_bad_ranges() {
        let x1 = SweepConfig { x_from: 1, ..small() };
        assert!(harmonic_ratio_sweep(&x1).is_err());

        let reversed = SweepConfig { x_from: 5, x_to: 4, ..small() };
        assert!(harmonic_ratio_sweep(&reversed).is_err());

        let too_far = SweepConfig { x_to: 400, ..small() };
        assert!(harmonic_ratio_sweep(&too_far).is_err());

        let no_phases = SweepConfig { phase_count: 0, ..small() };
        assert!(harmonic_ratio_sweep(&no_phases).is_err());
    }
}
