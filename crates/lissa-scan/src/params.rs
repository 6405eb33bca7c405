//! Scan parameters shared by the trajectory, combiner and sweep.

use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_positive, Result, ScanError};
use crate::geometry::gcd;

/// One Lissajous scan setting.
///
/// Frequencies are integer Hz so that the combined waveform is exactly
/// periodic with period `1 / gcd(fx, fy)` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanParameters {
    /// Drive frequency along x (Hz)
    pub fx: u32,
    /// Drive frequency along y (Hz)
    pub fy: u32,
    /// Phase offset of the y axis (radians)
    #[serde(default)]
    pub phase: f64,
    /// Sample clock (Hz)
    pub sampling_rate: u64,
    /// Side length of the square raster grid
    pub resolution: usize,
}

impl ScanParameters {
    /// Create parameters with zero phase.
    pub fn new(fx: u32, fy: u32, sampling_rate: u64, resolution: usize) -> Self {
        Self {
            fx,
            fy,
            phase: 0.0,
            sampling_rate,
            resolution,
        }
    }

    /// Same parameters with a different phase offset.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Check every field; nothing downstream re-validates.
    pub fn validate(&self) -> Result<()> {
        validate_pair(self.fx, self.fy)?;
        require_finite("phase", self.phase)?;
        require_positive("sampling_rate", self.sampling_rate)?;
        require_positive("resolution", self.resolution)?;
        Ok(())
    }

    /// `gcd(fx, fy)`, the frame rate in Hz.
    pub fn frame_rate(&self) -> u64 {
        gcd(self.fx as u64, self.fy as u64)
    }

    /// Number of samples in one full period of the figure.
    pub fn samples_per_frame(&self) -> u64 {
        samples_per_frame(self.fx, self.fy, self.sampling_rate)
    }
}

/// `floor(sampling_rate / gcd(fx, fy))`.
///
/// When `sampling_rate` is not a multiple of the frame rate the fractional
/// remainder of one period is dropped.
pub fn samples_per_frame(fx: u32, fy: u32, sampling_rate: u64) -> u64 {
    match gcd(fx as u64, fy as u64) {
        0 => 0,
        g => sampling_rate / g,
    }
}

/// Reject frequency pairs that cannot trace a 2-D figure.
///
/// A zero frequency leaves one axis still; equal frequencies collapse the
/// figure to a line or an ellipse with a single lobe per axis.
pub fn validate_pair(fx: u32, fy: u32) -> Result<()> {
    if fx == 0 || fy == 0 || fx == fy {
        return Err(ScanError::DegenerateFrequencyPair { fx, fy });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_is_one_period() {
        let params = ScanParameters::new(4, 3, 12, 8);
        assert_eq!(params.frame_rate(), 1);
        assert_eq!(params.samples_per_frame(), 12);

        let params = ScanParameters::new(2160, 2100, 50_000_000, 512);
        assert_eq!(params.samples_per_frame(), 833_333);
    }

    #[test]
    fn truncates_partial_period() {
        // gcd = 4, 10 / 4 = 2.5 -> 2
        assert_eq!(samples_per_frame(8, 12, 10), 2);
    }

    #[test]
    fn rejects_zero_and_equal_frequencies() {
        assert_eq!(
            ScanParameters::new(0, 3, 12, 8).validate(),
            Err(ScanError::DegenerateFrequencyPair { fx: 0, fy: 3 })
        );
        assert_eq!(
            ScanParameters::new(5, 5, 12, 8).validate(),
            Err(ScanError::DegenerateFrequencyPair { fx: 5, fy: 5 })
        );
    }

    #[test]
    fn rejects_zero_rate_and_resolution() {
        assert!(matches!(
            ScanParameters::new(4, 3, 0, 8).validate(),
            Err(ScanError::InvalidParameter(_))
        ));
        assert!(matches!(
            ScanParameters::new(4, 3, 12, 0).validate(),
            Err(ScanError::InvalidParameter(_))
        ));
        assert!(matches!(
            ScanParameters::new(4, 3, 12, 8).with_phase(f64::INFINITY).validate(),
            Err(ScanError::InvalidParameter(_))
        ));
    }

    #[test]
    fn valid_parameters_pass() {
        let params = ScanParameters::new(2000, 2005, 20_000_000, 512).with_phase(1.5708);
        assert!(params.validate().is_ok());
    }
}
