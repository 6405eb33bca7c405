//! Lissajous sample trajectory.
//!
//! Sample `i` is taken at `t = i / sampling_rate`:
//!
//!   x(t) = sin(2π·fx·t)
//!   y(t) = sin(2π·fy·t + phase)
//!
//! placed on the plane by a [`Convention`]. Because both frequencies are
//! integers the figure closes after `sampling_rate / gcd(fx, fy)` samples,
//! which is exactly the length of a [`Trajectory`].
//!
//! ## Rust Lesson #12: Lazy Iterators
//!
//! A 50 MHz clock on a 1 Hz frame rate is fifty million points. Instead of
//! building a `Vec` up front, `Trajectory::iter()` hands out a small struct
//! that computes each point when asked (like a JS generator, but the
//! compiler turns the whole chain into a plain loop). Iterating twice just
//! recomputes the same numbers, so the sequence is restartable for free.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_positive, Result, ScanError};
use crate::geometry::Point;
use crate::params::{samples_per_frame, validate_pair, ScanParameters};

/// How the unit sinusoids are placed on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// `x = Ax·sin(..)`, `y = Ay·sin(..)`: centred on the origin.
    Centered { amplitude_x: f64, amplitude_y: f64 },
    /// `x = S/2·(1 + sin(..))`: spans `[0, S]` so it can index an S×S frame.
    FrameNormalized { size: f64 },
}

impl Convention {
    /// Centred form with equal amplitudes on both axes.
    pub fn centered(amplitude: f64) -> Self {
        Convention::Centered {
            amplitude_x: amplitude,
            amplitude_y: amplitude,
        }
    }

    /// Frame-normalized form for an S×S frame.
    pub fn frame(size: f64) -> Self {
        Convention::FrameNormalized { size }
    }

    fn validate(&self) -> Result<()> {
        let extents: &[(&str, f64)] = match self {
            Convention::Centered { amplitude_x, amplitude_y } => {
                &[("amplitude_x", *amplitude_x), ("amplitude_y", *amplitude_y)]
            }
            Convention::FrameNormalized { size } => &[("size", *size)],
        };
        for &(name, value) in extents {
            require_finite(name, value)?;
            if value <= 0.0 {
                return Err(ScanError::invalid(format!("{name} must be > 0, got {value}")));
            }
        }
        Ok(())
    }

    #[inline]
    fn place(&self, sx: f64, sy: f64) -> Point {
        match *self {
            Convention::Centered { amplitude_x, amplitude_y } => {
                Point::new(amplitude_x * sx, amplitude_y * sy)
            }
            Convention::FrameNormalized { size } => {
                let half = size / 2.0;
                Point::new(half * (1.0 + sx), half * (1.0 + sy))
            }
        }
    }
}

/// One full period of a Lissajous scan, sampled at a fixed clock.
///
/// Cheap to copy: it stores the recipe, not the points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    fx: u32,
    fy: u32,
    phase: f64,
    sampling_rate: u64,
    len: u64,
    convention: Convention,
}

impl Trajectory {
    /// Validate the inputs and describe the trajectory.
    pub fn new(
        fx: u32,
        fy: u32,
        phase: f64,
        sampling_rate: u64,
        convention: Convention,
    ) -> Result<Self> {
        validate_pair(fx, fy)?;
        require_finite("phase", phase)?;
        require_positive("sampling_rate", sampling_rate)?;
        convention.validate()?;

        Ok(Self {
            fx,
            fy,
            phase,
            sampling_rate,
            len: samples_per_frame(fx, fy, sampling_rate),
            convention,
        })
    }

    /// Trajectory for a parameter set (the resolution is ignored here).
    pub fn from_params(params: &ScanParameters, convention: Convention) -> Result<Self> {
        Self::new(params.fx, params.fy, params.phase, params.sampling_rate, convention)
    }

    /// Number of samples N.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn sampling_rate(&self) -> u64 {
        self.sampling_rate
    }

    /// Position of sample `i`. Indices past `len()` wrap onto the next period.
    #[inline]
    pub fn sample(&self, i: u64) -> Point {
        let ax = cycle_angle(self.fx, i, self.sampling_rate);
        let ay = cycle_angle(self.fy, i, self.sampling_rate) + self.phase;
        self.convention.place(ax.sin(), ay.sin())
    }

    /// Iterate over all N samples in order.
    pub fn iter(&self) -> Samples {
        Samples {
            trajectory: *self,
            index: 0,
            end: self.len,
        }
    }

    /// Collect the samples into an owned vector.
    pub fn points(&self) -> Vec<Point> {
        self.iter().collect()
    }
}

/// `2π·f·i / rate`, with the whole cycles removed in integer arithmetic first.
///
/// Sample `k·i` at rate `k·r` lands on exactly the same angle as sample `i`
/// at rate `r`.
#[inline]
fn cycle_angle(freq: u32, i: u64, rate: u64) -> f64 {
    let rem = (freq as u128 * i as u128) % rate as u128;
    TAU * (rem as f64 / rate as f64)
}

/// Iterator over the samples of a [`Trajectory`].
#[derive(Debug, Clone)]
pub struct Samples {
    trajectory: Trajectory,
    index: u64,
    end: u64,
}

impl Iterator for Samples {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        if self.index >= self.end {
            return None;
        }
        let p = self.trajectory.sample(self.index);
        self.index += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples {}

impl IntoIterator for &Trajectory {
    type Item = Point;
    type IntoIter = Samples;

    fn into_iter(self) -> Samples {
        self.iter()
    }
}
