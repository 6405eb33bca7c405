//! Core geometry types and closed-form Lissajous scan geometry.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! `#[derive(...)]` generates the boring parts:
//! - `Debug` lets you print with `{:?}`
//! - `Clone`/`Copy` let small values be duplicated implicitly
//! - `PartialEq` lets tests compare with `==`
//! - `Serialize` (from serde) lets the CLI dump the value as JSON
//!
//! The free functions below are the analytic side of a scan: given two
//! integer drive frequencies they tell you the frame rate, how many lobes
//! the figure has, how far apart neighbouring lines are, and how fast the
//! sample clock has to run.

use std::f64::consts::PI;

use serde::Serialize;

/// A 2D point with x,y coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The sample clock must run this many times faster than the line-crossing
/// frequency for the discrete samples to resolve neighbouring lines.
pub const OVERSAMPLING_FACTOR: u64 = 6;

/// Greatest common divisor (Euclid). `gcd(0, n) == n`.
#[inline]
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Frame rate of the pattern: the rate at which the full figure repeats.
#[inline]
pub fn frame_rate(fx: u32, fy: u32) -> u32 {
    gcd(fx as u64, fy as u64) as u32
}

/// Lobe counts `(Nx, Ny)`: oscillation cycles per frame along each axis.
///
/// For a frame rate obtained from [`frame_rate`] the two counts are co-prime.
#[inline]
pub fn lobe_counts(fx: u32, fy: u32, frame_rate: u32) -> (u32, u32) {
    (fx / frame_rate, fy / frame_rate)
}

/// Minimum spacing `h` between adjacent scan lines for amplitudes `ax`, `ay`.
pub fn line_spacing(ax: f64, ay: f64, nx: u32, ny: u32) -> f64 {
    let sx = half_lobe_sin(nx);
    let sy = half_lobe_sin(ny);
    let numerator = 2.0 * ax * ay * sx * sy;
    let denominator = ((ax * sy).powi(2) + (ay * sx).powi(2)).sqrt();
    numerator / denominator
}

/// Field of view in detector pixels implied by spot size `fwhm` and pixel
/// pitch `pixel_pitch` (same length unit as `fwhm`).
pub fn fov_px(fwhm: f64, nx: u32, ny: u32, pixel_pitch: f64) -> f64 {
    let sx = half_lobe_sin(nx);
    let sy = half_lobe_sin(ny);
    let numerator = 2.0 * fwhm * (sy * sy + sx * sx).sqrt();
    let denominator = pixel_pitch * sy * sx;
    numerator / denominator
}

/// Characteristic line-crossing frequency `Fcp = 4 * Nx * Ny * frame_rate`.
///
/// `None` when the product does not fit in a `u64`.
#[inline]
pub fn crossing_frequency(nx: u32, ny: u32, frame_rate: u32) -> Option<u64> {
    4u64.checked_mul(nx as u64)?
        .checked_mul(ny as u64)?
        .checked_mul(frame_rate as u64)
}

/// Lowest sampling frequency that still resolves a pattern with the given `Fcp`.
///
/// `None` past `u64::MAX`; no sample clock reaches that.
#[inline]
pub fn min_sampling_frequency(fcp: u64) -> Option<u64> {
    OVERSAMPLING_FACTOR.checked_mul(fcp)
}

/// Scan size at which the line spacing matches the spot size.
pub fn optimal_scan_size(fwhm: f64, nx: u32, ny: u32) -> f64 {
    let (nx, ny) = (nx as f64, ny as f64);
    fwhm * (nx * nx + ny * ny).sqrt() / PI
}

/// `sin(pi / 2N)`
#[inline]
fn half_lobe_sin(n: u32) -> f64 {
    (PI / (2.0 * n as f64)).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0);
    }

    #[test]
    fn gcd_basics() {
        assert_eq!(gcd(2160, 2100), 60);
        assert_eq!(gcd(4, 3), 1);
        assert_eq!(gcd(0, 9), 9);
        assert_eq!(gcd(9, 0), 9);
    }

    #[test]
    fn lobes_are_coprime() {
        let fr = frame_rate(2160, 2100);
        let (nx, ny) = lobe_counts(2160, 2100, fr);
        assert_eq!((nx, ny), (36, 35));
        assert_eq!(gcd(nx as u64, ny as u64), 1);
    }

    #[test]
    fn single_lobe_spacing() {
        // sin(pi/2) = 1 on both axes: h = 2F^2 / (sqrt(2) F) = sqrt(2) F
        let h = line_spacing(10.0, 10.0, 1, 1);
        assert!((h - 10.0 * 2f64.sqrt()).abs() < 1e-9, "h = {}", h);
    }

    #[test]
    fn spacing_shrinks_with_more_lobes() {
        let coarse = line_spacing(10.0, 10.0, 3, 4);
        let fine = line_spacing(10.0, 10.0, 35, 36);
        assert!(fine < coarse);
        assert!(fine > 0.0);
    }

    #[test]
    fn fov_single_lobe() {
        let fov = fov_px(10.0, 1, 1, 10.0 / 3.0);
        let expected = 2.0 * 10.0 * 2f64.sqrt() / (10.0 / 3.0);
        assert!((fov - expected).abs() < 1e-9);
    }

    #[test]
    fn crossing_and_sampling() {
        let fcp = crossing_frequency(36, 35, 60).unwrap();
        assert_eq!(fcp, 4 * 36 * 35 * 60);
        assert_eq!(min_sampling_frequency(fcp), Some(6 * fcp));
    }

    #[test]
    fn crossing_overflow_is_none() {
        assert_eq!(crossing_frequency(u32::MAX, u32::MAX - 1, 1), None);
        // 4 * 950_000_001 * 950_000_000 fits, six times that does not
        let fcp = crossing_frequency(950_000_001, 950_000_000, 1).unwrap();
        assert_eq!(fcp, 3_610_000_003_800_000_000);
        assert_eq!(min_sampling_frequency(fcp), None);
    }

    #[test]
    fn optimal_size_matches_formula() {
        let size = optimal_scan_size(10.0, 3, 4);
        assert!((size - 50.0 / PI).abs() < 1e-9);
    }
}
