//! # lissa-scan
//!
//! Lissajous scan simulation: sample trajectories, rasterize them onto a
//! square grid, measure how much of the grid they cover, combine several
//! phase-shifted scans, and search the frequency plane for the best scan
//! settings.
//!
//! ```text
//! ScanParameters ─▶ Trajectory ─▶ rasterize ─▶ CoverageMap ─▶ fill factor
//!                       │                                          │
//!                       └── PhaseSet ─▶ combine_phases ─▶ OR-ed mask
//! SearchConfig ─▶ search ─▶ BestParameters
//! ```
//!
//! ## Rust Lesson #7: Modules
//!
//! Each file is a module and has to be declared with `mod`. `pub use`
//! re-exports the everyday types here so callers can write
//! `lissa_scan::Trajectory` instead of `lissa_scan::trajectory::Trajectory`.

pub mod coverage;
pub mod error;
pub mod geometry;
pub mod optimizer;
pub mod params;
pub mod phases;
pub mod raster;
pub mod sweep;
pub mod trajectory;

pub use coverage::{fill_factor, CoverageMask, CoverageRating, CoverageSummary};
pub use error::{Result, ScanError};
pub use geometry::Point;
pub use optimizer::{
    search, BestParameters, CandidateRecord, FrequencyRange, SearchConfig, SearchReport, TieBreak,
};
pub use params::ScanParameters;
pub use phases::{combine_phases, PhaseCoverage, PhaseFill, PhaseSet};
pub use raster::{
    rasterize, rasterize_many, rasterize_values, CoverageMap, PixelPolicy, Raster, RasterStats,
    ValueGrid, ValueMap, ValueRaster, ValueSource,
};
pub use sweep::{harmonic_ratio_sweep, SweepConfig, SweepReport, SweepRow};
pub use trajectory::{Convention, Trajectory};
