//! Scan-parameter search over a grid of frequency pairs.
//!
//! Every `(fx, fy)` in `fx_range × fy_range` is checked against two physical
//! limits:
//!
//! 1. the frame rate `gcd(fx, fy)` must reach `min_frame_rate`, and
//! 2. the sample clock must be at least 6× the line-crossing frequency `Fcp`.
//!
//! Survivors get a fill factor and the one with the most lobes (`Nx + Ny`)
//! wins. Ties go to the pair met first in fx-major, fy-minor order, or to the
//! lowest `Fcp` with [`TieBreak::MinCrossingFrequency`].
//!
//! ## Rust Lesson #14: Data Parallelism with rayon
//!
//! `(0..n).into_par_iter()` is `(0..n).map(..)` spread over every core.
//! The catch: the reduce step may combine partial results in any order, so
//! it must not care about order. Here partial results are plain counters
//! and lists tagged with their enumeration index, sorted once at the end.

use std::cmp::Ordering;
use std::ops::Range;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_positive, Result, ScanError};
use crate::geometry::{
    crossing_frequency, fov_px, frame_rate, line_spacing, lobe_counts, min_sampling_frequency,
    optimal_scan_size,
};
use crate::params::validate_pair;
use crate::raster::{rasterize, PixelPolicy};
use crate::trajectory::{Convention, Trajectory};

/// Half-open integer frequency range `start..end` (Hz).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub start: u32,
    pub end: u32,
}

impl FrequencyRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Range<u32> {
        self.start..self.end
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.start == 0 {
            return Err(ScanError::invalid(format!("{name} must start at >= 1 Hz")));
        }
        if self.is_empty() {
            return Err(ScanError::invalid(format!(
                "{name} {}..{} is empty",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

impl From<Range<u32>> for FrequencyRange {
    fn from(r: Range<u32>) -> Self {
        Self::new(r.start, r.end)
    }
}

/// How to choose among candidates with the same lobe count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Pair met first in fx-major, fy-minor enumeration order
    #[default]
    FirstEncountered,
    /// Lowest crossing frequency, then lowest fx, then lowest fy
    MinCrossingFrequency,
}

impl TieBreak {
    pub fn name(&self) -> &'static str {
        match self {
            TieBreak::FirstEncountered => "first",
            TieBreak::MinCrossingFrequency => "min-fcp",
        }
    }

    pub fn from_name(name: &str) -> Option<TieBreak> {
        match name.to_lowercase().as_str() {
            "first" | "first-encountered" | "enumeration" => Some(TieBreak::FirstEncountered),
            "min-fcp" | "fcp" | "min-crossing-frequency" => Some(TieBreak::MinCrossingFrequency),
            _ => None,
        }
    }

    pub fn all() -> &'static [TieBreak] {
        &[TieBreak::FirstEncountered, TieBreak::MinCrossingFrequency]
    }

    /// `Less` when `a` ranks ahead of `b`.
    ///
    /// Under `FirstEncountered` equal lobe counts compare `Equal`; callers
    /// keep candidates in enumeration order so the earlier one stays ahead.
    pub fn rank(&self, a: &CandidateRecord, b: &CandidateRecord) -> Ordering {
        let by_lobes = b.lobes().cmp(&a.lobes());
        match self {
            TieBreak::FirstEncountered => by_lobes,
            TieBreak::MinCrossingFrequency => by_lobes
                .then(a.fcp.cmp(&b.fcp))
                .then(a.fx.cmp(&b.fx))
                .then(a.fy.cmp(&b.fy)),
        }
    }
}

/// Optimizer inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub fx_range: FrequencyRange,
    pub fy_range: FrequencyRange,
    /// Spot size (full width at half maximum), µm
    pub fwhm: f64,
    /// Detector pixel pitch dP, µm
    pub pixel_pitch: f64,
    /// Sample clock, Hz
    pub sampling_frequency: u64,
    /// Lowest acceptable frame rate, Hz
    pub min_frame_rate: u32,
    /// Raster size for fill-factor scoring
    pub resolution: usize,
    /// Phase used for fill-factor scoring, radians
    pub phase: f64,
    pub tie_break: TieBreak,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fx_range: FrequencyRange::new(2000, 2200),
            fy_range: FrequencyRange::new(2000, 2200),
            fwhm: 10.0,
            pixel_pitch: 10.0 / 3.0,
            sampling_frequency: 50_000_000,
            min_frame_rate: 60,
            resolution: 128,
            phase: 0.0,
            tie_break: TieBreak::FirstEncountered,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        self.fx_range.validate("fx_range")?;
        self.fy_range.validate("fy_range")?;
        for (name, value) in [("fwhm", self.fwhm), ("pixel_pitch", self.pixel_pitch)] {
            require_finite(name, value)?;
            if value <= 0.0 {
                return Err(ScanError::invalid(format!("{name} must be > 0, got {value}")));
            }
        }
        require_finite("phase", self.phase)?;
        require_positive("sampling_frequency", self.sampling_frequency)?;
        require_positive("resolution", self.resolution)?;
        Ok(())
    }

    /// Number of `(fx, fy)` pairs in the search grid.
    pub fn pair_count(&self) -> usize {
        self.fx_range.len() * self.fy_range.len()
    }

    /// Pair at enumeration index `idx` (fx-major, fy-minor).
    fn pair_at(&self, idx: usize) -> (u32, u32) {
        let ny = self.fy_range.len();
        let fx = self.fx_range.start + (idx / ny) as u32;
        let fy = self.fy_range.start + (idx % ny) as u32;
        (fx, fy)
    }
}

/// Snapshot of one feasible frequency pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub fx: u32,
    pub fy: u32,
    /// gcd(fx, fy), Hz
    pub frame_rate: u32,
    pub nx: u32,
    pub ny: u32,
    /// Minimum distance between adjacent scan lines, µm
    pub h: f64,
    /// Field of view in detector pixels
    pub fov_px: f64,
    /// Line-crossing frequency, Hz
    pub fcp: u64,
    /// Percentage of raster cells hit
    pub fill_factor: f64,
    /// Field of view, µm (`fov_px * pixel_pitch`)
    pub fov: f64,
    /// Scan size at which line spacing matches the spot, µm
    pub optimal_scan_size: f64,
}

impl CandidateRecord {
    /// `Nx + Ny`, the quantity the search maximizes.
    pub fn lobes(&self) -> u32 {
        self.nx + self.ny
    }

    /// Lowest clock that still satisfies the oversampling requirement.
    pub fn min_sampling_frequency(&self) -> u64 {
        min_sampling_frequency(self.fcp).unwrap_or(u64::MAX)
    }
}

/// Outcome of checking one pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// `fx == fy` (or a zero frequency)
    Degenerate,
    BelowFrameRate { frame_rate: u32 },
    /// `fcp` is `None` when it overflows `u64`
    Undersampled { fcp: Option<u64> },
    Feasible(CandidateRecord),
}

/// The search result: a winner, or an explicit "nothing fits".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BestParameters {
    Found(CandidateRecord),
    NoFeasibleCandidate,
}

impl BestParameters {
    pub fn candidate(&self) -> Option<&CandidateRecord> {
        match self {
            BestParameters::Found(c) => Some(c),
            BestParameters::NoFeasibleCandidate => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, BestParameters::Found(_))
    }
}

/// Why pairs were discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub pairs: u64,
    pub degenerate: u64,
    pub below_frame_rate: u64,
    pub undersampled: u64,
    pub feasible: u64,
}

impl SearchStats {
    fn merge(self, other: SearchStats) -> SearchStats {
        SearchStats {
            pairs: self.pairs + other.pairs,
            degenerate: self.degenerate + other.degenerate,
            below_frame_rate: self.below_frame_rate + other.below_frame_rate,
            undersampled: self.undersampled + other.undersampled,
            feasible: self.feasible + other.feasible,
        }
    }
}

/// Full search output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub best: BestParameters,
    pub stats: SearchStats,
    pub tie_break: TieBreak,
    /// Every feasible candidate, in enumeration order
    pub feasible: Vec<CandidateRecord>,
}

impl SearchReport {
    /// Feasible candidates, best first.
    pub fn ranked(&self) -> Vec<&CandidateRecord> {
        let mut ranked: Vec<&CandidateRecord> = self.feasible.iter().collect();
        // Stable sort: ties keep enumeration order
        ranked.sort_by(|a, b| self.tie_break.rank(a, b));
        ranked
    }
}

/// Check one pair against the search limits.
pub fn evaluate_pair(fx: u32, fy: u32, config: &SearchConfig) -> Result<Evaluation> {
    if validate_pair(fx, fy).is_err() {
        return Ok(Evaluation::Degenerate);
    }

    let frame_rate = frame_rate(fx, fy);
    if frame_rate < config.min_frame_rate {
        return Ok(Evaluation::BelowFrameRate { frame_rate });
    }

    let (nx, ny) = lobe_counts(fx, fy, frame_rate);
    // An Fcp or 6×Fcp past u64::MAX is out of reach of any clock
    let fcp = match crossing_frequency(nx, ny, frame_rate) {
        Some(fcp)
            if min_sampling_frequency(fcp)
                .is_some_and(|required| config.sampling_frequency >= required) =>
        {
            fcp
        }
        fcp => return Ok(Evaluation::Undersampled { fcp }),
    };

    let fov_px = fov_px(config.fwhm, nx, ny, config.pixel_pitch);
    let record = CandidateRecord {
        fx,
        fy,
        frame_rate,
        nx,
        ny,
        h: line_spacing(config.fwhm, config.fwhm, nx, ny),
        fov_px,
        fcp,
        fill_factor: scan_fill_factor(fx, fy, config)?,
        fov: fov_px * config.pixel_pitch,
        optimal_scan_size: optimal_scan_size(config.fwhm, nx, ny),
    };
    debug!(
        "candidate fx={} fy={} lobes={} fcp={} fill={:.2}%",
        fx,
        fy,
        record.lobes(),
        fcp,
        record.fill_factor
    );
    Ok(Evaluation::Feasible(record))
}

/// Fill factor of the centred scan with amplitude `fwhm`, floor-mapped.
fn scan_fill_factor(fx: u32, fy: u32, config: &SearchConfig) -> Result<f64> {
    let trajectory = Trajectory::new(
        fx,
        fy,
        config.phase,
        config.sampling_frequency,
        Convention::centered(config.fwhm),
    )?;
    let raster = rasterize(&trajectory, config.resolution, PixelPolicy::centered(config.fwhm))?;
    Ok(raster.map.fill_factor())
}

/// Partial result of a slice of the search grid.
#[derive(Default)]
struct Tally {
    stats: SearchStats,
    feasible: Vec<(usize, CandidateRecord)>,
}

impl Tally {
    fn single(idx: usize, evaluation: Evaluation) -> Tally {
        let mut tally = Tally::default();
        tally.stats.pairs = 1;
        match evaluation {
            Evaluation::Degenerate => tally.stats.degenerate = 1,
            Evaluation::BelowFrameRate { .. } => tally.stats.below_frame_rate = 1,
            Evaluation::Undersampled { .. } => tally.stats.undersampled = 1,
            Evaluation::Feasible(record) => {
                tally.stats.feasible = 1;
                tally.feasible.push((idx, record));
            }
        }
        tally
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.stats = self.stats.merge(other.stats);
        self.feasible.extend(other.feasible);
        self
    }
}

/// Exhaustive search of `config.fx_range × config.fy_range`.
///
/// An invalid configuration is an error; a valid one with no feasible pair
/// returns [`BestParameters::NoFeasibleCandidate`].
pub fn search(config: &SearchConfig) -> Result<SearchReport> {
    config.validate()?;

    let tally = (0..config.pair_count())
        .into_par_iter()
        .map(|idx| {
            let (fx, fy) = config.pair_at(idx);
            evaluate_pair(fx, fy, config).map(|e| Tally::single(idx, e))
        })
        .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))?;

    let Tally { stats, mut feasible } = tally;
    feasible.sort_by_key(|(idx, _)| *idx);
    let feasible: Vec<CandidateRecord> = feasible.into_iter().map(|(_, c)| c).collect();

    // min_by keeps the first of equal elements, i.e. the earliest enumerated
    let best = match feasible.iter().min_by(|a, b| config.tie_break.rank(a, b)) {
        Some(c) => BestParameters::Found(c.clone()),
        None => BestParameters::NoFeasibleCandidate,
    };

    match best.candidate() {
        Some(c) => info!(
            "searched {} pairs, {} feasible; best fx={} fy={} (Nx={} Ny={}, {} Hz frame rate)",
            stats.pairs, stats.feasible, c.fx, c.fy, c.nx, c.ny, c.frame_rate
        ),
        None => info!(
            "searched {} pairs, none feasible \
             ({} below frame rate, {} undersampled, {} degenerate)",
            stats.pairs,
            stats.below_frame_rate,
            stats.undersampled,
            stats.degenerate
        ),
    }

    Ok(SearchReport {
        best,
        stats,
        tie_break: config.tie_break,
        feasible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SearchConfig {
        SearchConfig {
            fx_range: FrequencyRange::new(100, 130),
            fy_range: FrequencyRange::new(100, 130),
            sampling_frequency: 1_000_000,
            min_frame_rate: 10,
            resolution: 32,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn pair_enumeration_is_fx_major() {
        let config = small_config();
        assert_eq!(config.pair_count(), 900);
        assert_eq!(config.pair_at(0), (100, 100));
        assert_eq!(config.pair_at(1), (100, 101));
        assert_eq!(config.pair_at(30), (101, 100));
        assert_eq!(config.pair_at(899), (129, 129));
    }

    #[test]
    fn evaluate_filters_in_order() {
        let config = small_config();
        assert_eq!(evaluate_pair(110, 110, &config).unwrap(), Evaluation::Degenerate);
        assert_eq!(
            evaluate_pair(101, 103, &config).unwrap(),
            Evaluation::BelowFrameRate { frame_rate: 1 }
        );

        let tight = SearchConfig { sampling_frequency: 1000, ..small_config() };
        // 120:110 -> gcd 10, Nx=12, Ny=11, Fcp = 4*12*11*10
        assert_eq!(
            evaluate_pair(120, 110, &tight).unwrap(),
            Evaluation::Undersampled { fcp: Some(5280) }
        );

        match evaluate_pair(120, 110, &config).unwrap() {
            Evaluation::Feasible(c) => {
                assert_eq!((c.frame_rate, c.nx, c.ny, c.fcp), (10, 12, 11, 5280));
                assert!(c.fill_factor > 0.0 && c.fill_factor <= 100.0);
                assert!((c.fov - c.fov_px * config.pixel_pitch).abs() < 1e-9);
            }
            other => panic!("expected feasible, got {:?}", other),
        }
    }

    #[test]
    fn huge_frequencies_are_undersampled() {
        let config = SearchConfig { min_frame_rate: 1, ..small_config() };
        // Fcp itself overflows u64
        assert_eq!(
            evaluate_pair(4_000_000_001, 4_000_000_000, &config).unwrap(),
            Evaluation::Undersampled { fcp: None }
        );
        // Fcp fits, 6×Fcp does not
        assert_eq!(
            evaluate_pair(950_000_001, 950_000_000, &config).unwrap(),
            Evaluation::Undersampled { fcp: Some(3_610_000_003_800_000_000) }
        );

        let fastest = SearchConfig { sampling_frequency: u64::MAX, ..config };
        assert_eq!(
            evaluate_pair(4_000_000_001, 4_000_000_000, &fastest).unwrap(),
            Evaluation::Undersampled { fcp: None }
        );
    }

    #[test]
    fn search_over_huge_frequencies_finds_nothing() {
        let config = SearchConfig {
            fx_range: FrequencyRange::new(4_000_000_000, 4_000_000_002),
            fy_range: FrequencyRange::new(4_000_000_000, 4_000_000_002),
            min_frame_rate: 1,
            ..small_config()
        };
        let report = search(&config).unwrap();
        assert_eq!(report.best, BestParameters::NoFeasibleCandidate);
        assert_eq!(report.stats.degenerate, 2);
        assert_eq!(report.stats.undersampled, 2);
    }

    #[test]
    fn best_respects_limits() {
        let config = small_config();
        let report = search(&config).unwrap();
        let best = report.best.candidate().expect("small grid has feasible pairs");

        assert!(best.frame_rate >= config.min_frame_rate);
        assert!(config.sampling_frequency >= 6 * best.fcp);
        for c in &report.feasible {
            assert!(c.frame_rate >= config.min_frame_rate);
            assert!(config.sampling_frequency >= 6 * c.fcp);
            assert!(c.lobes() <= best.lobes());
        }
        assert_eq!(report.stats.pairs, 900);
        assert_eq!(report.stats.feasible as usize, report.feasible.len());
        assert_eq!(
            report.stats.degenerate
                + report.stats.below_frame_rate
                + report.stats.undersampled
                + report.stats.feasible,
            report.stats.pairs
        );
    }

    #[test]
    fn first_encountered_tie_break() {
        // 120:110 and 110:120 both have Nx + Ny = 23 and frame rate 10
        let config = SearchConfig {
            fx_range: FrequencyRange::new(110, 121),
            fy_range: FrequencyRange::new(110, 121),
            ..small_config()
        };
        let report = search(&config).unwrap();
        let best = report.best.candidate().unwrap();
        assert_eq!((best.fx, best.fy), (110, 120));
        assert_eq!(report.ranked()[0], best);
    }

    #[test]
    fn min_fcp_tie_break_is_explicit() {
        let config = SearchConfig {
            fx_range: FrequencyRange::new(110, 121),
            fy_range: FrequencyRange::new(110, 121),
            tie_break: TieBreak::MinCrossingFrequency,
            ..small_config()
        };
        let report = search(&config).unwrap();
        let best = report.best.candidate().unwrap();
        // Same lobes and Fcp for both orientations: lowest fx wins
        assert_eq!((best.fx, best.fy), (110, 120));
    }

    /// fx 11..20, fy 10..19 with frame rate >= 5 leaves three pairs, all
    /// with Nx + Ny = 5: (12, 18) and (18, 12) at 6 Hz (Fcp 144) and
    /// (15, 10) at 5 Hz (Fcp 120).
    fn equal_lobe_config(tie_break: TieBreak) -> SearchConfig {
        SearchConfig {
            fx_range: FrequencyRange::new(11, 20),
            fy_range: FrequencyRange::new(10, 19),
            min_frame_rate: 5,
            tie_break,
            ..small_config()
        }
    }

    fn pairs(candidates: &[&CandidateRecord]) -> Vec<(u32, u32, u64)> {
        candidates.iter().map(|c| (c.fx, c.fy, c.fcp)).collect()
    }

    #[test]
    fn tie_breaks_disagree_on_equal_lobes() {
        let first = search(&equal_lobe_config(TieBreak::FirstEncountered)).unwrap();
        let min_fcp = search(&equal_lobe_config(TieBreak::MinCrossingFrequency)).unwrap();
        assert_eq!(first.feasible, min_fcp.feasible);
        assert_eq!(first.feasible.len(), 3);
        assert!(first.feasible.iter().all(|c| c.lobes() == 5));

        let a = first.best.candidate().unwrap();
        assert_eq!((a.fx, a.fy, a.frame_rate, a.fcp), (12, 18, 6, 144));

        let b = min_fcp.best.candidate().unwrap();
        assert_eq!((b.fx, b.fy, b.frame_rate, b.fcp), (15, 10, 5, 120));
    }

    #[test]
    fn ranked_order_follows_tie_break() {
        let first = search(&equal_lobe_config(TieBreak::FirstEncountered)).unwrap();
        assert_eq!(
            pairs(&first.ranked()),
            vec![(12, 18, 144), (15, 10, 120), (18, 12, 144)]
        );

        let min_fcp = search(&equal_lobe_config(TieBreak::MinCrossingFrequency)).unwrap();
        assert_eq!(
            pairs(&min_fcp.ranked()),
            vec![(15, 10, 120), (12, 18, 144), (18, 12, 144)]
        );
        assert_eq!(min_fcp.ranked()[0], min_fcp.best.candidate().unwrap());
    }

    #[test]
    fn repeated_search_is_identical() {
        let config = small_config();
        assert_eq!(search(&config).unwrap(), search(&config).unwrap());
    }

    #[test]
    fn infeasible_frame_rate_gives_empty_result() {
        // Consecutive integers are co-prime: frame rate 1 everywhere off-diagonal
        let config = SearchConfig {
            fx_range: FrequencyRange::new(2000, 2002),
            fy_range: FrequencyRange::new(2001, 2003),
            min_frame_rate: 60,
            ..small_config()
        };
        let report = search(&config).unwrap();
        assert_eq!(report.best, BestParameters::NoFeasibleCandidate);
        assert!(report.feasible.is_empty());
    }

    #[test]
    fn infeasible_sampling_gives_empty_result() {
        let config = SearchConfig { sampling_frequency: 100, ..small_config() };
        let report = search(&config).unwrap();
        assert!(!report.best.is_found());
        assert!(report.stats.undersampled > 0);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let empty = SearchConfig { fx_range: FrequencyRange::new(10, 10), ..small_config() };
        assert!(search(&empty).is_err());

        let zero = SearchConfig { fy_range: FrequencyRange::new(0, 10), ..small_config() };
        assert!(search(&zero).is_err());

        let bad_pitch = SearchConfig { pixel_pitch: 0.0, ..small_config() };
        assert!(search(&bad_pitch).is_err());

        let bad_res = SearchConfig { resolution: 0, ..small_config() };
        assert!(search(&bad_res).is_err());
    }

    #[test]
    fn tie_break_names_round_trip() {
        for tb in TieBreak::all() {
            assert_eq!(TieBreak::from_name(tb.name()), Some(*tb));
        }
        assert_eq!(TieBreak::from_name("bogus"), None);
    }

    #[test]
    fn config_from_partial_yaml_like_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"min_frame_rate": 30}"#).unwrap();
        assert_eq!(config.min_frame_rate, 30);
        assert_eq!(config.fx_range, FrequencyRange::new(2000, 2200));
    }
}
