//! CLI command implementations.
//!
//! - `trace` - fill factor and coverage map of one scan
//! - `phases` - multi-phase combined coverage
//! - `search` - scan-parameter search
//! - `sweep` - harmonic ratio sweep
//! - `map` - value transfer from a reference image
//! - `example-config` - YAML config template

pub mod common;
pub mod config;
pub mod map;
pub mod phases;
pub mod search;
pub mod sweep;
pub mod trace;

pub use config::cmd_example_config;
pub use map::{cmd_map, MapArgs};
pub use phases::{cmd_phases, PhasesArgs};
pub use search::{cmd_search, SearchArgs};
pub use sweep::{cmd_sweep, SweepArgs};
pub use trace::{cmd_trace, TraceArgs};
