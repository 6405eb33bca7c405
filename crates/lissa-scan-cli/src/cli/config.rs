//! YAML configuration for the `search` and `sweep` commands.
//!
//! Both sections are optional and every field falls back to its default,
//! so a config file only needs the values that differ:
//!
//! ```yaml
//! search:
//!   fx_range: { start: 1000, end: 1500 }
//!   min_frame_rate: 30
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use lissa_scan::{SearchConfig, SweepConfig};

use super::common::CliResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub search: SearchConfig,
    pub sweep: SweepConfig,
}

impl ConfigFile {
    pub fn load<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        let config = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse config YAML {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Execute the example-config command.
pub fn cmd_example_config() -> CliResult<()> {
    println!("# lissa-scan configuration (all fields optional)");
    print!("{}", serde_yaml::to_string(&ConfigFile::default())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lissa_scan::{FrequencyRange, TieBreak};

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "
search:
  fx_range: { start: 100, end: 200 }
  tie_break: min_crossing_frequency
";
        let config: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.search.fx_range, FrequencyRange::new(100, 200));
        assert_eq!(config.search.tie_break, TieBreak::MinCrossingFrequency);
        assert_eq!(config.search.fy_range, SearchConfig::default().fy_range);
        assert_eq!(config.sweep, SweepConfig::default());
    }

    #[test]
    fn example_config_parses_back() {
        let yaml = serde_yaml::to_string(&ConfigFile::default()).unwrap();
        let parsed: ConfigFile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.search, SearchConfig::default());
        assert_eq!(parsed.sweep, SweepConfig::default());
    }
}
