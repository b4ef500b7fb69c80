//! Persistent settings: `~/.summary-combiner.conf`.
//!
//! Plain `key=value` lines. Unknown keys are ignored; bad values fall back to
//! the default with a warning.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::chunking::DEFAULT_TARGET_FRACTION;
use crate::combination::{default_combinations, CombinationDefinition, Preset};
use crate::engine::CombineOptions;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SUMMARY_COMBINER_CONFIG";
const CONFIG_FILE_NAME: &str = ".summary-combiner.conf";
const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct CombinerConfig {
    /// Share of available memory a write batch may use, in (0, 1]
    pub target_memory_fraction: f64,
    pub save_location_timeout_secs: u64,
    /// Output directory used when none is given on the command line
    pub default_output_dir: Option<PathBuf>,
    /// Presets offered when no combination is given
    pub default_presets: Vec<Preset>,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        CombinerConfig {
            target_memory_fraction: DEFAULT_TARGET_FRACTION,
            save_location_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_output_dir: None,
            default_presets: default_combinations().iter().map(|c| c.preset).collect(),
        }
    }
}

impl CombinerConfig {
    /// `$SUMMARY_COMBINER_CONFIG`, else `$HOME/.summary-combiner.conf`.
    pub fn path() -> Option<PathBuf> {
        if let Ok(p) = std::env::var(CONFIG_ENV) {
            if !p.trim().is_empty() {
                return Some(PathBuf::from(p));
            }
        }
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location; defaults when absent.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; defaults when the file cannot be read.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("config: ignoring line without '=': {}", line);
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "target_memory_fraction" => match value.parse::<f64>() {
                    Ok(f) if f > 0.0 && f <= 1.0 => config.target_memory_fraction = f,
                    _ => log::warn!("config: invalid target_memory_fraction '{}'", value),
                },
                "save_location_timeout_secs" => match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => config.save_location_timeout_secs = secs,
                    _ => log::warn!("config: invalid save_location_timeout_secs '{}'", value),
                },
                "default_output_dir" => {
                    config.default_output_dir = (!value.is_empty()).then(|| PathBuf::from(value));
                }
                "default_presets" => {
                    let parsed: Result<Vec<Preset>, _> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::parse::<Preset>)
                        .collect();
                    match parsed {
                        Ok(presets) if !presets.is_empty() => config.default_presets = presets,
                        Ok(_) => log::warn!("config: default_presets is empty"),
                        Err(e) => log::warn!("config: invalid default_presets: {}", e),
                    }
                }
                _ => {}
            }
        }
        config
    }

    pub fn to_config_string(&self) -> String {
        let presets: Vec<String> = self.default_presets.iter().map(|p| p.to_string()).collect();
        format!(
            "target_memory_fraction={}\nsave_location_timeout_secs={}\ndefault_output_dir={}\ndefault_presets={}\n",
            self.target_memory_fraction,
            self.save_location_timeout_secs,
            self.default_output_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            presets.join(",")
        )
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_config_string())
            .with_context(|| format!("Failed to write config {}", path.display()))
    }

    /// Engine options derived from these settings.
    pub fn combine_options(&self) -> CombineOptions {
        CombineOptions {
            target_memory_fraction: self.target_memory_fraction,
            fixed_chunk_rows: None,
            save_location_timeout: Duration::from_secs(self.save_location_timeout_secs),
        }
    }

    /// Fresh, enabled combinations for the configured presets.
    pub fn initial_combinations(&self) -> Vec<CombinationDefinition> {
        self.default_presets
            .iter()
            .map(|p| CombinationDefinition::from_preset(*p))
            .collect()
    }
}
