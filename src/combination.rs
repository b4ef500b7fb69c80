//! Combination definitions: named horizon ranges that become output workbooks.

use std::fmt;
use std::str::FromStr;

use crate::coverage::CoverageReport;
use crate::filename::{horizon_token, HORIZON_COUNT};

/// Placeholder used in titles while no planning week is known.
pub const WEEK_NOT_SET: &str = "[Not Set]";
/// Marker appended to the title of a combination that will not run.
pub const DISABLED_SUFFIX: &str = " (Disabled)";

/// Named horizon range presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    A,
    B,
    C,
    D,
    All,
    Custom,
}

impl Preset {
    pub const ALL_PRESETS: [Preset; 6] = [
        Preset::A,
        Preset::B,
        Preset::C,
        Preset::D,
        Preset::All,
        Preset::Custom,
    ];

    /// Fixed `(start, end)` horizons of the preset.
    pub fn range(self) -> (u32, u32) {
        match self {
            Preset::A => (2, 2),
            Preset::B => (3, 5),
            Preset::C => (6, 7),
            Preset::D => (8, 10),
            Preset::All => (2, 10),
            Preset::Custom => (1, 10),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::A => "A",
            Preset::B => "B",
            Preset::C => "C",
            Preset::D => "D",
            Preset::All => "All",
            Preset::Custom => "Custom",
        };
        f.write_str(name)
    }
}

impl FromStr for Preset {
    type Err = CombinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL_PRESETS
            .iter()
            .copied()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CombinationError::UnknownPreset(s.to_string()))
    }
}

/// Why a combination cannot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// `start > end`
    Reversed,
    /// Horizons in range that are unfilled or unresolved duplicates
    Uncovered(Vec<u32>),
    /// The working set has more than one planning week
    Conflicting,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Valid => write!(f, "ok"),
            Validity::Reversed => write!(f, "start is after end"),
            Validity::Uncovered(horizons) => {
                let list: Vec<String> = horizons.iter().map(|h| format!("W-{}", h)).collect();
                write!(f, "not covered: {}", list.join(", "))
            }
            Validity::Conflicting => write!(f, "planning weeks conflict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombinationError {
    #[error("unknown preset '{0}' (expected A, B, C, D, All or Custom)")]
    UnknownPreset(String),
    #[error("preset {0} has a fixed range; switch to Custom to edit it")]
    PresetLocked(Preset),
    #[error("horizon {0} is outside 1..=10")]
    HorizonOutOfRange(u32),
}

/// A configurable slice of the horizon range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationDefinition {
    pub preset: Preset,
    pub start_horizon: u32,
    pub end_horizon: u32,
    /// Operator intent; only effective while the range is valid
    pub enabled: bool,
}

impl CombinationDefinition {
    /// Enabled definition spanning the preset's range.
    pub fn from_preset(preset: Preset) -> Self {
        let (start, end) = preset.range();
        CombinationDefinition {
            preset,
            start_horizon: start,
            end_horizon: end,
            enabled: true,
        }
    }

    /// Custom definition for an explicit range.
    pub fn custom(start: u32, end: u32) -> Result<Self, CombinationError> {
        let mut def = Self::from_preset(Preset::Custom);
        def.set_range(start, end)?;
        Ok(def)
    }

    /// Switch preset, resetting the range to the preset's.
    pub fn apply_preset(&mut self, preset: Preset) {
        let (start, end) = preset.range();
        self.preset = preset;
        self.start_horizon = start;
        self.end_horizon = end;
    }

    /// Override the range. Only Custom combinations are editable.
    pub fn set_range(&mut self, start: u32, end: u32) -> Result<(), CombinationError> {
        if self.preset != Preset::Custom {
            return Err(CombinationError::PresetLocked(self.preset));
        }
        for h in [start, end] {
            if !(1..=HORIZON_COUNT).contains(&h) {
                return Err(CombinationError::HorizonOutOfRange(h));
            }
        }
        self.start_horizon = start;
        self.end_horizon = end;
        Ok(())
    }

    pub fn validity(&self, report: &CoverageReport) -> Validity {
        if self.start_horizon > self.end_horizon {
            return Validity::Reversed;
        }
        if report.conflict.is_conflicting() {
            return Validity::Conflicting;
        }
        let uncovered = report.uncovered_in(self.start_horizon, self.end_horizon);
        if uncovered.is_empty() {
            Validity::Valid
        } else {
            Validity::Uncovered(uncovered)
        }
    }

    /// Enabled and valid.
    pub fn is_effective(&self, report: &CoverageReport) -> bool {
        self.enabled && self.validity(report).is_valid()
    }

    /// Request enablement. Enabling an invalid combination is a no-op;
    /// returns the resulting flag.
    pub fn set_enabled(&mut self, enabled: bool, report: &CoverageReport) -> bool {
        if !enabled || self.validity(report).is_valid() {
            self.enabled = enabled;
        }
        self.enabled
    }

    /// Title as shown to the operator, with the disabled marker when the
    /// combination will not run.
    pub fn display_title(&self, report: &CoverageReport) -> String {
        combination_title(
            report.planning_week,
            self.start_horizon,
            self.end_horizon,
            self.is_effective(report),
        )
    }

    /// `"<title> (Weeks s-e)"` line for confirmation listings.
    pub fn describe(&self, report: &CoverageReport) -> String {
        format!(
            "{} (Weeks {}-{})",
            self.display_title(report),
            self.start_horizon,
            self.end_horizon
        )
    }
}

/// `summary_file_plwk<week>_w-<start>...<end>`, plus the disabled marker.
pub fn combination_title(
    planning_week: Option<u32>,
    start: u32,
    end: u32,
    enabled: bool,
) -> String {
    let week = planning_week
        .map(|w| w.to_string())
        .unwrap_or_else(|| WEEK_NOT_SET.to_string());
    let mut title = format!("summary_file_plwk{}_w-{}", week, horizon_token(start, end));
    if !enabled {
        title.push_str(DISABLED_SUFFIX);
    }
    title
}

/// The five combinations the tool starts with: All, A, B, C, D.
pub fn default_combinations() -> Vec<CombinationDefinition> {
    [Preset::All, Preset::A, Preset::B, Preset::C, Preset::D]
        .into_iter()
        .map(CombinationDefinition::from_preset)
        .collect()
}

/// Parse a CLI combination spec: a preset name or `start-end`.
pub fn parse_combination_spec(spec: &str) -> Result<CombinationDefinition, CombinationError> {
    if let Some((start, end)) = spec.split_once('-') {
        let parse = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| CombinationError::UnknownPreset(spec.to_string()))
        };
        return CombinationDefinition::custom(parse(start)?, parse(end)?);
    }
    Ok(CombinationDefinition::from_preset(spec.parse()?))
}
