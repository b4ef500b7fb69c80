//! Horizon coverage model.
//!
//! Tracks the working set of summary files and, for each planning horizon
//! slot W-1..W-10, which file supplies its data. Slot statuses are always
//! derived from the current file set; operator resolutions of duplicate slots
//! survive only while the slot's candidate set is unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::filename::{parse_filename, ParseIssue, HORIZON_COUNT, WEEKS_PER_YEAR};

/// Extensions accepted into the working set.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

// ============================================================================
// Types
// ============================================================================

/// A summary file in the working set, parsed once on add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Path as supplied by the caller
    pub path: PathBuf,
    /// Planning week parsed from the name
    pub planning_week: Option<u32>,
    /// Covered horizons parsed from the name
    pub horizons: Vec<u32>,
    /// Advisory filename problems
    pub issues: Vec<ParseIssue>,
}

impl InputFile {
    /// Parse `path` into an input file record.
    pub fn parse(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let parsed = parse_filename(&path.to_string_lossy());
        InputFile {
            path,
            planning_week: parsed.planning_week,
            horizons: parsed.horizons,
            issues: parsed.issues,
        }
    }

    /// Final path component, for display.
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    /// Whether this file declares `horizon`.
    pub fn covers(&self, horizon: u32) -> bool {
        self.horizons.contains(&horizon)
    }
}

/// Status of a single horizon slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    /// No file covers the horizon
    Unfilled,
    /// Exactly one file covers it
    Filled(PathBuf),
    /// Several files cover it and no choice has been made
    Duplicate(Vec<PathBuf>),
    /// Several files cover it and the operator picked one
    Resolved(PathBuf),
}

impl SlotStatus {
    /// Whether the slot has a single authoritative source.
    pub fn is_usable(&self) -> bool {
        matches!(self, SlotStatus::Filled(_) | SlotStatus::Resolved(_))
    }

    /// The authoritative source, if any.
    pub fn source(&self) -> Option<&Path> {
        match self {
            SlotStatus::Filled(p) | SlotStatus::Resolved(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Unfilled => write!(f, "-"),
            SlotStatus::Filled(p) => write!(f, "{}", display_name(p)),
            SlotStatus::Duplicate(paths) => {
                let names: Vec<String> = paths.iter().map(|p| display_name(p)).collect();
                write!(f, "Duplicate: {}", names.join(" | "))
            }
            SlotStatus::Resolved(p) => write!(f, "{} (selected)", display_name(p)),
        }
    }
}

/// One row of the coverage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorizonSlot {
    /// Horizon number, 1..=10
    pub horizon: u32,
    /// Amazon week this horizon lands on, when the planning week is known
    pub assigned_week: Option<u32>,
    /// Coverage status
    pub status: SlotStatus,
}

/// Whether the working set agrees on a single planning week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictState {
    Consistent,
    /// Two or more distinct planning weeks, ascending
    Conflicting { weeks: Vec<u32> },
}

impl ConflictState {
    pub fn is_conflicting(&self) -> bool {
        matches!(self, ConflictState::Conflicting { .. })
    }
}

/// Snapshot of the whole coverage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    /// Slots for horizons 1..=10, in order
    pub slots: Vec<HorizonSlot>,
    pub conflict: ConflictState,
    /// Agreed planning week (None when unset or conflicting)
    pub planning_week: Option<u32>,
}

impl CoverageReport {
    /// Slot for `horizon` (1-based).
    pub fn slot(&self, horizon: u32) -> Option<&HorizonSlot> {
        self.slots.iter().find(|s| s.horizon == horizon)
    }

    /// Whether every horizon in `start..=end` has a single source.
    pub fn is_range_usable(&self, start: u32, end: u32) -> bool {
        self.uncovered_in(start, end).is_empty()
    }

    /// Horizons in `start..=end` that are unfilled or unresolved duplicates.
    pub fn uncovered_in(&self, start: u32, end: u32) -> Vec<u32> {
        (start..=end)
            .filter(|h| !self.slot(*h).map(|s| s.status.is_usable()).unwrap_or(false))
            .collect()
    }
}

/// Horizons a given file is authoritative for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAssignment {
    pub path: PathBuf,
    pub horizons: BTreeSet<u32>,
}

/// Operator mistakes against the coverage model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoverageError {
    #[error("unsupported file type: {0} (expected .xlsx or .xls)")]
    UnsupportedFile(PathBuf),
    #[error("horizon {0} is outside 1..=10")]
    HorizonOutOfRange(u32),
    #[error("horizon W-{0} has no duplicate to resolve")]
    NotDuplicate(u32),
    #[error("{file} is not a candidate for horizon W-{horizon}")]
    NotACandidate { horizon: u32, file: String },
    #[error("multiple planning weeks detected ({0}); remove the summary files from the wrong planning week")]
    Conflicting(String),
}

#[derive(Debug, Clone)]
struct Resolution {
    chosen: PathBuf,
    candidates: Vec<PathBuf>,
}

// ============================================================================
// Model
// ============================================================================

/// Working set of summary files plus operator resolutions.
#[derive(Debug, Clone, Default)]
pub struct CoverageModel {
    files: Vec<InputFile>,
    resolutions: BTreeMap<u32, Resolution>,
}

impl CoverageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, parsing its name. Re-adding a path re-parses it in place.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> Result<&InputFile, CoverageError> {
        let path = path.into();
        if !is_supported(&path) {
            return Err(CoverageError::UnsupportedFile(path));
        }
        let file = InputFile::parse(path);
        for issue in &file.issues {
            log::warn!("{}: {}", file.file_name(), issue);
        }
        let idx = match self.files.iter().position(|f| f.path == file.path) {
            Some(idx) => {
                self.files[idx] = file;
                idx
            }
            None => {
                self.files.push(file);
                self.files.len() - 1
            }
        };
        self.prune_resolutions();
        Ok(&self.files[idx])
    }

    /// Remove a file. Returns false if it was not in the set.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.path != path);
        let removed = self.files.len() != before;
        if removed {
            self.prune_resolutions();
        }
        removed
    }

    /// Drop every file and resolution.
    pub fn clear(&mut self) {
        self.files.clear();
        self.resolutions.clear();
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Distinct planning weeks across the set.
    pub fn conflict(&self) -> ConflictState {
        let weeks: BTreeSet<u32> = self.files.iter().filter_map(|f| f.planning_week).collect();
        if weeks.len() > 1 {
            ConflictState::Conflicting {
                weeks: weeks.into_iter().collect(),
            }
        } else {
            ConflictState::Consistent
        }
    }

    /// The single agreed planning week, if any.
    pub fn planning_week(&self) -> Option<u32> {
        if self.conflict().is_conflicting() {
            return None;
        }
        self.files.iter().find_map(|f| f.planning_week)
    }

    /// Files declaring `horizon`, in working-set order.
    pub fn candidates(&self, horizon: u32) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.covers(horizon))
            .map(|f| f.path.clone())
            .collect()
    }

    /// Pick `chosen` as the source for a duplicate horizon.
    pub fn resolve(&mut self, horizon: u32, chosen: &Path) -> Result<(), CoverageError> {
        if !(1..=HORIZON_COUNT).contains(&horizon) {
            return Err(CoverageError::HorizonOutOfRange(horizon));
        }
        if let ConflictState::Conflicting { weeks } = self.conflict() {
            return Err(CoverageError::Conflicting(join_weeks(&weeks)));
        }
        let candidates = self.candidates(horizon);
        if candidates.len() < 2 {
            return Err(CoverageError::NotDuplicate(horizon));
        }
        if !candidates.iter().any(|c| c == chosen) {
            return Err(CoverageError::NotACandidate {
                horizon,
                file: display_name(chosen),
            });
        }
        log::info!("W-{} resolved to {}", horizon, display_name(chosen));
        self.resolutions.insert(
            horizon,
            Resolution {
                chosen: chosen.to_path_buf(),
                candidates,
            },
        );
        Ok(())
    }

    /// Current status of every slot.
    pub fn report(&self) -> CoverageReport {
        let conflict = self.conflict();
        let planning_week = self.planning_week();
        let slots = (1..=HORIZON_COUNT)
            .map(|horizon| HorizonSlot {
                horizon,
                assigned_week: planning_week.map(|w| assigned_week(w, horizon)),
                status: if conflict.is_conflicting() {
                    SlotStatus::Unfilled
                } else {
                    self.slot_status(horizon)
                },
            })
            .collect();
        CoverageReport {
            slots,
            conflict,
            planning_week,
        }
    }

    /// Per-file authoritative horizons, in working-set order.
    ///
    /// Files that end up authoritative for nothing are still listed (with an
    /// empty set) so the caller sees the whole working set.
    pub fn source_plan(&self) -> Result<Vec<SourceAssignment>, CoverageError> {
        if let ConflictState::Conflicting { weeks } = self.conflict() {
            return Err(CoverageError::Conflicting(join_weeks(&weeks)));
        }
        let mut plan: Vec<SourceAssignment> = self
            .files
            .iter()
            .map(|f| SourceAssignment {
                path: f.path.clone(),
                horizons: BTreeSet::new(),
            })
            .collect();
        for horizon in 1..=HORIZON_COUNT {
            if let Some(source) = self.slot_status(horizon).source() {
                if let Some(entry) = plan.iter_mut().find(|a| a.path == source) {
                    entry.horizons.insert(horizon);
                }
            }
        }
        Ok(plan)
    }

    fn slot_status(&self, horizon: u32) -> SlotStatus {
        let mut candidates = self.candidates(horizon);
        match candidates.len() {
            0 => SlotStatus::Unfilled,
            1 => SlotStatus::Filled(candidates.remove(0)),
            _ => match self.resolutions.get(&horizon) {
                Some(r) if r.candidates == candidates => SlotStatus::Resolved(r.chosen.clone()),
                _ => SlotStatus::Duplicate(candidates),
            },
        }
    }

    /// Forget resolutions whose candidate set has changed.
    fn prune_resolutions(&mut self) {
        let stale: Vec<u32> = self
            .resolutions
            .iter()
            .filter(|(h, r)| self.candidates(**h) != r.candidates)
            .map(|(h, _)| *h)
            .collect();
        for horizon in stale {
            log::debug!("W-{} resolution cleared: candidates changed", horizon);
            self.resolutions.remove(&horizon);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Amazon week a horizon lands on: `(planning_week + horizon) mod 52`, 0 → 52.
pub fn assigned_week(planning_week: u32, horizon: u32) -> u32 {
    (planning_week + horizon - 1) % WEEKS_PER_YEAR + 1
}

/// Planning horizon of a row: `(amazon_week - planning_week) mod 52`.
pub fn planning_horizon(amazon_week: u32, planning_week: u32) -> u32 {
    (amazon_week % WEEKS_PER_YEAR + WEEKS_PER_YEAR - planning_week % WEEKS_PER_YEAR)
        % WEEKS_PER_YEAR
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn join_weeks(weeks: &[u32]) -> String {
    weeks
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
