//! Progress reporting and cooperative cancellation for a combination run.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stage of a combination run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    RequestingSaveLocation,
    ExtractingHeaderFormat,
    ReadingInputFiles,
    ProcessingCombinations,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "idle",
            EngineState::RequestingSaveLocation => "requesting save location",
            EngineState::ExtractingHeaderFormat => "extracting header format",
            EngineState::ReadingInputFiles => "reading input files",
            EngineState::ProcessingCombinations => "processing combinations",
            EngineState::Completed => "completed",
            EngineState::Failed => "failed",
            EngineState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A progress milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub state: EngineState,
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

// Milestone percentages.
pub const PERCENT_START: u8 = 0;
pub const PERCENT_SAVE_LOCATION: u8 = 5;
pub const PERCENT_HEADER: u8 = 10;
pub const PERCENT_FILES_END: u8 = 50;
pub const PERCENT_COMBINATIONS_END: u8 = 95;
pub const PERCENT_DONE: u8 = 100;

/// Linear position of step `done` of `total` within `[from, to]`.
pub fn interpolate(from: u8, to: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return to;
    }
    let span = usize::from(to.saturating_sub(from));
    from + (span * done.min(total) / total) as u8
}

/// Shared cancellation flag, checked by the engine between files and
/// between combinations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag before reusing it for another run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Caller's answer to a save-location request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveLocation {
    /// Write outputs into this directory
    Selected(PathBuf),
    /// The caller gave no directory (dialog dismissed, timed out)
    NotProvided,
    /// The operator cancelled the run
    Cancelled,
}

/// Receiver of engine callbacks.
pub trait CombineObserver {
    /// Called at each milestone.
    fn on_progress(&mut self, progress: &Progress);

    /// Called once per run; blocks until the caller answers.
    fn request_save_location(&mut self) -> SaveLocation;
}
