//! Summary Combiner
//!
//! Reconciles weekly forecast summary workbooks into planning-horizon
//! combinations.
//!
//! Each input file is named `summary_file_plwk<week>_w-<h>.<h>...`: the
//! planning week it was produced for and the horizons (weeks ahead, 1..=10)
//! it covers. The library:
//! - `coverage`: tracks which file supplies each horizon, flags duplicates
//!   and planning-week conflicts, and records duplicate resolutions
//! - `combination`: preset and custom horizon ranges, their validity and titles
//! - `engine`: reads the inputs into one table and writes a workbook per
//!   combination, preserving the first file's header fonts
//! - `worker`: runs the engine on a background thread with streamed events
//!
//! Binaries:
//! - `summary-combiner`: inspect coverage and generate combinations

pub mod calendar;
pub mod chunking;
pub mod combination;
pub mod config;
pub mod coverage;
pub mod engine;
pub mod filename;
pub mod progress;
pub mod table;
pub mod workbook;
pub mod worker;

pub use combination::{CombinationDefinition, Preset};
pub use coverage::{CoverageModel, CoverageReport, SlotStatus};
pub use engine::{run_combination, CombineError, CombineRequest, CombineSummary};
pub use progress::{CancelFlag, CombineObserver, EngineState, Progress, SaveLocation};
pub use worker::{spawn_combination, CombineEvent, CombineTask};
