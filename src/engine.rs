//! Combiner engine.
//!
//! One run goes through the stages of [`EngineState`]: ask the caller for a
//! save directory, capture header fonts from the first input file, read every
//! input into a unified table tagged with planning horizon, then write one
//! workbook per combination in adaptive chunks.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calendar::{amazon_week, parse_iso_date};
use crate::chunking::{ChunkEstimator, DEFAULT_TARGET_FRACTION, SAMPLE_ROWS};
use crate::combination::{combination_title, CombinationDefinition};
use crate::coverage::{
    display_name, planning_horizon, ConflictState, CoverageModel, SourceAssignment,
};
use crate::filename::{HORIZON_COUNT, WEEKS_PER_YEAR};
use crate::progress::{
    interpolate, CancelFlag, CombineObserver, EngineState, Progress, SaveLocation,
    PERCENT_COMBINATIONS_END, PERCENT_DONE, PERCENT_FILES_END, PERCENT_HEADER,
    PERCENT_SAVE_LOCATION, PERCENT_START,
};
use crate::table::{CellValue, Row, UnifiedTable};
use crate::workbook::{
    read_first_sheet, read_header_fonts, write_workbook, HeaderFont, SheetData,
};

/// Column holding each row's Amazon week.
pub const AMAZON_WEEK_COLUMN: &str = "amazon_week";
/// Date column used when the Amazon week cell is blank.
pub const FORECAST_DATE_COLUMN: &str = "forecast_period_start";

// ============================================================================
// Request / result types
// ============================================================================

/// One output workbook to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationJob {
    /// Output file stem
    pub title: String,
    pub start_horizon: u32,
    pub end_horizon: u32,
}

/// Tunables for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineOptions {
    /// Share of available memory one write batch may use
    pub target_memory_fraction: f64,
    /// Fixed rows per write batch, bypassing the estimator
    pub fixed_chunk_rows: Option<usize>,
    /// How long a background run waits for a save directory
    pub save_location_timeout: Duration,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            target_memory_fraction: DEFAULT_TARGET_FRACTION,
            fixed_chunk_rows: None,
            save_location_timeout: Duration::from_secs(600),
        }
    }
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CombineRequest {
    pub planning_week: u32,
    /// Input files in order; the first one supplies header fonts
    pub sources: Vec<SourceAssignment>,
    /// Enabled combinations in output order
    pub combinations: Vec<CombinationJob>,
    pub options: CombineOptions,
}

impl CombineRequest {
    /// Request over plain paths, each file trusted for every horizon.
    pub fn new(planning_week: u32, paths: Vec<PathBuf>, combinations: Vec<CombinationJob>) -> Self {
        CombineRequest {
            planning_week,
            sources: paths
                .into_iter()
                .map(|path| SourceAssignment {
                    path,
                    horizons: (1..=HORIZON_COUNT).collect(),
                })
                .collect(),
            combinations,
            options: CombineOptions::default(),
        }
    }

    /// Build a request from the coverage model and the operator's
    /// combinations. Only effective combinations are kept.
    pub fn from_model(
        model: &CoverageModel,
        combinations: &[CombinationDefinition],
        options: CombineOptions,
    ) -> Result<Self, CombineError> {
        let report = model.report();
        if let ConflictState::Conflicting { weeks } = &report.conflict {
            return Err(CombineError::PlanningWeekConflict(weeks.clone()));
        }
        let planning_week = report.planning_week.ok_or(CombineError::PlanningWeekMissing)?;

        let mut jobs: Vec<CombinationJob> = Vec::new();
        for def in combinations {
            if !def.is_effective(&report) {
                log::info!(
                    "Skipping {}: {}",
                    def.display_title(&report),
                    if def.enabled {
                        def.validity(&report).to_string()
                    } else {
                        "disabled".to_string()
                    }
                );
                continue;
            }
            let title = combination_title(
                Some(planning_week),
                def.start_horizon,
                def.end_horizon,
                true,
            );
            if jobs.iter().any(|j| j.title == title) {
                log::warn!("Skipping repeated combination {}", title);
                continue;
            }
            jobs.push(CombinationJob {
                title,
                start_horizon: def.start_horizon,
                end_horizon: def.end_horizon,
            });
        }
        if jobs.is_empty() {
            return Err(CombineError::NoCombinations);
        }

        let plan = model
            .source_plan()
            .map_err(|_| CombineError::PlanningWeekMissing)?;
        let sources: Vec<SourceAssignment> = plan
            .into_iter()
            .filter(|s| {
                if s.horizons.is_empty() {
                    log::info!("{} supplies no selected horizon; not read", display_name(&s.path));
                }
                !s.horizons.is_empty()
            })
            .collect();
        if sources.is_empty() {
            return Err(CombineError::NoSources);
        }

        Ok(CombineRequest {
            planning_week,
            sources,
            combinations: jobs,
            options,
        })
    }
}

/// One workbook written by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// `<title>.xlsx`
    pub file_name: String,
    pub path: PathBuf,
    /// Data rows (header excluded)
    pub rows: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineSummary {
    pub save_dir: PathBuf,
    /// Generated files in combination order
    pub files: Vec<GeneratedFile>,
}

impl CombineSummary {
    /// File name → row count.
    pub fn row_counts(&self) -> BTreeMap<String, usize> {
        self.files
            .iter()
            .map(|f| (f.file_name.clone(), f.rows))
            .collect()
    }
}

/// Fatal outcomes of a run. `Display` is the operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombineError {
    #[error("no input files to combine")]
    NoSources,
    #[error("no combinations enabled; enable at least one combination before generating files")]
    NoCombinations,
    #[error("planning week not set")]
    PlanningWeekMissing,
    #[error("multiple planning weeks detected: {0:?}")]
    PlanningWeekConflict(Vec<u32>),
    #[error("combination {title}: start horizon {start} is after end horizon {end}")]
    ReversedRange { title: String, start: u32, end: u32 },
    #[error("invalid output title '{0}'")]
    InvalidTitle(String),
    #[error("save location not provided")]
    SaveLocationMissing,
    #[error("Error reading {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
    #[error("Error writing {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
    #[error("operation cancelled")]
    Cancelled,
}

impl CombineError {
    fn read(path: &Path, err: anyhow::Error) -> Self {
        CombineError::Read {
            path: path.to_path_buf(),
            message: format!("{:#}", err),
        }
    }

    fn write(path: &Path, err: anyhow::Error) -> Self {
        CombineError::Write {
            path: path.to_path_buf(),
            message: format!("{:#}", err),
        }
    }

    /// Final engine state this error corresponds to.
    pub fn state(&self) -> EngineState {
        match self {
            CombineError::Cancelled => EngineState::Cancelled,
            _ => EngineState::Failed,
        }
    }
}

// ============================================================================
// Run
// ============================================================================

/// Execute one combination run, calling back into `observer` at each
/// milestone. Cancellation is honored before each file read and before each
/// combination; a workbook being written is always finished.
pub fn run_combination(
    request: &CombineRequest,
    observer: &mut dyn CombineObserver,
    cancel: &CancelFlag,
) -> Result<CombineSummary, CombineError> {
    let result = run_stages(request, observer, cancel);
    match &result {
        Ok(summary) => log::info!(
            "Combination run completed: {} file(s) in {}",
            summary.files.len(),
            summary.save_dir.display()
        ),
        Err(CombineError::Cancelled) => log::warn!("Combination run cancelled"),
        Err(e) => log::error!("Combination run failed: {}", e),
    }
    result
}

fn run_stages(
    request: &CombineRequest,
    observer: &mut dyn CombineObserver,
    cancel: &CancelFlag,
) -> Result<CombineSummary, CombineError> {
    validate(request)?;
    report(observer, EngineState::Idle, PERCENT_START, "Starting file combination...");

    // -- Save location --
    report(
        observer,
        EngineState::RequestingSaveLocation,
        PERCENT_SAVE_LOCATION,
        "Waiting for save location...",
    );
    let save_dir = match observer.request_save_location() {
        SaveLocation::Selected(dir) => dir,
        SaveLocation::NotProvided => return Err(CombineError::SaveLocationMissing),
        SaveLocation::Cancelled => return Err(CombineError::Cancelled),
    };
    if !save_dir.is_dir() {
        return Err(CombineError::write(
            &save_dir,
            anyhow::anyhow!("destination is not a directory"),
        ));
    }
    if cancel.is_cancelled() {
        return Err(CombineError::Cancelled);
    }

    // -- Header format --
    report(
        observer,
        EngineState::ExtractingHeaderFormat,
        PERCENT_HEADER,
        "Extracting header format...",
    );
    let first = &request.sources[0].path;
    let first_sheet = read_first_sheet(first).map_err(|e| CombineError::read(first, e))?;
    let header_fonts = extract_header_fonts(first, &first_sheet)?;

    // -- Read inputs --
    let input = read_inputs(request, first_sheet, header_fonts, observer, cancel)?;

    // -- Write combinations --
    let files = write_combinations(request, &input, &save_dir, observer, cancel)?;

    report(
        observer,
        EngineState::Completed,
        PERCENT_DONE,
        "All combinations generated.",
    );
    Ok(CombineSummary { save_dir, files })
}

fn validate(request: &CombineRequest) -> Result<(), CombineError> {
    if request.sources.is_empty() {
        return Err(CombineError::NoSources);
    }
    if request.combinations.is_empty() {
        return Err(CombineError::NoCombinations);
    }
    if !(1..=WEEKS_PER_YEAR).contains(&request.planning_week) {
        return Err(CombineError::PlanningWeekMissing);
    }
    for job in &request.combinations {
        if job.start_horizon > job.end_horizon {
            return Err(CombineError::ReversedRange {
                title: job.title.clone(),
                start: job.start_horizon,
                end: job.end_horizon,
            });
        }
        let bad_char = job.title.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
        if job.title.trim().is_empty() || bad_char || job.title == "." || job.title == ".." {
            return Err(CombineError::InvalidTitle(job.title.clone()));
        }
    }
    Ok(())
}

fn report(observer: &mut dyn CombineObserver, state: EngineState, percent: u8, message: &str) {
    log::info!("[{:>3}%] {}", percent, message);
    observer.on_progress(&Progress {
        state,
        percent,
        message: message.to_string(),
    });
}

/// Fonts of the first file's header row, keyed by table column.
fn extract_header_fonts(
    path: &Path,
    sheet: &SheetData,
) -> Result<BTreeMap<u32, HeaderFont>, CombineError> {
    let is_xls = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xls"));
    if is_xls {
        log::warn!(
            "{}: header fonts cannot be read from .xls files; header written unstyled",
            display_name(path)
        );
        return Ok(BTreeMap::new());
    }
    let sheet_fonts =
        read_header_fonts(path, sheet.header_row).map_err(|e| CombineError::read(path, e))?;
    log::debug!(
        "captured {} header font(s) from row {} of {}",
        sheet_fonts.len(),
        sheet.header_row,
        display_name(path)
    );
    // Fonts are keyed by sheet column; the table starts at the header's
    // first column.
    Ok(sheet_fonts
        .into_iter()
        .filter(|(col, _)| *col >= sheet.first_col)
        .map(|(col, font)| (col - sheet.first_col, font))
        .collect())
}

fn read_inputs(
    request: &CombineRequest,
    first_sheet: SheetData,
    header_fonts: BTreeMap<u32, HeaderFont>,
    observer: &mut dyn CombineObserver,
    cancel: &CancelFlag,
) -> Result<(UnifiedTable, BTreeMap<u32, HeaderFont>), CombineError> {
    let total = request.sources.len();
    let mut table = UnifiedTable::new();
    let mut first_sheet = Some(first_sheet);

    for (idx, source) in request.sources.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(CombineError::Cancelled);
        }
        let path = &source.path;
        // The first file was already read for its header row.
        let sheet = match first_sheet.take() {
            Some(sheet) => sheet,
            None => read_first_sheet(path).map_err(|e| CombineError::read(path, e))?,
        };

        let week_col = find_column(&sheet.header, AMAZON_WEEK_COLUMN);
        let date_col = find_column(&sheet.header, FORECAST_DATE_COLUMN);
        if week_col.is_none() && date_col.is_none() {
            return Err(CombineError::read(
                path,
                anyhow::anyhow!(
                    "neither '{}' nor '{}' column found",
                    AMAZON_WEEK_COLUMN,
                    FORECAST_DATE_COLUMN
                ),
            ));
        }

        let mapping = table.map_header(&sheet.header);
        let mut kept = 0usize;
        let mut dropped = 0usize;
        for row in sheet.rows {
            let week = row_amazon_week(&row.cells, week_col, date_col).ok_or_else(|| {
                CombineError::read(
                    path,
                    anyhow::anyhow!("row {}: no usable {} value", row.number, AMAZON_WEEK_COLUMN),
                )
            })?;
            let horizon = planning_horizon(week, request.planning_week);
            if !source.horizons.contains(&horizon) {
                dropped += 1;
                continue;
            }
            table.push_mapped(&mapping, row.cells, horizon);
            kept += 1;
        }
        log::info!(
            "{}: {} row(s) kept, {} outside its assigned horizons",
            display_name(path),
            kept,
            dropped
        );

        report(
            observer,
            EngineState::ReadingInputFiles,
            interpolate(PERCENT_HEADER, PERCENT_FILES_END, idx + 1, total),
            &format!("Read file {} of {}: {}", idx + 1, total, display_name(path)),
        );
    }

    Ok((table, header_fonts))
}

/// Case-insensitive header lookup.
fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Amazon week of a row: the week column when it holds 1..=52, otherwise
/// derived from the forecast date.
fn row_amazon_week(
    cells: &[CellValue],
    week_col: Option<usize>,
    date_col: Option<usize>,
) -> Option<u32> {
    let from_week = week_col
        .and_then(|c| cells.get(c))
        .and_then(CellValue::as_f64)
        .filter(|w| w.fract() == 0.0 && (1.0..=WEEKS_PER_YEAR as f64).contains(w))
        .map(|w| w as u32);
    if from_week.is_some() {
        return from_week;
    }
    date_col
        .and_then(|c| cells.get(c))
        .and_then(CellValue::as_text)
        .and_then(parse_iso_date)
        .map(amazon_week)
}

fn write_combinations(
    request: &CombineRequest,
    input: &(UnifiedTable, BTreeMap<u32, HeaderFont>),
    save_dir: &Path,
    observer: &mut dyn CombineObserver,
    cancel: &CancelFlag,
) -> Result<Vec<GeneratedFile>, CombineError> {
    let (table, header_fonts) = input;
    let total = request.combinations.len();
    let mut files = Vec::with_capacity(total);
    let mut written: BTreeSet<String> = BTreeSet::new();

    for (idx, job) in request.combinations.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(CombineError::Cancelled);
        }
        let file_name = format!("{}.xlsx", job.title);
        if !written.insert(file_name.clone()) {
            log::warn!("{} already generated in this run; overwriting", file_name);
        }
        let path = save_dir.join(&file_name);

        let rows_per_chunk = match request.options.fixed_chunk_rows {
            Some(n) => n.max(1),
            None => {
                let sample: Vec<&Row> = table
                    .iter_horizons(job.start_horizon, job.end_horizon)
                    .take(SAMPLE_ROWS)
                    .collect();
                ChunkEstimator::from_system(request.options.target_memory_fraction)
                    .estimate(&sample)
            }
        };
        log::info!("{}: {} row(s) per chunk", file_name, rows_per_chunk);

        let rows = write_workbook(
            &path,
            table.columns(),
            header_fonts,
            table.iter_horizons(job.start_horizon, job.end_horizon),
            rows_per_chunk,
        )
        .map_err(|e| CombineError::write(&path, e))?;

        files.push(GeneratedFile {
            file_name: file_name.clone(),
            path,
            rows,
        });
        report(
            observer,
            EngineState::ProcessingCombinations,
            interpolate(PERCENT_FILES_END, PERCENT_COMBINATIONS_END, idx + 1, total),
            &format!(
                "Generated combination {} of {}: {} ({} rows)",
                idx + 1,
                total,
                file_name,
                rows
            ),
        );
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullObserver(SaveLocation);

    impl CombineObserver for NullObserver {
        fn on_progress(&mut self, _progress: &Progress) {}

        fn request_save_location(&mut self) -> SaveLocation {
            self.0.clone()
        }
    }

    fn job(start: u32, end: u32) -> CombinationJob {
        CombinationJob {
            title: combination_title(Some(20), start, end, true),
            start_horizon: start,
            end_horizon: end,
        }
    }

    #[test]
    fn test_row_amazon_week_prefers_week_column() {
        let cells = vec![
            CellValue::Number(23.0),
            CellValue::Text("2024-01-07".into()),
        ];
        assert_eq!(row_amazon_week(&cells, Some(0), Some(1)), Some(23));
        let blank = vec![CellValue::Empty, CellValue::Text("2024-01-07".into())];
        assert_eq!(row_amazon_week(&blank, Some(0), Some(1)), Some(2));
        let bad = vec![CellValue::Number(23.5), CellValue::Empty];
        assert_eq!(row_amazon_week(&bad, Some(0), Some(1)), None);
        let text = vec![CellValue::Text("7".into())];
        assert_eq!(row_amazon_week(&text, Some(0), None), Some(7));
    }

    #[test]
    fn test_find_column_case_insensitive() {
        let header = vec!["Region".to_string(), " Amazon_Week ".to_string()];
        assert_eq!(find_column(&header, AMAZON_WEEK_COLUMN), Some(1));
        assert_eq!(find_column(&header, FORECAST_DATE_COLUMN), None);
    }

    #[test]
    fn test_validate_rejects_bad_requests() {
        let mut request = CombineRequest::new(20, vec![], vec![job(2, 3)]);
        assert_eq!(validate(&request), Err(CombineError::NoSources));

        request.sources = CombineRequest::new(20, vec!["a.xlsx".into()], vec![]).sources;
        request.combinations.clear();
        assert_eq!(validate(&request), Err(CombineError::NoCombinations));

        request.combinations = vec![CombinationJob {
            title: "x".into(),
            start_horizon: 3,
            end_horizon: 2,
        }];
        assert!(matches!(
            validate(&request),
            Err(CombineError::ReversedRange { .. })
        ));

        request.combinations = vec![CombinationJob {
            title: "../escape".into(),
            start_horizon: 2,
            end_horizon: 2,
        }];
        assert!(matches!(validate(&request), Err(CombineError::InvalidTitle(_))));
    }

    #[test]
    fn test_missing_save_location_fails() {
        let request = CombineRequest::new(20, vec!["a.xlsx".into()], vec![job(2, 2)]);
        let mut observer = NullObserver(SaveLocation::NotProvided);
        let err = run_combination(&request, &mut observer, &CancelFlag::new()).unwrap_err();
        assert_eq!(err, CombineError::SaveLocationMissing);
        assert_eq!(err.to_string(), "save location not provided");

        let mut observer = NullObserver(SaveLocation::Cancelled);
        let err = run_combination(&request, &mut observer, &CancelFlag::new()).unwrap_err();
        assert_eq!(err.state(), EngineState::Cancelled);
    }

    #[test]
    fn test_unreadable_first_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let request = CombineRequest::new(
            20,
            vec![dir.path().join("missing_plwk20_w-2.xlsx")],
            vec![job(2, 2)],
        );
        let mut observer = NullObserver(SaveLocation::Selected(dir.path().to_path_buf()));
        let err = run_combination(&request, &mut observer, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, CombineError::Read { .. }));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_from_model_keeps_effective_combinations() {
        let mut model = CoverageModel::new();
        model.add_file("/in/summary_file_plwk20_w-2.3.xlsx").unwrap();
        model.add_file("/in/summary_file_plwk20_w-4.5.xlsx").unwrap();
        let defs = crate::combination::default_combinations();
        let request = CombineRequest::from_model(&model, &defs, CombineOptions::default()).unwrap();
        let titles: Vec<&str> = request.combinations.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["summary_file_plwk20_w-2", "summary_file_plwk20_w-3.4.5"]
        );
        assert_eq!(request.planning_week, 20);
        assert_eq!(request.sources.len(), 2);
    }

    #[test]
    fn test_from_model_errors() {
        let mut model = CoverageModel::new();
        model.add_file("/in/summary_file_plwk20_w-2.xlsx").unwrap();
        let only_b = vec![CombinationDefinition::from_preset(crate::combination::Preset::B)];
        assert_eq!(
            CombineRequest::from_model(&model, &only_b, CombineOptions::default()),
            Err(CombineError::NoCombinations)
        );
        model.add_file("/in/summary_file_plwk21_w-3.xlsx").unwrap();
        assert_eq!(
            CombineRequest::from_model(&model, &only_b, CombineOptions::default()),
            Err(CombineError::PlanningWeekConflict(vec![20, 21]))
        );
    }
}
