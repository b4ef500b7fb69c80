//! Adaptive write-chunk sizing.
//!
//! The number of rows handed to the workbook writer per batch is derived from
//! the measured width of a row sample and the memory currently available, so
//! one combination's write buffer stays near a fixed share of free memory.

use sysinfo::System;

use crate::table::Row;

/// Default share of available memory one write batch may occupy.
pub const DEFAULT_TARGET_FRACTION: f64 = 0.1;
/// Rows inspected when measuring row width.
pub const SAMPLE_ROWS: usize = 1000;

/// Width assumed for an empty sample.
const NOMINAL_ROW_BYTES: usize = 1024;

/// Rows-per-chunk estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkEstimator {
    /// Bytes of memory available to the process
    pub available_bytes: u64,
    /// Fraction of `available_bytes` a batch may use
    pub target_fraction: f64,
}

impl ChunkEstimator {
    pub fn new(available_bytes: u64, target_fraction: f64) -> Self {
        ChunkEstimator {
            available_bytes,
            target_fraction,
        }
    }

    /// Probe the system for currently available memory.
    pub fn from_system(target_fraction: f64) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        let available = sys.available_memory();
        log::debug!(
            "available memory: {} MiB (total {} MiB)",
            available / (1024 * 1024),
            sys.total_memory() / (1024 * 1024)
        );
        Self::new(available, target_fraction)
    }

    /// Rows per chunk for rows shaped like `sample` (only the first
    /// [`SAMPLE_ROWS`] are measured). Never less than 1.
    pub fn estimate(&self, sample: &[&Row]) -> usize {
        let measured = &sample[..sample.len().min(SAMPLE_ROWS)];
        let bytes_per_row = if measured.is_empty() {
            NOMINAL_ROW_BYTES
        } else {
            let total: usize = measured.iter().map(|r| r.estimated_bytes()).sum();
            (total / measured.len()).max(1)
        };
        rows_per_chunk(self.available_bytes, self.target_fraction, bytes_per_row)
    }
}

/// `floor(available * fraction / bytes_per_row)`, floored at 1.
pub fn rows_per_chunk(available_bytes: u64, target_fraction: f64, bytes_per_row: usize) -> usize {
    let fraction = if target_fraction.is_finite() {
        target_fraction.clamp(0.0, 1.0)
    } else {
        DEFAULT_TARGET_FRACTION
    };
    let budget = available_bytes as f64 * fraction;
    let rows = (budget / bytes_per_row.max(1) as f64).floor();
    if rows < 1.0 {
        1
    } else if rows >= usize::MAX as f64 {
        usize::MAX
    } else {
        rows as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn sample_rows(n: usize, text_len: usize) -> Vec<Row> {
        (0..n)
            .map(|_| Row {
                cells: vec![
                    CellValue::Text("x".repeat(text_len)),
                    CellValue::Number(1.0),
                ],
                planning_horizon: 1,
            })
            .collect()
    }

    #[test]
    fn test_rows_per_chunk_basic() {
        assert_eq!(rows_per_chunk(1_000_000, 0.1, 100), 1000);
        assert_eq!(rows_per_chunk(1_000_000, 0.1, 1_000_000), 1);
        assert_eq!(rows_per_chunk(0, 0.1, 100), 1);
        assert_eq!(rows_per_chunk(1_000, 0.1, 0), 100);
        assert_eq!(rows_per_chunk(1_000, f64::NAN, 1), 100);
    }

    #[test]
    fn test_estimate_at_least_one() {
        let rows = sample_rows(5, 10_000);
        let refs: Vec<&Row> = rows.iter().collect();
        assert_eq!(ChunkEstimator::new(1, 0.1).estimate(&refs), 1);
        assert!(ChunkEstimator::new(0, 0.0).estimate(&[]) >= 1);
    }

    #[test]
    fn test_estimate_monotone_in_fraction() {
        let rows = sample_rows(50, 32);
        let refs: Vec<&Row> = rows.iter().collect();
        let available = 8 * 1024 * 1024 * 1024u64;
        let mut last = 0;
        for fraction in [0.01, 0.05, 0.1, 0.2, 0.5] {
            let n = ChunkEstimator::new(available, fraction).estimate(&refs);
            assert!(n >= last, "fraction {} gave {} < {}", fraction, n, last);
            last = n;
        }
    }

    #[test]
    fn test_wider_rows_give_smaller_chunks() {
        let narrow = sample_rows(10, 8);
        let wide = sample_rows(10, 4096);
        let est = ChunkEstimator::new(100 * 1024 * 1024, 0.1);
        let n_narrow = est.estimate(&narrow.iter().collect::<Vec<_>>());
        let n_wide = est.estimate(&wide.iter().collect::<Vec<_>>());
        assert!(n_wide < n_narrow);
    }

    #[test]
    fn test_sample_is_capped() {
        let mut rows = sample_rows(SAMPLE_ROWS, 8);
        rows.extend(sample_rows(10, 1_000_000));
        let refs: Vec<&Row> = rows.iter().collect();
        let est = ChunkEstimator::new(1 << 30, 0.1);
        let capped = est.estimate(&refs);
        let first_only = est.estimate(&refs[..SAMPLE_ROWS]);
        assert_eq!(capped, first_only);
    }
}
