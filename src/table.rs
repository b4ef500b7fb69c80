//! In-memory unified table built from all input workbooks.

use std::mem::size_of;

/// A single cell value as read from a source workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Heap bytes owned by the value (inline size excluded).
    pub fn heap_bytes(&self) -> usize {
        match self {
            CellValue::Text(s) => s.capacity(),
            _ => 0,
        }
    }

    /// Numeric view: numbers directly, text if it parses as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A data row tagged with its planning horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Cells in unified column order; may be shorter than the column list
    pub cells: Vec<CellValue>,
    /// `(amazon_week - planning_week) mod 52`; never written out
    pub planning_horizon: u32,
}

impl Row {
    /// Rough resident size of the row, used for chunk sizing.
    pub fn estimated_bytes(&self) -> usize {
        size_of::<Row>()
            + self.cells.capacity() * size_of::<CellValue>()
            + self.cells.iter().map(CellValue::heap_bytes).sum::<usize>()
    }

    /// Cell at `col`, or `Empty` past the end of a short row.
    pub fn cell(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&CellValue::Empty)
    }
}

/// Union of every input file's rows under one column list.
///
/// Columns are matched by name; the first file fixes the initial order and
/// later files append any columns it did not have.
#[derive(Debug, Clone, Default)]
pub struct UnifiedTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl UnifiedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Map a source header onto unified column indices, adding new columns.
    ///
    /// Repeated names within one header map to distinct unified columns.
    pub fn map_header(&mut self, header: &[String]) -> Vec<usize> {
        let mut mapping: Vec<usize> = Vec::with_capacity(header.len());
        for name in header {
            let existing = self
                .columns
                .iter()
                .enumerate()
                .position(|(idx, col)| col == name && !mapping.contains(&idx));
            let idx = match existing {
                Some(idx) => idx,
                None => {
                    self.columns.push(name.clone());
                    self.columns.len() - 1
                }
            };
            mapping.push(idx);
        }
        mapping
    }

    /// Append a row whose cells are in source order, placing each cell at
    /// its mapped column.
    pub fn push_mapped(&mut self, mapping: &[usize], source: Vec<CellValue>, planning_horizon: u32) {
        let width = mapping.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        let mut cells = vec![CellValue::Empty; width];
        for (value, &col) in source.into_iter().zip(mapping) {
            cells[col] = value;
        }
        while matches!(cells.last(), Some(CellValue::Empty)) {
            cells.pop();
        }
        self.rows.push(Row {
            cells,
            planning_horizon,
        });
    }

    /// Lazily yield rows whose planning horizon lies in `start..=end`, in
    /// table order.
    pub fn iter_horizons(&self, start: u32, end: u32) -> impl Iterator<Item = &Row> + '_ {
        self.rows
            .iter()
            .filter(move |r| (start..=end).contains(&r.planning_horizon))
    }

    /// Collected form of [`UnifiedTable::iter_horizons`].
    pub fn select_horizons(&self, start: u32, end: u32) -> Vec<&Row> {
        self.iter_horizons(start, end).collect()
    }
}
