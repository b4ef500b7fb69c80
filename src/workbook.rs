//! Workbook reading and writing.
//!
//! Values are read through calamine. Header fonts are not exposed by
//! calamine, so they are pulled straight from the `.xlsx` package
//! (`xl/styles.xml` plus the first row of the first worksheet). Output is
//! written with rust_xlsxwriter in constant-memory mode, one row at a time.

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::table::{CellValue, Row};

/// Excel worksheet maximum row count (header included).
pub const MAX_SHEET_ROWS: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const MAX_SHEET_COLS: usize = 16_384;

// ============================================================================
// Reading values
// ============================================================================

/// A data row with its one-based sheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub number: u32,
    pub cells: Vec<CellValue>,
}

/// Contents of a workbook's first worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    /// Header cells, as text. Covers every column holding data; blank
    /// names are replaced by `column_<n>`.
    pub header: Vec<String>,
    /// Data rows below the header, in sheet order
    pub rows: Vec<SheetRow>,
    /// Zero-based sheet column of the first header cell
    pub first_col: u32,
    /// One-based sheet row of the header
    pub header_row: u32,
}

/// Read the first worksheet of an `.xlsx`/`.xls` file.
///
/// The first non-empty row is the header. Rows with no values are skipped.
pub fn read_first_sheet(path: &Path) -> Result<SheetData> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} contains no worksheets", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet '{}' of {}", sheet_name, path.display()))?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut data = SheetData {
        first_col: start_col,
        ..Default::default()
    };

    let mut header: Option<Vec<String>> = None;
    let mut width = 0usize;
    for (offset, row) in range.rows().enumerate() {
        let mut values: Vec<CellValue> = row.iter().map(convert_cell).collect();
        let Some(used) = values.iter().rposition(|v| !v.is_empty()) else {
            continue;
        };
        width = width.max(used + 1);
        let number = start_row + offset as u32 + 1;
        if header.is_none() {
            header = Some(values.iter().map(header_text).collect());
            data.header_row = number;
            continue;
        }
        values.truncate(used + 1);
        data.rows.push(SheetRow {
            number,
            cells: values,
        });
    }

    let Some(mut header) = header else {
        bail!("{} has an empty first worksheet", path.display());
    };
    header.resize(width, String::new());
    let mut unnamed = 0usize;
    for (idx, name) in header.iter_mut().enumerate() {
        if name.is_empty() {
            *name = format!("column_{}", idx + 1);
            unnamed += 1;
        }
    }
    if unnamed > 0 {
        log::warn!(
            "{}: {} column(s) with data have no header name",
            path.display(),
            unnamed
        );
    }
    data.header = header;
    Ok(data)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Dates are carried as ISO day strings, matching the generated summaries.
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::Text(ndt.format("%Y-%m-%d").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn header_text(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Number(n) => n.to_string(),
        CellValue::Bool(b) => b.to_string(),
    }
}

// ============================================================================
// Reading header fonts
// ============================================================================

/// Font attributes captured from a header cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
}

impl HeaderFont {
    /// Equivalent rust_xlsxwriter format.
    pub fn to_format(&self) -> Format {
        let mut format = Format::new();
        if let Some(name) = &self.name {
            format = format.set_font_name(name.as_str());
        }
        if let Some(size) = self.size {
            format = format.set_font_size(size);
        }
        if self.bold {
            format = format.set_bold();
        }
        if self.italic {
            format = format.set_italic();
        }
        format
    }
}

/// Fonts of sheet row `header_row` (one-based) of the first worksheet, keyed
/// by zero-based sheet column.
pub fn read_header_fonts(path: &Path, header_row: u32) -> Result<BTreeMap<u32, HeaderFont>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("{} is not an .xlsx package", path.display()))?;

    let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?
        .ok_or_else(|| anyhow::anyhow!("{} has no xl/workbook.xml", path.display()))?;
    let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?
        .ok_or_else(|| anyhow::anyhow!("{} has no workbook relationships", path.display()))?;
    let sheet_part = first_sheet_part(&workbook_xml, &rels_xml)?;

    let (fonts, cell_xfs) = match read_part(&mut archive, "xl/styles.xml")? {
        Some(styles) => parse_styles(&styles)?,
        None => (Vec::new(), Vec::new()),
    };

    let sheet = archive
        .by_name(&sheet_part)
        .with_context(|| format!("Failed to open {} in {}", sheet_part, path.display()))?;
    let cell_styles = header_row_styles(BufReader::new(sheet), header_row)?;

    let mut result = BTreeMap::new();
    for (col, style_idx) in cell_styles {
        let font = cell_xfs
            .get(style_idx)
            .and_then(|font_id| fonts.get(*font_id))
            .cloned()
            .unwrap_or_default();
        result.insert(col, font);
    }
    Ok(result)
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to open {}", name)),
    };
    let mut content = String::new();
    part.read_to_string(&mut content)
        .with_context(|| format!("Failed to read {}", name))?;
    Ok(Some(content))
}

/// Value of the attribute whose local name is `name`.
fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Package path of the first worksheet, e.g. `xl/worksheets/sheet1.xml`.
fn first_sheet_part(workbook_xml: &str, rels_xml: &str) -> Result<String> {
    let mut reader = XmlReader::from_str(workbook_xml);
    let mut rel_id = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                rel_id = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"id" && a.key.prefix().is_some())
                    .map(|a| String::from_utf8_lossy(&a.value).into_owned());
                break;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    let rel_id = rel_id.ok_or_else(|| anyhow::anyhow!("workbook lists no worksheets"))?;

    let mut reader = XmlReader::from_str(rels_xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship"
                    && attr(&e, b"Id").as_deref() == Some(rel_id.as_str()) =>
            {
                let target = attr(&e, b"Target")
                    .ok_or_else(|| anyhow::anyhow!("relationship {} has no target", rel_id))?;
                return Ok(match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", target),
                });
            }
            Event::Eof => bail!("no relationship found for worksheet {}", rel_id),
            _ => {}
        }
    }
}

/// Fonts table and the font index of each cell format (`cellXfs`).
fn parse_styles(styles_xml: &str) -> Result<(Vec<HeaderFont>, Vec<usize>)> {
    let mut reader = XmlReader::from_str(styles_xml);
    let mut fonts = Vec::new();
    let mut cell_xfs = Vec::new();
    let mut in_fonts = false;
    let mut in_cell_xfs = false;
    let mut current: Option<HeaderFont> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"fonts" => in_fonts = true,
                b"cellXfs" => in_cell_xfs = true,
                b"font" if in_fonts => current = Some(HeaderFont::default()),
                b"xf" if in_cell_xfs => cell_xfs.push(font_id(&e)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"font" if in_fonts => fonts.push(HeaderFont::default()),
                b"xf" if in_cell_xfs => cell_xfs.push(font_id(&e)),
                name => {
                    if let Some(font) = current.as_mut() {
                        apply_font_property(font, name, &e);
                    }
                }
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"fonts" => in_fonts = false,
                b"cellXfs" => in_cell_xfs = false,
                b"font" => {
                    if let Some(font) = current.take() {
                        fonts.push(font);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok((fonts, cell_xfs))
}

fn font_id(e: &BytesStart) -> usize {
    attr(e, b"fontId")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn apply_font_property(font: &mut HeaderFont, name: &[u8], e: &BytesStart) {
    // `<b/>` and `<i/>` are on unless val says otherwise.
    let flag = || !matches!(attr(e, b"val").as_deref(), Some("0") | Some("false"));
    match name {
        b"b" => font.bold = flag(),
        b"i" => font.italic = flag(),
        b"sz" => font.size = attr(e, b"val").and_then(|v| v.parse().ok()),
        b"name" => font.name = attr(e, b"val"),
        _ => {}
    }
}

/// `(column, style index)` of every cell in sheet row `header_row`
/// (one-based).
fn header_row_styles<R: std::io::BufRead>(
    source: R,
    header_row: u32,
) -> Result<Vec<(u32, usize)>> {
    let mut reader = XmlReader::from_reader(source);
    let mut buf = Vec::new();
    let mut row_number: u32 = 0;
    let mut in_header = false;
    let mut cells: Vec<(u32, usize)> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                // `r` is optional; unnumbered rows follow the previous one.
                row_number = attr(&e, b"r")
                    .and_then(|r| r.parse().ok())
                    .unwrap_or(row_number + 1);
                if row_number > header_row {
                    break;
                }
                in_header = row_number == header_row;
            }
            Event::Start(e) | Event::Empty(e) if in_header && e.local_name().as_ref() == b"c" => {
                let col = attr(&e, b"r")
                    .and_then(|r| column_index(&r))
                    .unwrap_or_else(|| cells.last().map(|(c, _)| c + 1).unwrap_or(0));
                let style = attr(&e, b"s").and_then(|s| s.parse().ok()).unwrap_or(0);
                cells.push((col, style));
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                if in_header {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(cells)
}

/// Zero-based column of an A1 reference (`"C7"` → 2).
fn column_index(reference: &str) -> Option<u32> {
    let letters: String = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        n = n.checked_mul(26)?.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }
    Some(n - 1)
}

// ============================================================================
// Writing
// ============================================================================

/// Write `rows` under a styled header into a new single-sheet workbook.
///
/// Rows are pulled from `rows` into a buffer of at most `rows_per_chunk`
/// entries, written, and the buffer is reused for the next batch. Returns
/// the number of data rows written. Nothing is saved when the row limit is
/// exceeded.
pub fn write_workbook<'a, I>(
    path: &Path,
    columns: &[String],
    header_fonts: &BTreeMap<u32, HeaderFont>,
    rows: I,
    rows_per_chunk: usize,
) -> Result<usize>
where
    I: IntoIterator<Item = &'a Row>,
{
    if columns.len() > MAX_SHEET_COLS {
        bail!(
            "{} columns exceed the worksheet limit of {}",
            columns.len(),
            MAX_SHEET_COLS
        );
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet_with_constant_memory();

    for (col, name) in columns.iter().enumerate() {
        match header_fonts.get(&(col as u32)) {
            Some(font) => {
                sheet.write_string_with_format(0, col as u16, name, &font.to_format())?;
            }
            None => {
                sheet.write_string(0, col as u16, name)?;
            }
        }
    }

    let batch_size = rows_per_chunk.max(1);
    let mut source = rows.into_iter();
    let mut batch: Vec<&Row> = Vec::new();
    let mut written: usize = 0;
    let mut chunk_idx = 0usize;
    loop {
        batch.clear();
        batch.extend(source.by_ref().take(batch_size));
        if batch.is_empty() {
            break;
        }
        if written + batch.len() >= MAX_SHEET_ROWS {
            bail!(
                "more than {} data rows exceed the worksheet limit",
                MAX_SHEET_ROWS - 1
            );
        }
        for row in &batch {
            let sheet_row = (written + 1) as u32;
            for col in 0..columns.len() {
                let col_num = col as u16;
                match row.cell(col) {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        sheet.write_string(sheet_row, col_num, s)?;
                    }
                    CellValue::Number(n) => {
                        sheet.write_number(sheet_row, col_num, *n)?;
                    }
                    CellValue::Bool(b) => {
                        sheet.write_boolean(sheet_row, col_num, *b)?;
                    }
                }
            }
            written += 1;
        }
        chunk_idx += 1;
        log::debug!(
            "{}: chunk {} written ({} rows)",
            path.display(),
            chunk_idx,
            batch.len()
        );
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><sz val="14"/><name val="Arial"/></font>
    <font/>
  </fonts>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="2"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" xfId="0" applyFont="1"><alignment horizontal="center"/></xf>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_parse_styles() {
        let (fonts, xfs) = parse_styles(STYLES).unwrap();
        assert_eq!(fonts.len(), 3);
        assert_eq!(fonts[0].name.as_deref(), Some("Calibri"));
        assert_eq!(fonts[0].size, Some(11.0));
        assert!(!fonts[0].bold);
        assert_eq!(
            fonts[1],
            HeaderFont {
                name: Some("Arial".into()),
                size: Some(14.0),
                bold: true,
                italic: false,
            }
        );
        assert_eq!(xfs, vec![0, 1]);
    }

    #[test]
    fn test_first_sheet_part() {
        let wb = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets><sheet name="Data" sheetId="7" r:id="rId3"/><sheet name="B" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
        let rels = r#"<Relationships>
            <Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId3" Type="worksheet" Target="/xl/worksheets/sheet9.xml"/>
            </Relationships>"#;
        assert_eq!(first_sheet_part(wb, rels).unwrap(), "xl/worksheets/sheet9.xml");
    }

    #[test]
    fn test_header_row_styles() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1"></row>
            <row r="2"><c r="B2" s="1" t="s"><v>0</v></c><c r="C2"/><c s="1"/></row>
            <row r="3"><c r="A3" s="5"/></row>
            </sheetData></worksheet>"#;
        let styles = header_row_styles(sheet.as_bytes(), 2).unwrap();
        assert_eq!(styles, vec![(1, 1), (2, 0), (3, 1)]);
        assert_eq!(header_row_styles(sheet.as_bytes(), 3).unwrap(), vec![(0, 5)]);
        assert!(header_row_styles(sheet.as_bytes(), 1).unwrap().is_empty());
        assert!(header_row_styles(sheet.as_bytes(), 9).unwrap().is_empty());
    }

    #[test]
    fn test_header_row_styles_unnumbered_rows() {
        let sheet = r#"<worksheet><sheetData>
            <row><c s="3"/></row>
            <row><c s="4"/></row>
            </sheetData></worksheet>"#;
        assert_eq!(header_row_styles(sheet.as_bytes(), 2).unwrap(), vec![(0, 4)]);
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("XFD1"), Some(16_383));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let columns = vec!["region".to_string(), "amazon_week".to_string(), "flag".to_string()];
        let rows: Vec<Row> = (0..7)
            .map(|i| Row {
                cells: vec![
                    CellValue::Text(format!("R{}", i)),
                    CellValue::Number(21.0 + i as f64),
                    CellValue::Bool(i % 2 == 0),
                ],
                planning_horizon: 1,
            })
            .collect();
        let refs: Vec<&Row> = rows.iter().collect();
        let mut fonts = BTreeMap::new();
        fonts.insert(
            0,
            HeaderFont {
                name: Some("Arial".into()),
                size: Some(12.0),
                bold: true,
                italic: true,
            },
        );

        let written = write_workbook(&path, &columns, &fonts, refs.iter().copied(), 3).unwrap();
        assert_eq!(written, 7);

        let sheet = read_first_sheet(&path).unwrap();
        assert_eq!(sheet.header, columns);
        assert_eq!(sheet.rows.len(), 7);
        assert_eq!(sheet.rows[6].cells[0], CellValue::Text("R6".into()));
        assert_eq!(sheet.rows[6].cells[1], CellValue::Number(27.0));
        assert_eq!(sheet.rows[0].number, 2);
        assert_eq!(sheet.rows[6].number, 8);

        assert_eq!(sheet.header_row, 1);
        let read_fonts = read_header_fonts(&path, sheet.header_row).unwrap();
        let first = &read_fonts[&0];
        assert_eq!(first.name.as_deref(), Some("Arial"));
        assert_eq!(first.size, Some(12.0));
        assert!(first.bold && first.italic);
        assert!(!read_fonts[&1].bold);
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_first_sheet(&dir.path().join("nope.xlsx")).is_err());
        assert!(read_header_fonts(&dir.path().join("nope.xlsx"), 1).is_err());
    }

    #[test]
    fn test_row_limit_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.xlsx");
        let row = Row {
            cells: vec![CellValue::Number(1.0)],
            planning_horizon: 2,
        };
        let rows = std::iter::repeat(&row).take(MAX_SHEET_ROWS);
        let columns = vec!["v".to_string()];
        let err = write_workbook(&path, &columns, &BTreeMap::new(), rows, MAX_SHEET_ROWS).unwrap_err();
        assert!(err.to_string().contains("worksheet limit"));
        assert!(!path.exists());
    }

    #[test]
    fn test_blank_header_columns_keep_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank_header.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "region").unwrap();
        sheet.write_string(0, 1, "amazon_week").unwrap();
        sheet.write_string(1, 0, "US").unwrap();
        sheet.write_number(1, 1, 22).unwrap();
        sheet.write_number(1, 2, 99).unwrap();
        workbook.save(&path).unwrap();

        let data = read_first_sheet(&path).unwrap();
        assert_eq!(data.header, vec!["region", "amazon_week", "column_3"]);
        assert_eq!(data.rows[0].cells[2], CellValue::Number(99.0));
    }

    #[test]
    fn test_date_header_reads_as_iso_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("date_header.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 6, 9).unwrap();
        sheet.write_string(0, 0, "region").unwrap();
        sheet
            .write_datetime_with_format(0, 1, &date, &date_format)
            .unwrap();
        sheet.write_string(1, 0, "US").unwrap();
        workbook.save(&path).unwrap();

        let data = read_first_sheet(&path).unwrap();
        assert_eq!(data.header, vec!["region", "2024-06-09"]);
    }

    #[test]
    fn test_styled_blank_row_above_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leading_blank.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let loud = Format::new().set_bold().set_font_size(20);
        sheet.write_blank(0, 0, &loud).unwrap();
        sheet.write_blank(0, 1, &loud).unwrap();
        sheet.write_string(1, 0, "region").unwrap();
        sheet.write_string(1, 1, "amazon_week").unwrap();
        sheet.write_string(2, 0, "US").unwrap();
        sheet.write_number(2, 1, 22).unwrap();
        workbook.save(&path).unwrap();

        let data = read_first_sheet(&path).unwrap();
        assert_eq!(data.header_row, 2);
        assert_eq!(data.rows[0].number, 3);

        let fonts = read_header_fonts(&path, data.header_row).unwrap();
        assert!(!fonts[&0].bold);
        assert_ne!(fonts[&0].size, Some(20.0));
        let blank_row = read_header_fonts(&path, 1).unwrap();
        assert!(blank_row[&0].bold);
    }
}
