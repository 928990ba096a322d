//! Workbook loading through calamine
//!
//! Values come from the cached results, formulas from a second pass over
//! the same sheet. Date cells keep a number format so they are written back
//! as dates.

use std::path::Path;

use calamine::{open_workbook, Data, Dimensions, Reader, Xlsx, XlsxError};
use gdledger_core::{CellValue, ColIndex, LedgerError, Result, RowIndex};

use crate::{MergedRange, Sheet, Workbook};

/// Extensions of the zip-based workbook family
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xltx", "xltm"];

/// Check presence and extension before touching the container
pub(crate) fn check_location(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(LedgerError::NotFound(path.to_path_buf()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(LedgerError::UnsupportedFormat(path.to_path_buf()));
    }
    Ok(())
}

pub(crate) fn load(path: &Path) -> Result<Workbook> {
    check_location(path)?;

    let corrupt = |reason: String| LedgerError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let mut xlsx: Xlsx<_> =
        open_workbook(path).map_err(|e: XlsxError| corrupt(e.to_string()))?;

    let merges_loaded = match xlsx.load_merged_regions() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "merged ranges unreadable");
            false
        }
    };

    let mut workbook = Workbook::new();
    for name in xlsx.sheet_names() {
        let range = xlsx
            .worksheet_range(&name)
            .map_err(|e| corrupt(format!("sheet '{}': {}", name, e)))?;
        let formulas = xlsx
            .worksheet_formula(&name)
            .map_err(|e| corrupt(format!("sheet '{}' formulas: {}", name, e)))?;

        let mut sheet = Sheet::new(name.as_str());
        // Ranges start at the first used cell, not at A1
        if let Some((row0, col0)) = range.start() {
            for (r, c, data) in range.used_cells() {
                let Some((row, col)) = position(row0, col0, r, c) else {
                    continue;
                };
                sheet.set(row, col, to_cell(data));
                if let Some(code) = date_format(data) {
                    sheet.set_number_format(row, col, code);
                }
            }
        }
        if let Some((row0, col0)) = formulas.start() {
            for (r, c, formula) in formulas.used_cells() {
                let Some((row, col)) = position(row0, col0, r, c) else {
                    continue;
                };
                let cached = sheet.get(row, col).clone();
                sheet.set_formula(row, col, formula.as_str(), cached);
            }
        }
        if merges_loaded {
            for (_, _, dims) in xlsx.merged_regions_by_sheet(&name) {
                if let Some(range) = to_merged(dims) {
                    sheet.merge(range);
                }
            }
        }

        tracing::debug!(
            sheet = %name,
            last_row = sheet.last_row(),
            formulas = sheet.formulas().count(),
            merged = sheet.merged_ranges().len(),
            "sheet loaded"
        );
        workbook.push_sheet(sheet);
    }

    Ok(workbook)
}

/// 1-based position of a cell at offset `(r, c)` from a range start
fn position(row0: u32, col0: u32, r: usize, c: usize) -> Option<(RowIndex, ColIndex)> {
    let row = RowIndex::try_from(row0 as usize + r + 1).ok()?;
    let col = ColIndex::try_from(col0 as usize + c + 1).ok()?;
    Some((row, col))
}

fn to_merged(dims: &Dimensions) -> Option<MergedRange> {
    let (first_row, first_col) = position(dims.start.0, dims.start.1, 0, 0)?;
    let (last_row, last_col) = position(dims.end.0, dims.end.1, 0, 0)?;
    Some(MergedRange::new(first_row, first_col, last_row, last_col))
}

/// Number format that makes a date cell display as a date again
fn date_format(data: &Data) -> Option<&'static str> {
    match data {
        Data::DateTime(dt) if dt.is_duration() => Some("[h]:mm:ss"),
        Data::DateTime(dt) if dt.as_f64().fract() == 0.0 => Some("yyyy-mm-dd"),
        Data::DateTime(_) => Some("yyyy-mm-dd hh:mm:ss"),
        _ => None,
    }
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Serial day number; the workbook stores dates the same way
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        other => CellValue::Text(other.to_string()),
    }
}
