//! Workbook serialization
//!
//! Every sheet is rewritten from the in-memory cells. The bytes are produced
//! first and then swapped in through a temporary file in the target
//! directory, so a failed save leaves the previous file untouched.

use std::io::Write;
use std::path::Path;

use gdledger_core::{CellValue, LedgerError, Result};
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet, XlsxError};

use crate::{Sheet, Workbook};

fn write_err(e: XlsxError) -> LedgerError {
    LedgerError::Write(e.to_string())
}

/// Render the workbook to XLSX bytes
pub(crate) fn to_bytes(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut xlsx = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(sheet.name()).map_err(write_err)?;

        write_sheet(worksheet, sheet)?;
    }

    xlsx.save_to_buffer().map_err(write_err)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    // Merges first: merge_range blanks the covered cells
    let blank = Format::new();
    for m in sheet.merged_ranges() {
        worksheet
            .merge_range(
                m.first_row - 1,
                m.first_col - 1,
                m.last_row - 1,
                m.last_col - 1,
                "",
                &blank,
            )
            .map_err(write_err)?;
    }

    // rust_xlsxwriter is 0-based
    for (row, col, formula) in sheet.formulas() {
        let (r, c) = (row - 1, col - 1);
        let cached = sheet.get(row, col);
        let formula = Formula::new(formula).set_result(cached.to_string());
        match sheet.number_format(row, col) {
            Some(code) => {
                let format = Format::new().set_num_format(code);
                worksheet.write_formula_with_format(r, c, formula, &format)
            }
            None => worksheet.write_formula(r, c, formula),
        }
        .map_err(write_err)?;
    }

    for (row, col, value) in sheet.cells() {
        if sheet.formula(row, col).is_some() {
            continue;
        }
        let (r, c) = (row - 1, col - 1);
        match (value, sheet.number_format(row, col)) {
            (CellValue::Number(n), Some(code)) => {
                let format = Format::new().set_num_format(code);
                worksheet.write_number_with_format(r, c, *n, &format)
            }
            (CellValue::Number(n), None) => worksheet.write_number(r, c, *n),
            (CellValue::Text(s), _) => worksheet.write_string(r, c, s),
            (CellValue::Bool(b), _) => worksheet.write_boolean(r, c, *b),
            (CellValue::Empty, _) => continue,
        }
        .map_err(write_err)?;
    }
    Ok(())
}

/// Replace the file at `path` with the workbook contents
pub(crate) fn save(workbook: &Workbook, path: &Path) -> Result<()> {
    let bytes = to_bytes(workbook)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| LedgerError::Io(e.error))?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "workbook saved");
    Ok(())
}
