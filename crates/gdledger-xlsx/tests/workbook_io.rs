//! Integration tests for loading and saving workbooks
//!
//! Workbooks are built in memory, written to a temporary directory and read
//! back through calamine.

use calamine::{open_workbook, Data, Reader, Xlsx};
use gdledger_core::{Allocation, CellValue, Column, LedgerError, LedgerLayout};
use gdledger_xlsx::{MergedRange, Sheet, Workbook};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Format, Formula};

fn col(letters: &str) -> Column {
    Column::parse(letters).unwrap()
}

fn minimal_ledger() -> Workbook {
    let mut wb = Workbook::new();

    let mut ledger = Sheet::new("ProyectosTI");
    ledger.set(1, 1, "Portfolio tracker");
    ledger.set(11, 1, "ID");
    ledger.set(11, 5, "Proyecto TI");
    ledger.set(11, 18, "Alpha");
    wb.push_sheet(ledger);

    let mut datos = Sheet::new("Datos");
    datos.set(1, 1, "Estado");
    datos.set(2, 1, "Open");
    wb.push_sheet(datos);

    wb.push_sheet(Sheet::new("Sugerencias"));
    wb
}

#[test]
fn save_and_reopen_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GD_v1.xlsx");

    let mut wb = minimal_ledger();
    {
        let ledger = wb.require_sheet_mut("ProyectosTI").unwrap();
        ledger.set(12, 1, 1.0);
        ledger.set(12, 5, "CRM Migration");
        ledger.set(12, 18, "P");
        ledger.set(12, 95, 0.5);
    }
    wb.save(&path).unwrap();

    let reopened = Workbook::open(&path, &LedgerLayout::default()).unwrap();
    let ledger = reopened.require_sheet("ProyectosTI").unwrap();

    assert_eq!(ledger.cell(1, col("A")), &CellValue::from("Portfolio tracker"));
    assert_eq!(ledger.cell(12, col("A")), &CellValue::Number(1.0));
    assert_eq!(ledger.cell(12, col("E")), &CellValue::from("CRM Migration"));
    assert_eq!(ledger.cell(12, col("R")), &CellValue::from("P"));
    assert_eq!(ledger.cell(12, col("CQ")), &CellValue::Number(0.5));
    assert_eq!(reopened.sheet_names(), vec!["ProyectosTI", "Datos", "Sugerencias"]);
}

#[test]
fn allocation_advances_after_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GD_v1.xlsx");
    let layout = LedgerLayout::default();

    let mut wb = minimal_ledger();
    wb.save(&path).unwrap();

    let mut wb = Workbook::open(&path, &layout).unwrap();
    let ledger = wb.require_sheet_mut(&layout.ledger_sheet).unwrap();
    let first = ledger.allocate_next_row_and_id(layout.fields.id, layout.first_data_row);
    assert_eq!(first, Allocation { row: 12, id: 1 });
    ledger.set_cell(first.row, layout.fields.id, first.id);
    wb.save(&path).unwrap();

    let wb = Workbook::open(&path, &layout).unwrap();
    let ledger = wb.require_sheet(&layout.ledger_sheet).unwrap();
    let second = ledger.allocate_next_row_and_id(layout.fields.id, layout.first_data_row);
    assert_eq!(second, Allocation { row: 13, id: 2 });
}

#[test]
fn header_row_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GD_v1.xlsx");
    let layout = LedgerLayout::default();
    minimal_ledger().save(&path).unwrap();

    let wb = Workbook::open(&path, &layout).unwrap();
    let ledger = wb.require_sheet(&layout.ledger_sheet).unwrap();
    let header_row = ledger.resolve_header_row(&layout);
    assert_eq!(header_row, 11);
    assert_eq!(ledger.header_index(header_row).find_in("alpha", layout.flag_range), Some(18));
}

#[test]
fn missing_required_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.xlsx");

    let mut wb = Workbook::new();
    wb.push_sheet(Sheet::new("ProyectosTI"));
    wb.save(&path).unwrap();

    match Workbook::open(&path, &LedgerLayout::default()) {
        Err(LedgerError::MissingSheet(names)) => assert_eq!(names, vec!["Datos"]),
        other => panic!("expected MissingSheet, got {other:?}"),
    }
}

#[test]
fn garbage_container_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"this is not a zip archive").unwrap();

    let err = Workbook::open(&path, &LedgerLayout::default()).unwrap_err();
    assert!(matches!(err, LedgerError::Corrupt { .. }), "got {err:?}");
}

#[test]
fn failed_open_reports_missing_file_first() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.xlsb");
    let err = Workbook::open(&path, &LedgerLayout::default()).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[test]
fn to_bytes_produces_zip_container() {
    let bytes = minimal_ledger().to_bytes().unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[0..2], b"PK");
}

/// A ledger as a spreadsheet application would save it: a merged title
/// banner, a date cell and a formula column.
fn write_styled_ledger(path: &std::path::Path) {
    let mut xlsx = rust_xlsxwriter::Workbook::new();
    let date = Format::new().set_num_format("yyyy-mm-dd");

    let ledger = xlsx.add_worksheet();
    ledger.set_name("ProyectosTI").unwrap();
    ledger.merge_range(0, 0, 0, 3, "Portfolio tracker", &Format::new()).unwrap();
    ledger.write_string(10, 0, "ID").unwrap();
    ledger.write_string(10, 4, "Proyecto TI").unwrap();
    ledger.write_number(11, 0, 1.0).unwrap();
    ledger.write_string(11, 4, "CRM Migration").unwrap();
    ledger.write_number_with_format(11, 8, 46037.0, &date).unwrap();
    ledger.write_number(11, 12, 0.3).unwrap();
    ledger.write_number(11, 13, 0.6).unwrap();
    ledger
        .write_formula(11, 14, Formula::new("=M12/N12").set_result("0.5"))
        .unwrap();

    let datos = xlsx.add_worksheet();
    datos.set_name("Datos").unwrap();
    datos.write_string(0, 0, "Estado").unwrap();

    xlsx.save(path).unwrap();
}

#[test]
fn save_keeps_formulas_dates_and_merges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GD_v1.xlsx");
    let layout = LedgerLayout::default();
    write_styled_ledger(&path);

    let mut wb = Workbook::open(&path, &layout).unwrap();
    {
        let ledger = wb.require_sheet_mut(&layout.ledger_sheet).unwrap();
        assert_eq!(ledger.formula(12, 15), Some("M12/N12"));
        assert_eq!(ledger.number_format(12, 9), Some("yyyy-mm-dd"));
        assert_eq!(ledger.merged_ranges(), &[MergedRange::new(1, 1, 1, 4)]);

        let next = ledger.allocate_next_row_and_id(layout.fields.id, layout.first_data_row);
        ledger.set_cell(next.row, layout.fields.id, next.id);
        ledger.set_cell(next.row, layout.fields.name, "Data Lake");
    }
    wb.save(&path).unwrap();

    let mut xlsx: Xlsx<_> = open_workbook(&path).unwrap();
    let formulas = xlsx.worksheet_formula("ProyectosTI").unwrap();
    assert_eq!(
        formulas.get_value((11, 14)).map(|f| f.trim_start_matches('=')),
        Some("M12/N12")
    );
    let values = xlsx.worksheet_range("ProyectosTI").unwrap();
    assert!(
        matches!(values.get_value((11, 8)), Some(Data::DateTime(_))),
        "date cell lost its format: {:?}",
        values.get_value((11, 8))
    );
    assert_eq!(values.get_value((0, 0)), Some(&Data::String("Portfolio tracker".into())));
    assert_eq!(values.get_value((12, 4)), Some(&Data::String("Data Lake".into())));

    let reopened = Workbook::open(&path, &layout).unwrap();
    let ledger = reopened.require_sheet(&layout.ledger_sheet).unwrap();
    assert_eq!(ledger.merged_ranges(), &[MergedRange::new(1, 1, 1, 4)]);
    assert_eq!(ledger.cell(12, col("O")), &CellValue::Number(0.5));
}
