//! Shared workbook fixture
//!
//! Ledger headers: flag columns Alpha (R) and Beta (S), description columns
//! for both. Reference sheet maps Alpha, Beta and Gamma; Gamma has no flag
//! column on the ledger sheet.

#![allow(dead_code)]

use std::path::PathBuf;

use gdledger_core::{Column, LedgerLayout};
use gdledger_engine::Ledger;
use gdledger_xlsx::{Sheet, Workbook};
use tempfile::TempDir;

pub fn col(letters: &str) -> Column {
    Column::parse(letters).unwrap()
}

pub fn ledger_sheet() -> Sheet {
    let mut s = Sheet::new("ProyectosTI");
    s.set(1, 1, "Gestion de la Demanda");
    s.set(11, 1, "ID");
    s.set(11, 2, "Q Radicado");
    s.set(11, 3, "Priorizado");
    s.set(11, 5, "Proyecto TI");
    s.set(11, 13, "Avance");
    s.set(11, 14, "Estimado");
    s.set_cell(11, col("R"), "Alpha");
    s.set_cell(11, col("S"), "Beta");
    s.set_cell(11, col("BC"), "Desc Alpha");
    s.set_cell(11, col("BD"), "Desc Beta");
    s
}

pub fn reference_sheet() -> Sheet {
    let mut s = Sheet::new("Datos");
    for (c, header) in [
        (1, "Estado"),
        (2, "Q Radicado"),
        (3, "Responsable"),
        (4, "Area"),
        (5, "Tren"),
        (6, "Celula"),
        (8, "Celula Dependencia"),
        (9, "Celula Descripcion Dependencia"),
    ] {
        s.set(1, c, header);
    }
    s.set(2, 1, "En curso");
    s.set(2, 2, "Q1");
    s.set(3, 2, "Q2");

    s.set(2, 5, "Train 1");
    s.set(2, 6, "Alpha");
    s.set(3, 5, "Train 1");
    s.set(3, 6, "Beta");
    s.set(4, 5, "Train 2");
    s.set(4, 6, "Gamma");

    for (row, team) in [(2, "Alpha"), (3, "Beta"), (4, "Gamma")] {
        s.set(row, 8, team);
        s.set(row, 9, format!("Desc {}", team));
    }
    s
}

pub fn workbook() -> Workbook {
    let mut wb = Workbook::new();
    wb.push_sheet(ledger_sheet());
    wb.push_sheet(reference_sheet());
    let mut feedback = Sheet::new("Sugerencias");
    feedback.set(1, 1, "Comentario");
    feedback.set(2, 1, "Add a dashboard");
    wb.push_sheet(feedback);
    wb
}

/// A saved fixture workbook and a ledger bound to it
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
    pub ledger: Ledger,
}

pub fn fixture() -> Fixture {
    fixture_with(workbook())
}

pub fn fixture_with(wb: Workbook) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GD_v1.xlsx");
    wb.save(&path).unwrap();
    let ledger = Ledger::new(path.clone(), LedgerLayout::default()).unwrap();
    Fixture { dir, path, ledger }
}
