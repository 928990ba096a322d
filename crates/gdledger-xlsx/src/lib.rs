//! # gdledger-xlsx
//!
//! Workbook access for the gdledger ledger.
//!
//! The backing file is read with `calamine` into an in-memory grid, mutated
//! there, and written back whole with `rust_xlsxwriter`. A round trip keeps
//! values, formulas, date formats and merged ranges. Cell styles, column
//! widths and data validations are not readable through `calamine` and are
//! lost on save.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gdledger_core::LedgerLayout;
//! use gdledger_xlsx::Workbook;
//!
//! let layout = LedgerLayout::default();
//! let mut workbook = Workbook::open("GD_v1.xlsx", &layout)?;
//! let ledger = workbook.require_sheet_mut(&layout.ledger_sheet)?;
//! let next = ledger.allocate_next_row_and_id(layout.fields.id, layout.first_data_row);
//! ledger.set_cell(next.row, layout.fields.id, next.id);
//! workbook.save("GD_v1.xlsx")?;
//! # Ok::<(), gdledger_core::LedgerError>(())
//! ```

mod reader;
mod sheet;
mod writer;

use std::path::Path;

use gdledger_core::{LedgerError, LedgerLayout, Result};

pub use reader::ACCEPTED_EXTENSIONS;
pub use sheet::{HeaderIndex, MergedRange, Sheet, MAX_IDENTIFIER};

/// An in-memory workbook: ordered sheets of values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a workbook and check that the layout's sheets exist.
    ///
    /// Fails with `NotFound`, `UnsupportedFormat`, `Corrupt` or
    /// `MissingSheet`, in that order.
    pub fn open(path: impl AsRef<Path>, layout: &LedgerLayout) -> Result<Self> {
        let workbook = Self::read(path)?;
        workbook.ensure_sheets(&layout.required_sheets())?;
        Ok(workbook)
    }

    /// Load a workbook without checking for any particular sheet
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        reader::load(path.as_ref())
    }

    /// Fail with every missing sheet name, sorted
    pub fn ensure_sheets(&self, required: &[&str]) -> Result<()> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|name| self.sheet(name).is_none())
            .map(|name| (*name).to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(LedgerError::MissingSheet(missing))
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    pub fn require_sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheet(name)
            .ok_or_else(|| LedgerError::MissingSheet(vec![name.to_string()]))
    }

    pub fn require_sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheet_mut(name)
            .ok_or_else(|| LedgerError::MissingSheet(vec![name.to_string()]))
    }

    /// Return the named sheet, appending an empty one if it does not exist
    pub fn sheet_or_insert(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.sheets.iter().position(|s| s.name() == name) {
            Some(idx) => idx,
            None => {
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[idx]
    }

    /// Append a sheet, replacing any sheet with the same name in place
    pub fn push_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name() == sheet.name()) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// Serialize to XLSX bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        writer::to_bytes(self)
    }

    /// Replace the file at `path` with this workbook.
    ///
    /// The write is all-or-nothing at the file level.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        writer::save(self, path.as_ref())
    }
}
