//! In-memory worksheet and header lookup
//!
//! Rows and columns are 1-based, matching what a user sees in Excel. Empty
//! cells are not stored, so the last used row is simply the largest stored
//! key.
//!
//! Besides values a sheet carries what a save must put back: formulas (with
//! their cached results as the cell values), number formats of date cells
//! and merged ranges.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use gdledger_core::{
    Allocation, CellValue, ColIndex, Column, ColumnRange, LedgerError, LedgerLayout, Result,
    RowIndex,
};

static EMPTY: CellValue = CellValue::Empty;

/// Identifiers above this are not exact in a floating-point cell and are
/// left out of allocation.
pub const MAX_IDENTIFIER: u64 = (1 << 53) - 1;

/// A rectangular merged area, 1-based and inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergedRange {
    pub first_row: RowIndex,
    pub first_col: ColIndex,
    pub last_row: RowIndex,
    pub last_col: ColIndex,
}

impl MergedRange {
    pub fn new(
        first_row: RowIndex,
        first_col: ColIndex,
        last_row: RowIndex,
        last_col: ColIndex,
    ) -> Self {
        Self {
            first_row: first_row.min(last_row),
            first_col: first_col.min(last_col),
            last_row: first_row.max(last_row),
            last_col: first_col.max(last_col),
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }
}

/// A single worksheet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(RowIndex, ColIndex), CellValue>,
    formulas: BTreeMap<(RowIndex, ColIndex), String>,
    number_formats: BTreeMap<(RowIndex, ColIndex), String>,
    merged: Vec<MergedRange>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, row: RowIndex, col: ColIndex) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    pub fn cell(&self, row: RowIndex, col: Column) -> &CellValue {
        self.get(row, col.index())
    }

    /// Store a value; an empty value clears the cell.
    ///
    /// A formula in the cell is replaced by the value. The number format
    /// stays.
    pub fn set(&mut self, row: RowIndex, col: ColIndex, value: impl Into<CellValue>) {
        let value = value.into();
        if row == 0 || col == 0 {
            return;
        }
        self.formulas.remove(&(row, col));
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub fn set_cell(&mut self, row: RowIndex, col: Column, value: impl Into<CellValue>) {
        self.set(row, col.index(), value);
    }

    pub fn clear(&mut self, row: RowIndex, col: ColIndex) {
        self.cells.remove(&(row, col));
        self.formulas.remove(&(row, col));
    }

    /// Store a formula (without the leading `=`) and its last computed value
    pub fn set_formula(
        &mut self,
        row: RowIndex,
        col: ColIndex,
        formula: impl Into<String>,
        cached: impl Into<CellValue>,
    ) {
        let formula = formula.into();
        let formula = formula.trim_start_matches('=').trim();
        if row == 0 || col == 0 || formula.is_empty() {
            return;
        }
        self.set(row, col, cached);
        self.formulas.insert((row, col), formula.to_string());
    }

    pub fn formula(&self, row: RowIndex, col: ColIndex) -> Option<&str> {
        self.formulas.get(&(row, col)).map(String::as_str)
    }

    /// Formula cells in row-major order
    pub fn formulas(&self) -> impl Iterator<Item = (RowIndex, ColIndex, &str)> {
        self.formulas.iter().map(|(&(r, c), f)| (r, c, f.as_str()))
    }

    pub fn set_number_format(&mut self, row: RowIndex, col: ColIndex, code: impl Into<String>) {
        if row == 0 || col == 0 {
            return;
        }
        self.number_formats.insert((row, col), code.into());
    }

    pub fn number_format(&self, row: RowIndex, col: ColIndex) -> Option<&str> {
        self.number_formats.get(&(row, col)).map(String::as_str)
    }

    /// Record a merged area; single cells are ignored
    pub fn merge(&mut self, range: MergedRange) {
        if range.first_row == 0 || range.first_col == 0 || range.is_single_cell() {
            return;
        }
        if !self.merged.contains(&range) {
            self.merged.push(range);
        }
    }

    pub fn merged_ranges(&self) -> &[MergedRange] {
        &self.merged
    }

    /// Last row holding a value, `0` for an empty sheet
    pub fn last_row(&self) -> RowIndex {
        self.cells.keys().next_back().map_or(0, |(row, _)| *row)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.formulas.is_empty()
    }

    /// Non-empty cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (RowIndex, ColIndex, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    /// Non-empty cells of one row, left to right
    pub fn row(&self, row: RowIndex) -> impl Iterator<Item = (ColIndex, &CellValue)> {
        self.cells
            .range((row, 0)..=(row, ColIndex::MAX))
            .map(|(&(_, c), v)| (c, v))
    }

    /// Non-empty cells of one column from `start_row` down
    pub fn column(
        &self,
        col: Column,
        start_row: RowIndex,
    ) -> impl Iterator<Item = (RowIndex, &CellValue)> {
        let col = col.index();
        self.cells
            .range((start_row, 0)..)
            .filter(move |((_, c), _)| *c == col)
            .map(|(&(r, _), v)| (r, v))
    }

    // ------------------------------------------------------------------------
    // Ledger helpers
    // ------------------------------------------------------------------------

    /// Locate the header row by its identifier header.
    ///
    /// Title rows and merged banners above the table can push the header
    /// down, so the identifier column is scanned above the first data row.
    /// Falls back to the layout's header row.
    pub fn resolve_header_row(&self, layout: &LedgerLayout) -> RowIndex {
        let target = layout.id_header.trim().to_lowercase();
        let col = layout.fields.id.index();
        for row in 1..layout.first_data_row {
            if let CellValue::Text(s) = self.get(row, col) {
                if s.trim().to_lowercase() == target {
                    return row;
                }
            }
        }
        tracing::debug!(
            sheet = %self.name,
            fallback = layout.header_row,
            "identifier header not found, using fallback header row"
        );
        layout.header_row
    }

    /// Build the header lookup table for `row`
    pub fn header_index(&self, row: RowIndex) -> HeaderIndex {
        HeaderIndex::build(self, row)
    }

    /// Next free row and identifier for a new record.
    ///
    /// The row is the one after the last row with a non-empty identifier,
    /// the identifier is one above the largest numeric identifier seen.
    /// Identifiers stored as numeric text count as numbers. Identifiers above
    /// [`MAX_IDENTIFIER`] still occupy their row but do not raise the next
    /// identifier.
    pub fn allocate_next_row_and_id(&self, id_col: Column, first_data_row: RowIndex) -> Allocation {
        let mut last_used: Option<RowIndex> = None;
        let mut max_id: u64 = 0;

        for (row, value) in self.column(id_col, first_data_row) {
            if value.is_empty() {
                continue;
            }
            last_used = Some(row);
            match numeric_id(value) {
                Some(id) if id <= MAX_IDENTIFIER => max_id = max_id.max(id),
                Some(_) => tracing::warn!(
                    sheet = %self.name,
                    row,
                    value = %value,
                    "identifier out of range, ignored for allocation"
                ),
                None => {}
            }
        }

        let allocation = Allocation {
            row: last_used.map_or(first_data_row, |r| r + 1),
            id: max_id + 1,
        };
        tracing::debug!(sheet = %self.name, row = allocation.row, id = allocation.id, "allocated row");
        allocation
    }

    /// Sorted distinct non-empty values of a column from `start_row` down
    pub fn unique_values(&self, col: Column, start_row: RowIndex) -> Vec<String> {
        self.column(col, start_row)
            .filter(|(_, v)| !v.is_empty())
            .map(|(_, v)| v.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Non-negative integer part of a numeric identifier. Values past `u64`
/// saturate; the caller bounds them.
fn numeric_id(value: &CellValue) -> Option<u64> {
    let n = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then(|| n.trunc() as u64)
}

// ============================================================================
// Header index
// ============================================================================

/// Header text → columns lookup for one header row
///
/// Matching is case-insensitive on trimmed text. Duplicate headers keep all
/// their columns in ascending order and the first one inside the requested
/// range wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    row: RowIndex,
    columns: HashMap<String, Vec<ColIndex>>,
}

impl HeaderIndex {
    pub fn build(sheet: &Sheet, row: RowIndex) -> Self {
        let mut columns: HashMap<String, Vec<ColIndex>> = HashMap::new();
        for (col, value) in sheet.row(row) {
            let key = normalize(&value.to_string());
            if key.is_empty() {
                continue;
            }
            columns.entry(key).or_default().push(col);
        }
        Self { row, columns }
    }

    pub fn row(&self) -> RowIndex {
        self.row
    }

    /// First column anywhere in the row whose header matches
    pub fn find(&self, header: &str) -> Option<ColIndex> {
        self.lookup(header)?.first().copied()
    }

    /// First column inside `range` whose header matches
    pub fn find_in(&self, header: &str, range: ColumnRange) -> Option<ColIndex> {
        self.lookup(header)?
            .iter()
            .copied()
            .find(|c| range.contains(*c))
    }

    /// Like `find_in`, failing with `ColumnNotFound`
    pub fn require_in(&self, header: &str, range: ColumnRange) -> Result<ColIndex> {
        self.find_in(header, range)
            .ok_or_else(|| LedgerError::ColumnNotFound {
                header: header.to_string(),
                range: range.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn lookup(&self, header: &str) -> Option<&Vec<ColIndex>> {
        let key = normalize(header);
        if key.is_empty() {
            return None;
        }
        self.columns.get(&key)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn col(letters: &str) -> Column {
        Column::parse(letters).unwrap()
    }

    #[test]
    fn set_empty_clears_cell() {
        let mut sheet = Sheet::new("S");
        sheet.set(3, 2, "x");
        assert_eq!(sheet.last_row(), 3);
        sheet.set(3, 2, CellValue::Empty);
        assert!(sheet.is_empty());
        assert_eq!(sheet.last_row(), 0);
    }

    #[test]
    fn allocation_on_empty_ledger() {
        let sheet = Sheet::new("ProyectosTI");
        assert_eq!(sheet.allocate_next_row_and_id(col("A"), 12), Allocation { row: 12, id: 1 });
    }

    #[test]
    fn allocation_follows_last_row_and_max_id() {
        let mut sheet = Sheet::new("ProyectosTI");
        sheet.set(12, 1, 1.0);
        sheet.set(13, 1, 7.0);
        sheet.set(14, 1, "3");
        // A name further down without an identifier does not move the row
        sheet.set(20, 5, "orphan");
        assert_eq!(sheet.allocate_next_row_and_id(col("A"), 12), Allocation { row: 15, id: 8 });
    }

    #[test]
    fn allocation_ignores_header_area() {
        let mut sheet = Sheet::new("ProyectosTI");
        sheet.set(11, 1, "ID");
        sheet.set(5, 1, 99.0);
        assert_eq!(sheet.allocate_next_row_and_id(col("A"), 12), Allocation { row: 12, id: 1 });
    }

    #[test]
    fn non_numeric_identifier_still_occupies_row() {
        let mut sheet = Sheet::new("ProyectosTI");
        sheet.set(12, 1, "legacy");
        assert_eq!(sheet.allocate_next_row_and_id(col("A"), 12), Allocation { row: 13, id: 1 });
    }

    #[test]
    fn huge_identifier_does_not_overflow_allocation() {
        let mut sheet = Sheet::new("ProyectosTI");
        sheet.set(12, 1, 4.0);
        sheet.set(13, 1, "1e20");
        sheet.set(14, 1, f64::MAX);
        assert_eq!(sheet.allocate_next_row_and_id(col("A"), 12), Allocation { row: 15, id: 5 });

        sheet.set(15, 1, MAX_IDENTIFIER as f64);
        assert_eq!(
            sheet.allocate_next_row_and_id(col("A"), 12),
            Allocation { row: 16, id: MAX_IDENTIFIER + 1 }
        );
    }

    #[test]
    fn value_replaces_formula_but_keeps_format() {
        let mut sheet = Sheet::new("ProyectosTI");
        sheet.set_formula(12, 15, "=M12/N12", 0.5);
        sheet.set_number_format(12, 15, "0.00");
        assert_eq!(sheet.formula(12, 15), Some("M12/N12"));
        assert_eq!(sheet.get(12, 15), &CellValue::Number(0.5));

        sheet.set(12, 15, 0.75);
        assert_eq!(sheet.formula(12, 15), None);
        assert_eq!(sheet.number_format(12, 15), Some("0.00"));
    }

    #[test]
    fn single_cell_merges_are_ignored() {
        let mut sheet = Sheet::new("ProyectosTI");
        sheet.merge(MergedRange::new(1, 1, 1, 1));
        sheet.merge(MergedRange::new(1, 4, 1, 1));
        sheet.merge(MergedRange::new(1, 1, 1, 4));
        assert_eq!(sheet.merged_ranges(), &[MergedRange::new(1, 1, 1, 4)]);
    }

    #[test]
    fn header_row_detection_and_fallback() {
        let layout = LedgerLayout::default();
        let mut sheet = Sheet::new("ProyectosTI");
        assert_eq!(sheet.resolve_header_row(&layout), 11);

        sheet.set(1, 1, "Portfolio 2026");
        sheet.set(9, 1, "  id ");
        assert_eq!(sheet.resolve_header_row(&layout), 9);
    }

    #[test]
    fn header_lookup_is_case_insensitive_and_first_match_wins() {
        let mut sheet = Sheet::new("ProyectosTI");
        sheet.set(11, 5, "Proyecto TI");
        sheet.set(11, 18, "Alpha");
        sheet.set(11, 19, " BETA ");
        sheet.set(11, 30, "alpha");
        sheet.set(11, 60, "Alpha");

        let headers = sheet.header_index(11);
        let flags = ColumnRange::parse("R:BB").unwrap();
        let descs = ColumnRange::parse("BC:CM").unwrap();

        assert_eq!(headers.find("proyecto ti"), Some(5));
        assert_eq!(headers.find_in("ALPHA", flags), Some(18));
        assert_eq!(headers.find_in("beta", flags), Some(19));
        assert_eq!(headers.find_in("alpha", descs), Some(60));
        assert_eq!(headers.find_in("Gamma", flags), None);
        assert_eq!(headers.find_in("", flags), None);
        assert!(matches!(
            headers.require_in("Gamma", flags),
            Err(LedgerError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn unique_values_are_sorted_and_distinct() {
        let mut sheet = Sheet::new("Datos");
        sheet.set(1, 1, "Estado");
        sheet.set(2, 1, "Open");
        sheet.set(3, 1, "Closed");
        sheet.set(4, 1, "Open");
        sheet.set(6, 1, 2026.0);
        sheet.set(3, 2, "other column");
        assert_eq!(sheet.unique_values(col("A"), 2), vec!["2026", "Closed", "Open"]);
    }
}
