//! Workbook layout
//!
//! The ledger sheet has a fixed shape:
//!
//! ```text
//! row 11   | ID | Q | Priorizado | ... | Alpha | Beta | ... | Desc Alpha | ... | Total | L | P | Cub |
//! row 12.. | 1  |   | SI         | ... | P     | L    | ... | waiting    | ... | 2     | 1 | 1 | 0.5 |
//!            A    B   C                 R ........... BB    BC ......... CM   CN      CO  CP  CQ
//! ```
//!
//! Scalar fields live in fixed-letter columns. The two dependency ranges are
//! reserved, but which team owns which column inside a range is decided by
//! the header text only.

use serde::{Deserialize, Serialize};

use crate::{ColIndex, LedgerError, Result, RowIndex};

// ============================================================================
// Column addressing
// ============================================================================

/// A worksheet column, written and parsed as letters (`A`, `BB`, `CQ`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Column(ColIndex);

impl Column {
    /// Column from its 1-based number; `0` is clamped to `A`
    pub const fn new(index: ColIndex) -> Self {
        if index == 0 {
            Self(1)
        } else {
            Self(index)
        }
    }

    pub const fn index(self) -> ColIndex {
        self.0
    }

    /// Parse spreadsheet letters, case-insensitive
    pub fn parse(letters: &str) -> Option<Self> {
        let letters = letters.trim();
        if letters.is_empty() || letters.len() > 3 {
            return None;
        }
        let mut index: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            let digit = u32::from(c.to_ascii_uppercase()) - u32::from('A') + 1;
            index = index * 26 + digit;
        }
        // XFD is the last column Excel accepts
        if index > 16_384 {
            return None;
        }
        Some(Self(index as ColIndex))
    }

    pub fn letters(self) -> String {
        let mut n = u32::from(self.0);
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(char::from(b'A' + rem as u8));
            n = (n - 1) / 26;
        }
        out.iter().rev().collect()
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.letters())
    }
}

impl TryFrom<String> for Column {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Column::parse(&s).ok_or_else(|| format!("invalid column letters '{}'", s))
    }
}

impl From<Column> for String {
    fn from(c: Column) -> Self {
        c.letters()
    }
}

/// An inclusive range of columns, written as `R:BB`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRange {
    pub start: Column,
    pub end: Column,
}

impl ColumnRange {
    pub const fn new(start: Column, end: Column) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, col: ColIndex) -> bool {
        col >= self.start.index() && col <= self.end.index()
    }

    pub fn overlaps(&self, other: &ColumnRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn parse(s: &str) -> Option<Self> {
        let (a, b) = s.split_once(':')?;
        let start = Column::parse(a)?;
        let end = Column::parse(b)?;
        (start <= end).then_some(Self { start, end })
    }
}

impl std::fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl TryFrom<String> for ColumnRange {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        ColumnRange::parse(&s).ok_or_else(|| format!("invalid column range '{}'", s))
    }
}

impl From<ColumnRange> for String {
    fn from(r: ColumnRange) -> Self {
        r.to_string()
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Fixed-letter columns of the scalar project fields
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldColumns {
    pub id: Column,
    /// Quarter in which the project was filed (`Q_RADICADO`)
    pub quarter: Column,
    /// Prioritized flag, compared against the priority sentinel
    pub prioritized: Column,
    pub status: Column,
    pub name: Column,
    pub description: Column,
    pub owner: Column,
    pub requesting_area: Column,
    pub start_date: Column,
    pub target_date: Column,
    pub baseline: Column,
    pub baseline_at_period: Column,
    pub progress: Column,
    pub estimated_progress: Column,
    pub completion: Column,
    pub contribution: Column,
    pub initiative: Column,
}

impl Default for FieldColumns {
    fn default() -> Self {
        Self {
            id: Column::new(1),                  // A
            quarter: Column::new(2),             // B
            prioritized: Column::new(3),         // C
            status: Column::new(4),              // D
            name: Column::new(5),                // E
            description: Column::new(6),         // F
            owner: Column::new(7),               // G
            requesting_area: Column::new(8),     // H
            start_date: Column::new(9),          // I
            target_date: Column::new(10),        // J
            baseline: Column::new(11),           // K
            baseline_at_period: Column::new(12), // L
            progress: Column::new(13),           // M
            estimated_progress: Column::new(14), // N
            completion: Column::new(15),         // O
            contribution: Column::new(16),       // P
            initiative: Column::new(17),         // Q
        }
    }
}

/// Derived dependency aggregate columns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateColumns {
    pub total: Column,
    pub negotiated: Column,
    pub pending: Column,
    pub coverage: Column,
}

impl Default for AggregateColumns {
    fn default() -> Self {
        Self {
            total: Column::new(92),      // CN
            negotiated: Column::new(93), // CO
            pending: Column::new(94),    // CP
            coverage: Column::new(95),   // CQ
        }
    }
}

/// Layout of the reference (`Datos`) sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceLayout {
    /// Row holding the header texts
    pub header_row: RowIndex,
    /// First row of catalog values
    pub first_row: RowIndex,
    pub status: Column,
    pub priority: Column,
    pub requester: Column,
    pub area: Column,
    /// Group (train / CoE) column of the group→team pair
    pub group: Column,
    /// Team column of the group→team pair
    pub team: Column,
    /// Header of the team column of the description mapping
    pub team_header: String,
    /// Header of the description-header column of the description mapping
    pub description_header: String,
    pub initiative_header: String,
}

impl Default for ReferenceLayout {
    fn default() -> Self {
        Self {
            header_row: 1,
            first_row: 2,
            status: Column::new(1),
            priority: Column::new(2),
            requester: Column::new(3),
            area: Column::new(4),
            group: Column::new(5),
            team: Column::new(6),
            team_header: "Celula Dependencia".into(),
            description_header: "Celula Descripcion Dependencia".into(),
            initiative_header: "Iniciativa Estrategica".into(),
        }
    }
}

/// Complete workbook layout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerLayout {
    pub ledger_sheet: String,
    pub reference_sheet: String,
    /// Fallback header row when auto-detection finds nothing
    pub header_row: RowIndex,
    pub first_data_row: RowIndex,
    /// Header text of the identifier column, used to detect the header row
    pub id_header: String,
    pub fields: FieldColumns,
    pub flag_range: ColumnRange,
    pub description_range: ColumnRange,
    pub aggregates: AggregateColumns,
    pub reference: ReferenceLayout,
    /// Value of the prioritized column that marks a priority project
    pub priority_sentinel: String,
}

impl Default for LedgerLayout {
    fn default() -> Self {
        Self {
            ledger_sheet: "ProyectosTI".into(),
            reference_sheet: "Datos".into(),
            header_row: 11,
            first_data_row: 12,
            id_header: "ID".into(),
            fields: FieldColumns::default(),
            flag_range: ColumnRange::new(Column::new(18), Column::new(54)), // R:BB
            description_range: ColumnRange::new(Column::new(55), Column::new(91)), // BC:CM
            aggregates: AggregateColumns::default(),
            reference: ReferenceLayout::default(),
            priority_sentinel: "SI".into(),
        }
    }
}

impl LedgerLayout {
    /// Sheets that must exist for the workbook to open
    pub fn required_sheets(&self) -> [&str; 2] {
        [self.ledger_sheet.as_str(), self.reference_sheet.as_str()]
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_data_row <= self.header_row {
            return Err(LedgerError::InvalidLayout(format!(
                "first data row {} must come after header row {}",
                self.first_data_row, self.header_row
            )));
        }
        if self.flag_range.overlaps(&self.description_range) {
            return Err(LedgerError::InvalidLayout(format!(
                "flag range {} overlaps description range {}",
                self.flag_range, self.description_range
            )));
        }
        if self.ledger_sheet == self.reference_sheet {
            return Err(LedgerError::InvalidLayout(
                "ledger and reference sheet must differ".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
