//! # gdledger-core
//!
//! Core domain model for the gdledger dependency ledger.
//!
//! This crate provides:
//! - Domain types: `NewProject`, `Dependency`, `Flag`, `Catalogs`
//! - The workbook layout (`LedgerLayout`) and column addressing helpers
//! - Cell values and the tolerant numeric coercion chain
//! - Dependency aggregates and the traffic-light classification
//! - Report types returned by the engine
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```rust
//! use gdledger_core::{Dependency, DependencySignal, DependencyTotals};
//!
//! let deps = vec![
//!     Dependency::new("Alpha", "P", "waiting on API"),
//!     Dependency::new("Beta", "L", ""),
//!     Dependency::new("Gamma", "x", "ignored"),
//! ];
//!
//! let totals = DependencyTotals::from_dependencies(&deps);
//! assert_eq!(totals.total, 2);
//! assert_eq!(totals.coverage(), 0.5);
//! assert_eq!(totals.signal(), DependencySignal::Yellow);
//! ```

pub mod catalog;
pub mod dependency;
pub mod layout;
pub mod project;
pub mod report;
pub mod value;

use std::path::PathBuf;

use thiserror::Error;

pub use catalog::{Catalogs, GroupMap, TeamMap};
pub use dependency::{classify_status, Dependency, DependencySignal, DependencyTotals, Flag};
pub use layout::{
    AggregateColumns, Column, ColumnRange, FieldColumns, LedgerLayout, ReferenceLayout,
};
pub use project::NewProject;
pub use report::{
    Allocation, DependencyDetail, Lookup, Metrics, ProgressUpdate, ProjectSummary,
    StoredAggregates, TeamRow, TeamSummary,
};
pub use value::{coerce_numeric, CellValue, PercentConvention};

// ============================================================================
// Type Aliases
// ============================================================================

/// 1-based worksheet row number, as shown in the spreadsheet UI
pub type RowIndex = u32;

/// 1-based worksheet column number (`A` = 1)
pub type ColIndex = u16;

/// Result alias used across the ledger crates
pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

// ============================================================================
// Errors
// ============================================================================

/// Ledger error
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Workbook not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported workbook format (expected .xlsx/.xlsm/.xltx/.xltm): {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Workbook could not be parsed: {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Missing required sheets: {}", .0.join(", "))]
    MissingSheet(Vec<String>),

    #[error("Column '{header}' not found in {range}")]
    ColumnNotFound { header: String, range: String },

    #[error("Row {row} is outside the data region (first data row is {first})")]
    RowOutOfRange { row: RowIndex, first: RowIndex },

    #[error("Unknown metrics scope '{0}' (expected all, area or celula)")]
    InvalidScope(String),

    #[error("No team mapping loaded from the reference sheet")]
    NoTeamMapping,

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write error: {0}")]
    Write(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sheet_lists_every_sheet() {
        let err = LedgerError::MissingSheet(vec!["Datos".into(), "ProyectosTI".into()]);
        assert_eq!(err.to_string(), "Missing required sheets: Datos, ProyectosTI");
    }

    #[test]
    fn column_not_found_names_range() {
        let err = LedgerError::ColumnNotFound {
            header: "Gamma".into(),
            range: "R:BB".into(),
        };
        assert_eq!(err.to_string(), "Column 'Gamma' not found in R:BB");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        let err: LedgerError = io.into();
        assert!(matches!(err, LedgerError::Io(_)));
    }
}
