//! Ledger configuration
//!
//! Loaded from an optional TOML file. Every key has a default matching the
//! stock workbook, so an empty file (or no file at all) is valid:
//!
//! ```toml
//! workbook = "shared/GD_v1.xlsx"
//! percent_convention = "fraction"
//!
//! [layout]
//! header_row = 9
//! first_data_row = 10
//! flag_range = "R:BB"
//! ```

use std::path::{Path, PathBuf};

use gdledger_core::{LedgerLayout, PercentConvention};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the workbook path
pub const WORKBOOK_ENV: &str = "GD_EXCEL_PATH";

/// Workbook used when nothing else is configured
pub const DEFAULT_WORKBOOK: &str = "GD_v1.xlsx";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub workbook: PathBuf,
    pub percent_convention: PercentConvention,
    pub layout: LedgerLayout,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            percent_convention: PercentConvention::default(),
            layout: LedgerLayout::default(),
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Override the workbook path
    pub fn with_workbook(mut self, path: impl Into<PathBuf>) -> Self {
        self.workbook = path.into();
        self
    }

    pub fn with_percent_convention(mut self, convention: PercentConvention) -> Self {
        self.percent_convention = convention;
        self
    }

    /// Human-readable summary of where data is read from and written to
    pub fn describe_active_paths(&self) -> String {
        let layout = &self.layout;
        format!(
            "workbook: {}\n\
             ledger sheet: {} (header row {}, data from row {})\n\
             reference sheet: {}\n\
             flag columns: {}\n\
             description columns: {}\n\
             percent convention: {:?}",
            self.workbook.display(),
            layout.ledger_sheet,
            layout.header_row,
            layout.first_data_row,
            layout.reference_sheet,
            layout.flag_range,
            layout.description_range,
            self.percent_convention,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdledger_core::{Column, ColumnRange};
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(LedgerConfig::from_toml_str("").unwrap(), LedgerConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = LedgerConfig::from_toml_str(
            r#"
            workbook = "shared/GD.xlsx"
            percent_convention = "fraction"

            [layout]
            first_data_row = 14
            flag_range = "R:Z"
            "#,
        )
        .unwrap();
        assert_eq!(config.workbook, PathBuf::from("shared/GD.xlsx"));
        assert_eq!(config.percent_convention, PercentConvention::Fraction);
        assert_eq!(config.layout.first_data_row, 14);
        assert_eq!(config.layout.header_row, 11);
        assert_eq!(
            config.layout.flag_range,
            ColumnRange::new(Column::new(18), Column::new(26))
        );
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = LedgerConfig::from_toml_str("workbook = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = LedgerConfig::load("/no/such/gdledger.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn active_paths_mention_workbook_and_sheets() {
        let text = LedgerConfig::default()
            .with_workbook("/data/GD_v1.xlsx")
            .describe_active_paths();
        assert!(text.contains("workbook: /data/GD_v1.xlsx"));
        assert!(text.contains("ledger sheet: ProyectosTI (header row 11, data from row 12)"));
        assert!(text.contains("flag columns: R:BB"));
    }
}
