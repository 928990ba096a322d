//! Cell values and numeric coercion
//!
//! The same logical percentage can be stored as a literal fraction (`0.45`),
//! a percent-formatted number, or a locale-formatted string (`"45%"`,
//! `"0,45"`). `coerce_numeric` maps all of them onto `f64` with a fixed
//! fallback chain:
//!
//! 1. empty → `0.0`
//! 2. number → itself
//! 3. text → trim, strip `%`, replace `,` with `.`, parse, else `0.0`
//!
//! Whether a stripped percent sign also divides by 100 is a
//! [`PercentConvention`].

use serde::{Deserialize, Serialize};

/// A single worksheet value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// True for a missing cell or an empty string.
    ///
    /// Whitespace-only text is *not* empty; callers that care trim first.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Stringified and trimmed, `None` when nothing is left
    pub fn trimmed(&self) -> Option<String> {
        if matches!(self, CellValue::Empty) {
            return None;
        }
        let s = self.to_string();
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            // Integers print without a trailing ".0"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<u64> for CellValue {
    fn from(n: u64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Empty, Into::into)
    }
}

// ============================================================================
// Coercion
// ============================================================================

/// How a percent sign in text is interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentConvention {
    /// `"45%"` → `45.0`: the sign is dropped, the number is kept as written
    #[default]
    Strip,
    /// `"45%"` → `0.45`: text carrying a percent sign is divided by 100
    Fraction,
}

impl PercentConvention {
    pub fn coerce(self, value: &CellValue) -> f64 {
        match value {
            CellValue::Empty => 0.0,
            CellValue::Number(n) => *n,
            CellValue::Bool(b) => f64::from(u8::from(*b)),
            CellValue::Text(s) => self.coerce_text(s),
        }
    }

    fn coerce_text(self, raw: &str) -> f64 {
        let s = raw.trim();
        if s.is_empty() {
            return 0.0;
        }
        let had_percent = s.contains('%');
        let cleaned = s.replace('%', "").replace(',', ".");
        let parsed = match cleaned.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => n,
            _ => return 0.0,
        };
        match self {
            PercentConvention::Fraction if had_percent => parsed / 100.0,
            _ => parsed,
        }
    }
}

/// Coerce a cell to a number using the default [`PercentConvention::Strip`].
pub fn coerce_numeric(value: &CellValue) -> f64 {
    PercentConvention::Strip.coerce(value)
}

// ============================================================================
// Tests
// ============================================================================
