//! Dependencies and their aggregates
//!
//! A dependency is a (team, flag, description) triple supplied by a caller.
//! Only two flags exist:
//!
//! - `P`: pending, the dependency still has to be negotiated
//! - `L`: negotiated ("liberada")
//!
//! Anything else is treated as "no dependency" and dropped on write, so
//! `Dependency` keeps the raw text and validation happens on use.

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Dependency flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "P")]
    Pending,
    #[serde(rename = "L")]
    Negotiated,
}

impl Flag {
    /// Parse a flag after trimming and upper-casing; exactly `P` or `L`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "P" => Some(Flag::Pending),
            "L" => Some(Flag::Negotiated),
            _ => None,
        }
    }

    /// Read a flag out of a worksheet cell
    pub fn from_cell(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Text(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Flag::Pending => "P",
            Flag::Negotiated => "L",
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A dependency as supplied by a caller, not yet validated
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub team: String,
    pub flag: String,
    #[serde(default)]
    pub description: String,
}

impl Dependency {
    pub fn new(
        team: impl Into<String>,
        flag: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            team: team.into(),
            flag: flag.into(),
            description: description.into(),
        }
    }

    /// Trimmed team, parsed flag and trimmed description, or `None` when the
    /// team is blank or the flag is not `P`/`L`.
    pub fn normalized(&self) -> Option<(&str, Flag, &str)> {
        let team = self.team.trim();
        if team.is_empty() {
            return None;
        }
        let flag = Flag::parse(&self.flag)?;
        Some((team, flag, self.description.trim()))
    }
}

/// Parses `TEAM:FLAG` or `TEAM:FLAG:DESCRIPTION`
impl std::str::FromStr for Dependency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let team = parts.next().unwrap_or_default();
        let flag = parts
            .next()
            .ok_or_else(|| format!("expected TEAM:FLAG[:DESCRIPTION], got '{}'", s))?;
        let description = parts.next().unwrap_or_default();
        Ok(Dependency::new(team, flag, description))
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Counts derived from a set of flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTotals {
    pub total: u32,
    pub negotiated: u32,
    pub pending: u32,
}

impl DependencyTotals {
    pub fn from_flags(flags: impl IntoIterator<Item = Flag>) -> Self {
        let mut totals = Self::default();
        for flag in flags {
            totals.add(flag);
        }
        totals
    }

    /// Count every entry with a non-blank team and a valid flag.
    ///
    /// Duplicated teams are counted once per occurrence.
    pub fn from_dependencies(deps: &[Dependency]) -> Self {
        Self::from_flags(deps.iter().filter_map(|d| d.normalized().map(|(_, f, _)| f)))
    }

    pub fn add(&mut self, flag: Flag) {
        self.total += 1;
        match flag {
            Flag::Pending => self.pending += 1,
            Flag::Negotiated => self.negotiated += 1,
        }
    }

    /// pending / total, `0.0` without dependencies
    pub fn coverage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.pending) / f64::from(self.total)
        }
    }

    /// Coverage scaled to a percentage
    pub fn pending_pct(&self) -> f64 {
        self.coverage() * 100.0
    }

    pub fn signal(&self) -> DependencySignal {
        classify_status(self.total, self.negotiated, self.pending)
    }
}

// ============================================================================
// Traffic light
// ============================================================================

/// Presentation classification of a row's dependencies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencySignal {
    /// No dependencies registered
    Off,
    /// All dependencies negotiated
    Green,
    /// All dependencies pending
    Red,
    /// A mix of negotiated and pending
    Yellow,
}

impl DependencySignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencySignal::Off => "off",
            DependencySignal::Green => "green",
            DependencySignal::Red => "red",
            DependencySignal::Yellow => "yellow",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            DependencySignal::Off => "#bdc3c7",
            DependencySignal::Green => "#2ecc71",
            DependencySignal::Red => "#e74c3c",
            DependencySignal::Yellow => "#f1c40f",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DependencySignal::Off => "No dependencies registered",
            DependencySignal::Green => "All dependencies negotiated (L)",
            DependencySignal::Red => "All dependencies pending (P)",
            DependencySignal::Yellow => "Mix of negotiated (L) and pending (P) dependencies",
        }
    }
}

impl std::fmt::Display for DependencySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a row from its counts. Recomputed on every call, never stored.
pub fn classify_status(total: u32, negotiated: u32, pending: u32) -> DependencySignal {
    if total == 0 {
        DependencySignal::Off
    } else if pending == 0 && negotiated > 0 {
        DependencySignal::Green
    } else if negotiated == 0 && pending > 0 {
        DependencySignal::Red
    } else {
        DependencySignal::Yellow
    }
}

// ============================================================================
// Tests
// ============================================================================
