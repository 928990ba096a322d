//! Report types returned by ledger operations

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dependency::{DependencySignal, DependencyTotals, Flag};
use crate::value::CellValue;
use crate::RowIndex;

/// Result of a lookup by name
///
/// A missing project or team is an expected outcome the caller branches on,
/// not an error.
///
/// Serialized flat with a boolean `found` key: the payload's fields next to
/// `"found": true`, or `{"found": false, "message": ...}`.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound { message: String },
}

#[derive(Serialize)]
struct FoundRepr<'a, T> {
    found: bool,
    #[serde(flatten)]
    value: &'a T,
}

#[derive(Serialize)]
struct NotFoundRepr<'a> {
    found: bool,
    message: &'a str,
}

#[derive(Deserialize)]
struct TaggedRepr<T> {
    found: bool,
    #[serde(flatten)]
    body: BodyRepr<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BodyRepr<T> {
    NotFound { message: String },
    Found(T),
}

impl<T: Serialize> Serialize for Lookup<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Lookup::Found(value) => FoundRepr { found: true, value }.serialize(serializer),
            Lookup::NotFound { message } => NotFoundRepr {
                found: false,
                message,
            }
            .serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Lookup<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tagged = TaggedRepr::<T>::deserialize(deserializer)?;
        match (tagged.found, tagged.body) {
            (true, BodyRepr::Found(value)) => Ok(Lookup::Found(value)),
            (false, BodyRepr::NotFound { message }) => Ok(Lookup::NotFound { message }),
            (found, _) => Err(D::Error::custom(format!(
                "lookup body does not match found = {}",
                found
            ))),
        }
    }
}

impl<T> Lookup<T> {
    pub fn not_found(message: impl Into<String>) -> Self {
        Lookup::NotFound {
            message: message.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(t) => Some(t),
            Lookup::NotFound { .. } => None,
        }
    }
}

/// Row and identifier handed out to a new project
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub row: RowIndex,
    pub id: u64,
}

// ============================================================================
// Team cross-section
// ============================================================================

/// A project row that references a team
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamRow {
    pub row: RowIndex,
    /// Priority quarter label as stored
    pub quarter: CellValue,
    pub project: CellValue,
    pub flag: Flag,
}

/// All projects referencing one team
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team: String,
    pub total: u32,
    pub pending: u32,
    pub negotiated: u32,
    pub pending_pct: f64,
    pub rows: Vec<TeamRow>,
}

// ============================================================================
// Project cross-section
// ============================================================================

/// One team's entry on a project row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDetail {
    pub team: String,
    pub flag: Flag,
    pub description: String,
}

/// Aggregate columns as stored in the workbook
///
/// Exposed next to the live counts so a caller can spot drift between the
/// stored values and the flags actually present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredAggregates {
    pub total: f64,
    pub negotiated: f64,
    pub pending: f64,
    pub coverage: f64,
}

/// All teams referenced by one project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub row: RowIndex,
    pub project: String,
    pub quarter: CellValue,
    pub total: u32,
    pub pending: u32,
    pub negotiated: u32,
    pub pending_pct: f64,
    pub signal: DependencySignal,
    pub details: Vec<DependencyDetail>,
    pub baseline: f64,
    pub progress: f64,
    pub estimate: f64,
    pub stored: StoredAggregates,
}

impl ProjectSummary {
    pub fn totals(&self) -> DependencyTotals {
        DependencyTotals {
            total: self.total,
            negotiated: self.negotiated,
            pending: self.pending,
        }
    }

    /// True when the stored aggregate columns disagree with the live flags
    pub fn has_drift(&self) -> bool {
        let live = self.totals();
        self.stored.total != f64::from(live.total)
            || self.stored.negotiated != f64::from(live.negotiated)
            || self.stored.pending != f64::from(live.pending)
            || (self.stored.coverage - live.coverage()).abs() > 1e-9
    }
}

/// Values written back by a row update, percentages scaled ×100
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub baseline: f64,
    pub progress: f64,
    pub estimate: f64,
    /// progress / estimate × 100, `0.0` without an estimate
    pub completion_pct: f64,
    /// (progress − baseline) × 100, in percentage points
    pub variance_pp: f64,
}

// ============================================================================
// Metrics
// ============================================================================

/// Scoped rollup over the ledger
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_projects: u32,
    pub total_dependencies: f64,
    pub total_negotiated: f64,
    pub total_pending: f64,
    /// total_pending / total_dependencies × 100
    pub coverage_pct: f64,
    pub avg_progress: f64,
    pub avg_priority_progress: f64,
    pub avg_non_priority_progress: f64,
    pub priority_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(stored: StoredAggregates) -> ProjectSummary {
        ProjectSummary {
            row: 12,
            project: "CRM".into(),
            quarter: CellValue::from("Q1"),
            total: 2,
            pending: 1,
            negotiated: 1,
            pending_pct: 50.0,
            signal: DependencySignal::Yellow,
            details: Vec::new(),
            baseline: 0.0,
            progress: 0.0,
            estimate: 0.0,
            stored,
        }
    }

    #[test]
    fn drift_detection() {
        let in_sync = StoredAggregates { total: 2.0, negotiated: 1.0, pending: 1.0, coverage: 0.5 };
        assert!(!summary(in_sync).has_drift());

        let stale = StoredAggregates { total: 3.0, ..in_sync };
        assert!(summary(stale).has_drift());
    }

    #[test]
    fn lookup_serializes_found_tag() {
        let found: Lookup<Allocation> = Lookup::Found(Allocation { row: 12, id: 1 });
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["found"], serde_json::Value::Bool(true));
        assert_eq!(json["row"], 12);

        let missing: Lookup<Allocation> = Lookup::not_found("nope");
        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["found"], serde_json::Value::Bool(false));
        assert_eq!(json["message"], "nope");
        assert!(!missing.is_found());
    }

    #[test]
    fn lookup_reads_back_by_found_flag() {
        let found: Lookup<Allocation> =
            serde_json::from_str(r#"{"found": true, "row": 12, "id": 1}"#).unwrap();
        assert_eq!(found, Lookup::Found(Allocation { row: 12, id: 1 }));

        let missing: Lookup<Allocation> =
            serde_json::from_str(r#"{"found": false, "message": "nope"}"#).unwrap();
        assert_eq!(missing, Lookup::not_found("nope"));

        let mismatched =
            serde_json::from_str::<Lookup<Allocation>>(r#"{"found": true, "message": "x"}"#);
        assert!(mismatched.is_err());
    }
}
