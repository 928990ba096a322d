//! Scoped rollups over the ledger
//!
//! A scope selects which project rows take part:
//!
//! | scope    | aliases        | row included when                                      |
//! |----------|----------------|--------------------------------------------------------|
//! | all      |                | always                                                 |
//! | group    | `area`, `tren` | some team of the group has a valid flag on the row     |
//! | team     | `celula`       | the team's flag column holds a valid flag              |
//!
//! A scope with a blank filter behaves like `all`.

use std::fmt;

use gdledger_core::{
    Catalogs, ColIndex, Flag, LedgerError, LedgerLayout, Metrics, PercentConvention, Result,
};
use gdledger_xlsx::{HeaderIndex, Sheet, Workbook};

use crate::matrix::ledger_headers;

/// Which rows a metrics computation covers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MetricsScope {
    #[default]
    All,
    Group(String),
    Team(String),
}

impl MetricsScope {
    /// Build a scope from its name and optional filter.
    ///
    /// Scope names ignore case. A blank filter yields [`MetricsScope::All`]
    /// whatever the scope name, but an unknown name is still rejected.
    pub fn parse(scope: &str, filter: Option<&str>) -> Result<Self> {
        let kind = scope.trim().to_lowercase();
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());

        let known = matches!(
            kind.as_str(),
            "" | "all" | "area" | "group" | "tren" | "celula" | "team"
        );
        if !known {
            return Err(LedgerError::InvalidScope(scope.to_string()));
        }

        Ok(match (kind.as_str(), filter) {
            (_, None) | ("" | "all", _) => MetricsScope::All,
            ("area" | "group" | "tren", Some(f)) => MetricsScope::Group(f.to_string()),
            (_, Some(f)) => MetricsScope::Team(f.to_string()),
        })
    }
}

impl fmt::Display for MetricsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsScope::All => f.write_str("all"),
            MetricsScope::Group(g) => write!(f, "group '{}'", g),
            MetricsScope::Team(t) => write!(f, "team '{}'", t),
        }
    }
}

/// Flag columns a row must have a valid flag in to be counted
enum RowFilter {
    All,
    AnyFlag(Vec<ColIndex>),
}

impl RowFilter {
    fn resolve(
        scope: &MetricsScope,
        headers: &HeaderIndex,
        layout: &LedgerLayout,
        catalogs: &Catalogs,
    ) -> Self {
        match scope {
            MetricsScope::All => RowFilter::All,
            MetricsScope::Group(group) => {
                let cols = catalogs
                    .teams_in_group(group)
                    .filter_map(|team| headers.find_in(team, layout.flag_range))
                    .collect();
                RowFilter::AnyFlag(cols)
            }
            MetricsScope::Team(team) => {
                let col = headers.find_in(team, layout.flag_range);
                if col.is_none() {
                    tracing::warn!(team = %team, "no flag column for team, scope matches nothing");
                }
                RowFilter::AnyFlag(col.into_iter().collect())
            }
        }
    }

    fn matches(&self, sheet: &Sheet, row: u32) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::AnyFlag(cols) => cols
                .iter()
                .any(|&col| Flag::from_cell(sheet.get(row, col)).is_some()),
        }
    }
}

/// Running sums for one population of rows
#[derive(Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }
}

/// Aggregate the rows selected by `scope`.
///
/// Rows with an empty name are skipped. Dependency totals come from the
/// stored aggregate columns, not from the flags.
pub fn compute_metrics(
    workbook: &Workbook,
    layout: &LedgerLayout,
    convention: PercentConvention,
    scope: &MetricsScope,
    catalogs: &Catalogs,
) -> Result<Metrics> {
    let sheet = workbook.require_sheet(&layout.ledger_sheet)?;
    let headers = ledger_headers(sheet, layout);
    let filter = RowFilter::resolve(scope, &headers, layout, catalogs);

    let fields = &layout.fields;
    let agg = &layout.aggregates;
    let sentinel = layout.priority_sentinel.trim().to_uppercase();

    let mut metrics = Metrics::default();
    let mut all = Mean::default();
    let mut priority = Mean::default();
    let mut other = Mean::default();

    for row in layout.first_data_row..=sheet.last_row() {
        if sheet.cell(row, fields.name).is_empty() || !filter.matches(sheet, row) {
            continue;
        }

        metrics.total_projects += 1;
        metrics.total_dependencies += convention.coerce(sheet.cell(row, agg.total));
        metrics.total_negotiated += convention.coerce(sheet.cell(row, agg.negotiated));
        metrics.total_pending += convention.coerce(sheet.cell(row, agg.pending));

        let progress = convention.coerce(sheet.cell(row, fields.progress));
        all.push(progress);

        let is_priority = sheet
            .cell(row, fields.prioritized)
            .trimmed()
            .is_some_and(|v| v.to_uppercase() == sentinel);
        if is_priority {
            metrics.priority_count += 1;
            priority.push(progress);
        } else {
            other.push(progress);
        }
    }

    metrics.coverage_pct = if metrics.total_dependencies > 0.0 {
        metrics.total_pending / metrics.total_dependencies * 100.0
    } else {
        0.0
    };
    metrics.avg_progress = all.value();
    metrics.avg_priority_progress = priority.value();
    metrics.avg_non_priority_progress = other.value();

    tracing::debug!(scope = %scope, projects = metrics.total_projects, "metrics computed");
    Ok(metrics)
}
