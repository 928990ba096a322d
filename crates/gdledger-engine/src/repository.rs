//! Project rows: creation, listing, cross-sections and progress updates
//!
//! These functions work on an in-memory [`Workbook`]; loading and saving is
//! left to [`crate::Ledger`], which wraps each call in a transaction.

use std::collections::BTreeSet;

use gdledger_core::{
    Allocation, Column, Dependency, DependencyTotals, Flag, LedgerError, LedgerLayout,
    Lookup, NewProject, PercentConvention, ProgressUpdate, ProjectSummary, Result, RowIndex,
    StoredAggregates, TeamMap, TeamRow, TeamSummary,
};
use gdledger_xlsx::Workbook;

use crate::matrix::{apply_dependencies, ledger_headers, read_dependencies};

// ============================================================================
// Mutations
// ============================================================================

/// Append a project at the next free row and write its dependency matrix.
///
/// Returns the row and identifier handed out.
pub fn insert_project(
    workbook: &mut Workbook,
    layout: &LedgerLayout,
    project: &NewProject,
    deps: &[Dependency],
    team_map: &TeamMap,
) -> Result<Allocation> {
    let sheet = workbook.require_sheet_mut(&layout.ledger_sheet)?;
    let headers = ledger_headers(sheet, layout);

    let allocation = sheet.allocate_next_row_and_id(layout.fields.id, layout.first_data_row);
    sheet.set_cell(allocation.row, layout.fields.id, allocation.id);
    for (col, value) in project.cells(&layout.fields) {
        sheet.set_cell(allocation.row, col, value);
    }
    apply_dependencies(sheet, &headers, layout, allocation.row, deps, team_map);

    tracing::info!(
        row = allocation.row,
        id = allocation.id,
        project = %project.name,
        dependencies = deps.len(),
        "project created"
    );
    Ok(allocation)
}

/// Changes applied to an existing project row
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowUpdate {
    /// New progress; `None` keeps the stored value
    pub progress: Option<f64>,
    /// New estimate; `None` keeps the stored value
    pub estimate: Option<f64>,
    /// Replacement dependency list
    pub dependencies: Vec<Dependency>,
}

impl RowUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn estimate(mut self, estimate: f64) -> Self {
        self.estimate = Some(estimate);
        self
    }

    pub fn dependencies(mut self, deps: Vec<Dependency>) -> Self {
        self.dependencies = deps;
        self
    }
}

/// Overwrite progress and estimate of `row`, recompute completion and
/// rewrite the dependency matrix.
///
/// Completion is `progress / estimate` when the estimate is positive and `0`
/// otherwise.
pub fn update_row(
    workbook: &mut Workbook,
    layout: &LedgerLayout,
    convention: PercentConvention,
    row: RowIndex,
    changes: &RowUpdate,
    team_map: &TeamMap,
) -> Result<ProgressUpdate> {
    if row < layout.first_data_row {
        return Err(LedgerError::RowOutOfRange {
            row,
            first: layout.first_data_row,
        });
    }

    let sheet = workbook.require_sheet_mut(&layout.ledger_sheet)?;
    let headers = ledger_headers(sheet, layout);
    let fields = &layout.fields;

    let baseline = convention.coerce(sheet.cell(row, fields.baseline));
    let progress = changes
        .progress
        .unwrap_or_else(|| convention.coerce(sheet.cell(row, fields.progress)));
    let estimate = changes
        .estimate
        .unwrap_or_else(|| convention.coerce(sheet.cell(row, fields.estimated_progress)));
    let completion = if estimate > 0.0 { progress / estimate } else { 0.0 };

    sheet.set_cell(row, fields.progress, progress);
    sheet.set_cell(row, fields.estimated_progress, estimate);
    sheet.set_cell(row, fields.completion, completion);
    apply_dependencies(sheet, &headers, layout, row, &changes.dependencies, team_map);

    let update = ProgressUpdate {
        baseline,
        progress,
        estimate,
        completion_pct: completion * 100.0,
        variance_pp: (progress - baseline) * 100.0,
    };
    tracing::info!(row, completion_pct = update.completion_pct, "project row updated");
    Ok(update)
}

// ============================================================================
// Queries
// ============================================================================

/// Distinct trimmed project names, sorted.
///
/// A non-blank `filter` keeps names containing it, ignoring case.
pub fn project_names(
    workbook: &Workbook,
    layout: &LedgerLayout,
    filter: Option<&str>,
) -> Result<Vec<String>> {
    let sheet = workbook.require_sheet(&layout.ledger_sheet)?;
    let needle = filter
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty());

    let names: BTreeSet<String> = sheet
        .column(layout.fields.name, layout.first_data_row)
        .filter_map(|(_, v)| v.trimmed())
        .filter(|name| match &needle {
            Some(q) => name.to_lowercase().contains(q.as_str()),
            None => true,
        })
        .collect();
    Ok(names.into_iter().collect())
}

/// Every project row carrying a valid flag for `team`.
///
/// A team without a flag column yields [`Lookup::NotFound`].
pub fn team_summary(
    workbook: &Workbook,
    layout: &LedgerLayout,
    team: &str,
) -> Result<Lookup<TeamSummary>> {
    let sheet = workbook.require_sheet(&layout.ledger_sheet)?;
    let headers = ledger_headers(sheet, layout);
    let col = match headers.require_in(team, layout.flag_range) {
        Ok(col) => Column::new(col),
        Err(e) => return Ok(Lookup::not_found(e.to_string())),
    };

    let rows: Vec<TeamRow> = sheet
        .column(col, layout.first_data_row)
        .filter_map(|(row, value)| {
            let flag = Flag::from_cell(value)?;
            Some(TeamRow {
                row,
                quarter: sheet.cell(row, layout.fields.quarter).clone(),
                project: sheet.cell(row, layout.fields.name).clone(),
                flag,
            })
        })
        .collect();

    let totals = DependencyTotals::from_flags(rows.iter().map(|r| r.flag));
    Ok(Lookup::Found(TeamSummary {
        team: team.to_string(),
        total: totals.total,
        pending: totals.pending,
        negotiated: totals.negotiated,
        pending_pct: totals.pending_pct(),
        rows,
    }))
}

/// Dependencies of the first row whose trimmed name equals `name`.
pub fn project_summary(
    workbook: &Workbook,
    layout: &LedgerLayout,
    convention: PercentConvention,
    name: &str,
    team_map: &TeamMap,
) -> Result<Lookup<ProjectSummary>> {
    let sheet = workbook.require_sheet(&layout.ledger_sheet)?;

    let found = sheet
        .column(layout.fields.name, layout.first_data_row)
        .find(|(_, v)| v.trimmed().as_deref() == Some(name));
    let Some((row, _)) = found else {
        return Ok(Lookup::not_found(format!("Project '{}' not found", name)));
    };

    let headers = ledger_headers(sheet, layout);
    let details = read_dependencies(sheet, &headers, layout, row, team_map);
    let totals = DependencyTotals::from_flags(details.iter().map(|d| d.flag));

    let fields = &layout.fields;
    let agg = &layout.aggregates;
    let num = |col: Column| convention.coerce(sheet.cell(row, col));

    Ok(Lookup::Found(ProjectSummary {
        row,
        project: name.to_string(),
        quarter: sheet.cell(row, fields.quarter).clone(),
        total: totals.total,
        pending: totals.pending,
        negotiated: totals.negotiated,
        pending_pct: totals.pending_pct(),
        signal: totals.signal(),
        details,
        baseline: num(fields.baseline),
        progress: num(fields.progress),
        estimate: num(fields.estimated_progress),
        stored: StoredAggregates {
            total: num(agg.total),
            negotiated: num(agg.negotiated),
            pending: num(agg.pending),
            coverage: num(agg.coverage),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdledger_core::{CellValue, DependencySignal};
    use gdledger_xlsx::Sheet;
    use pretty_assertions::assert_eq;

    fn col(letters: &str) -> Column {
        Column::parse(letters).unwrap()
    }

    fn workbook() -> Workbook {
        let mut ledger = Sheet::new("ProyectosTI");
        ledger.set(11, 1, "ID");
        ledger.set(11, 5, "Proyecto TI");
        ledger.set_cell(11, col("R"), "Alpha");
        ledger.set_cell(11, col("S"), "Beta");
        ledger.set_cell(11, col("BC"), "Desc Alpha");
        ledger.set_cell(11, col("BD"), "Desc Beta");

        let mut wb = Workbook::new();
        wb.push_sheet(ledger);
        wb.push_sheet(Sheet::new("Datos"));
        wb
    }

    fn team_map() -> TeamMap {
        [("Alpha", "Desc Alpha"), ("Beta", "Desc Beta")]
            .into_iter()
            .collect()
    }

    fn create(wb: &mut Workbook, name: &str, deps: &[Dependency]) -> Allocation {
        let project = NewProject::new(name).quarter("Q1").baseline(0.2).progress(0.3);
        insert_project(wb, &LedgerLayout::default(), &project, deps, &team_map()).unwrap()
    }

    #[test]
    fn insert_writes_fields_and_matrix() {
        let mut wb = workbook();
        let alloc = create(&mut wb, "CRM", &[Dependency::new("Alpha", "P", "api")]);
        assert_eq!(alloc, Allocation { row: 12, id: 1 });

        let sheet = wb.require_sheet("ProyectosTI").unwrap();
        assert_eq!(sheet.cell(12, col("A")), &CellValue::Number(1.0));
        assert_eq!(sheet.cell(12, col("E")), &CellValue::from("CRM"));
        assert_eq!(sheet.cell(12, col("B")), &CellValue::from("Q1"));
        assert_eq!(sheet.cell(12, col("R")), &CellValue::from("P"));
        assert_eq!(sheet.cell(12, col("BC")), &CellValue::from("api"));
        assert_eq!(sheet.cell(12, col("CN")), &CellValue::Number(1.0));
    }

    #[test]
    fn consecutive_inserts_get_consecutive_rows() {
        let mut wb = workbook();
        create(&mut wb, "A", &[]);
        let second = create(&mut wb, "B", &[]);
        assert_eq!(second, Allocation { row: 13, id: 2 });
    }

    #[test]
    fn names_are_distinct_sorted_and_filtered() {
        let mut wb = workbook();
        for name in ["Portal", " CRM ", "crm reports", "Portal"] {
            create(&mut wb, name, &[]);
        }
        let layout = LedgerLayout::default();
        assert_eq!(
            project_names(&wb, &layout, None).unwrap(),
            vec!["CRM", "Portal", "crm reports"]
        );
        assert_eq!(
            project_names(&wb, &layout, Some(" Crm")).unwrap(),
            vec!["CRM", "crm reports"]
        );
        assert_eq!(project_names(&wb, &layout, Some("  ")).unwrap().len(), 3);
    }

    #[test]
    fn team_summary_counts_flags() {
        let mut wb = workbook();
        create(&mut wb, "A", &[Dependency::new("Beta", "P", "")]);
        create(&mut wb, "B", &[Dependency::new("Beta", "L", "")]);
        create(&mut wb, "C", &[Dependency::new("Alpha", "P", "")]);

        let summary = team_summary(&wb, &LedgerLayout::default(), "beta")
            .unwrap()
            .found()
            .unwrap();
        assert_eq!((summary.total, summary.pending, summary.negotiated), (2, 1, 1));
        assert_eq!(summary.pending_pct, 50.0);
        assert_eq!(summary.rows.iter().map(|r| r.row).collect::<Vec<_>>(), vec![12, 13]);
        assert_eq!(summary.rows[0].project, CellValue::from("A"));
        assert_eq!(summary.rows[0].quarter, CellValue::from("Q1"));
    }

    #[test]
    fn team_summary_for_unknown_team() {
        let wb = workbook();
        match team_summary(&wb, &LedgerLayout::default(), "Gamma").unwrap() {
            Lookup::NotFound { message } => {
                assert_eq!(message, "Column 'Gamma' not found in R:BB")
            }
            Lookup::Found(_) => panic!("Gamma has no column"),
        }
    }

    #[test]
    fn project_summary_reports_live_and_stored() {
        let mut wb = workbook();
        create(
            &mut wb,
            "CRM",
            &[Dependency::new("Beta", "L", "done"), Dependency::new("Alpha", "P", "")],
        );
        let summary = project_summary(
            &wb,
            &LedgerLayout::default(),
            PercentConvention::Strip,
            "CRM",
            &team_map(),
        )
        .unwrap()
        .found()
        .unwrap();

        assert_eq!(summary.row, 12);
        assert_eq!(summary.details.iter().map(|d| d.team.as_str()).collect::<Vec<_>>(), vec!["Alpha", "Beta"]);
        assert_eq!(summary.details[1].description, "done");
        assert_eq!(summary.signal, DependencySignal::Yellow);
        assert_eq!(summary.baseline, 0.2);
        assert_eq!(summary.stored.total, 2.0);
        assert!(!summary.has_drift());
    }

    #[test]
    fn project_summary_requires_exact_name() {
        let mut wb = workbook();
        create(&mut wb, "CRM", &[]);
        let lookup = project_summary(
            &wb,
            &LedgerLayout::default(),
            PercentConvention::Strip,
            "crm",
            &team_map(),
        )
        .unwrap();
        assert_eq!(lookup, Lookup::not_found("Project 'crm' not found"));
    }

    #[test]
    fn update_uses_stored_estimate() {
        let mut wb = workbook();
        let alloc = create(&mut wb, "CRM", &[]);
        let layout = LedgerLayout::default();
        wb.require_sheet_mut("ProyectosTI")
            .unwrap()
            .set_cell(alloc.row, layout.fields.estimated_progress, 0.8);

        let update = update_row(
            &mut wb,
            &layout,
            PercentConvention::Strip,
            alloc.row,
            &RowUpdate::new().progress(0.5),
            &team_map(),
        )
        .unwrap();
        assert!((update.completion_pct - 62.5).abs() < 1e-9);
        assert!((update.variance_pp - 30.0).abs() < 1e-9);

        let sheet = wb.require_sheet("ProyectosTI").unwrap();
        assert_eq!(sheet.cell(alloc.row, col("M")), &CellValue::Number(0.5));
        assert_eq!(sheet.cell(alloc.row, col("N")), &CellValue::Number(0.8));
    }

    #[test]
    fn update_without_estimate_gives_zero_completion() {
        let mut wb = workbook();
        let alloc = create(&mut wb, "CRM", &[]);
        let update = update_row(
            &mut wb,
            &LedgerLayout::default(),
            PercentConvention::Strip,
            alloc.row,
            &RowUpdate::new(),
            &team_map(),
        )
        .unwrap();
        assert_eq!(update.completion_pct, 0.0);
        assert_eq!(update.progress, 0.3);
    }

    #[test]
    fn update_rejects_header_rows() {
        let mut wb = workbook();
        let err = update_row(
            &mut wb,
            &LedgerLayout::default(),
            PercentConvention::Strip,
            11,
            &RowUpdate::new().progress(0.1),
            &team_map(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::RowOutOfRange { row: 11, first: 12 }));
    }
}
