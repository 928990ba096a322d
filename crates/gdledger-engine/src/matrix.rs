//! Dependency matrix engine
//!
//! Each project row carries one flag column per team (`P` pending, `L`
//! negotiated) and one free-text description column per team. Columns are
//! located by matching header text inside the layout's flag and description
//! ranges, so teams can be reordered in the workbook without touching code.
//!
//! Writes replace a row's matrix wholesale: every mapped team's cells are
//! cleared first, then the supplied dependencies are written, then the
//! aggregate columns are recomputed from the supplied list.

use gdledger_core::{
    CellValue, Dependency, DependencyDetail, DependencyTotals, Flag, LedgerLayout, RowIndex,
    TeamMap,
};
use gdledger_xlsx::{HeaderIndex, Sheet};

/// Header lookup for the ledger sheet, detecting the header row first
pub fn ledger_headers(sheet: &Sheet, layout: &LedgerLayout) -> HeaderIndex {
    let header_row = sheet.resolve_header_row(layout);
    sheet.header_index(header_row)
}

/// Replace the dependency matrix of `row` and refresh its aggregates.
///
/// Dependencies with a blank team or an invalid flag are skipped. A team with
/// no flag column is logged and skipped; its entry still counts toward the
/// aggregates. Descriptions are only written for teams present in
/// `team_map`. Duplicated teams resolve last-write-wins.
pub fn apply_dependencies(
    sheet: &mut Sheet,
    headers: &HeaderIndex,
    layout: &LedgerLayout,
    row: RowIndex,
    deps: &[Dependency],
    team_map: &TeamMap,
) -> DependencyTotals {
    clear_row(sheet, headers, layout, row, team_map);

    for dep in deps {
        let Some((team, flag, text)) = dep.normalized() else {
            tracing::debug!(row, team = %dep.team, flag = %dep.flag, "skipping invalid dependency");
            continue;
        };

        match headers.find_in(team, layout.flag_range) {
            Some(col) => sheet.set(row, col, flag.code()),
            None => tracing::warn!(row, team, "no flag column for team"),
        }

        if text.is_empty() {
            continue;
        }
        let desc_col = team_map
            .description_header(team)
            .filter(|h| !h.trim().is_empty())
            .and_then(|h| headers.find_in(h, layout.description_range));
        if let Some(col) = desc_col {
            sheet.set(row, col, text);
        }
    }

    let totals = DependencyTotals::from_dependencies(deps);
    write_aggregates(sheet, layout, row, &totals);
    tracing::debug!(row, total = totals.total, pending = totals.pending, "dependency matrix written");
    totals
}

/// Clear the flag and description cells of every mapped team on `row`
fn clear_row(
    sheet: &mut Sheet,
    headers: &HeaderIndex,
    layout: &LedgerLayout,
    row: RowIndex,
    team_map: &TeamMap,
) {
    for (team, desc_header) in team_map.iter() {
        if let Some(col) = headers.find_in(team, layout.flag_range) {
            sheet.clear(row, col);
        }
        if desc_header.trim().is_empty() {
            continue;
        }
        if let Some(col) = headers.find_in(desc_header, layout.description_range) {
            sheet.clear(row, col);
        }
    }
}

/// Write total, negotiated, pending and coverage to the aggregate columns
pub fn write_aggregates(
    sheet: &mut Sheet,
    layout: &LedgerLayout,
    row: RowIndex,
    totals: &DependencyTotals,
) {
    let agg = &layout.aggregates;
    sheet.set_cell(row, agg.total, f64::from(totals.total));
    sheet.set_cell(row, agg.negotiated, f64::from(totals.negotiated));
    sheet.set_cell(row, agg.pending, f64::from(totals.pending));
    sheet.set_cell(row, agg.coverage, totals.coverage());
}

/// Read the valid flags of `row`, in team-map order
pub fn read_dependencies(
    sheet: &Sheet,
    headers: &HeaderIndex,
    layout: &LedgerLayout,
    row: RowIndex,
    team_map: &TeamMap,
) -> Vec<DependencyDetail> {
    team_map
        .iter()
        .filter_map(|(team, desc_header)| {
            let col = headers.find_in(team, layout.flag_range)?;
            let flag = Flag::from_cell(sheet.get(row, col))?;
            let description = headers
                .find_in(desc_header, layout.description_range)
                .map(|c| sheet.get(row, c))
                .filter(|v| !v.is_empty())
                .map(CellValue::to_string)
                .unwrap_or_default();
            Some(DependencyDetail {
                team: team.to_string(),
                flag,
                description,
            })
        })
        .collect()
}
