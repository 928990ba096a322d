//! Catalog loading from the reference sheet
//!
//! The reference sheet holds:
//! - flat value lists in fixed columns (status, priority, requester, area)
//! - a group/team pair of columns (which group a team rolls up into)
//! - a team/description-header pair located by header text
//! - a strategic-initiative column located by header text

use std::collections::BTreeSet;

use gdledger_core::{Catalogs, Column, GroupMap, LedgerLayout, ReferenceLayout, Result, TeamMap};
use gdledger_xlsx::{HeaderIndex, Sheet, Workbook};

/// Build the catalog snapshot, propagating any failure
pub fn load_catalogs(workbook: &Workbook, layout: &LedgerLayout) -> Result<Catalogs> {
    let sheet = workbook.require_sheet(&layout.reference_sheet)?;
    let reference = &layout.reference;
    let headers = sheet.header_index(reference.header_row);

    let team_map = load_team_map(sheet, &headers, reference);
    let group_map = load_group_map(sheet, reference);

    let initiatives = match headers.find(&reference.initiative_header) {
        Some(col) => sheet.unique_values(Column::new(col), reference.first_row),
        None => {
            tracing::debug!(header = %reference.initiative_header, "initiative column not found");
            Vec::new()
        }
    };

    let groups: Vec<String> = group_map
        .groups()
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let teams: Vec<String> = group_map
        .teams()
        .chain(team_map.teams())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let catalogs = Catalogs {
        statuses: sheet.unique_values(reference.status, reference.first_row),
        priorities: sheet.unique_values(reference.priority, reference.first_row),
        requesters: sheet.unique_values(reference.requester, reference.first_row),
        areas: sheet.unique_values(reference.area, reference.first_row),
        initiatives,
        groups,
        teams,
        team_map,
        group_map,
    };
    tracing::info!(
        teams = catalogs.team_map.len(),
        groups = catalogs.groups.len(),
        "catalogs loaded"
    );
    Ok(catalogs)
}

/// team → description header, from the header-located column pair.
///
/// Empty when either column is missing.
pub fn load_team_map(sheet: &Sheet, headers: &HeaderIndex, reference: &ReferenceLayout) -> TeamMap {
    let (Some(team_col), Some(desc_col)) = (
        headers.find(&reference.team_header),
        headers.find(&reference.description_header),
    ) else {
        tracing::warn!(
            sheet = sheet.name(),
            team_header = %reference.team_header,
            description_header = %reference.description_header,
            "dependency mapping columns not found"
        );
        return TeamMap::new();
    };

    read_pairs(sheet, Column::new(team_col), Column::new(desc_col), reference.first_row)
        .collect()
}

/// team → group, from the fixed group/team columns
pub fn load_group_map(sheet: &Sheet, reference: &ReferenceLayout) -> GroupMap {
    read_pairs(sheet, reference.team, reference.group, reference.first_row).collect()
}

/// (key, value) pairs of two columns, skipping rows missing either side
fn read_pairs(
    sheet: &Sheet,
    key_col: Column,
    value_col: Column,
    first_row: u32,
) -> impl Iterator<Item = (String, String)> + '_ {
    (first_row..=sheet.last_row()).filter_map(move |row| {
        let key = sheet.cell(row, key_col).trimmed()?;
        let value = sheet.cell(row, value_col).trimmed()?;
        Some((key, value))
    })
}
