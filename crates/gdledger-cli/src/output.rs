//! Text and JSON rendering of command results

use std::fmt::Write as _;

use anyhow::Result;
use gdledger_core::{
    Allocation, Catalogs, Lookup, Metrics, ProgressUpdate, ProjectSummary, TeamSummary,
};
use gdledger_engine::{LedgerConfig, MetricsScope};
use serde::Serialize;

use crate::Format;

pub struct Printer {
    format: Format,
}

impl Printer {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Format::Text => print!("{}", text()),
        }
        Ok(())
    }

    pub fn catalogs(&self, catalogs: &Catalogs) -> Result<()> {
        self.emit(catalogs, || render_catalogs(catalogs))
    }

    pub fn created(&self, name: &str, slot: &Allocation) -> Result<()> {
        self.emit(slot, || {
            format!("Created '{}' at row {} with ID {}\n", name, slot.row, slot.id)
        })
    }

    pub fn names(&self, names: &[String]) -> Result<()> {
        self.emit(&names, || names.iter().map(|n| format!("{}\n", n)).collect())
    }

    pub fn team(&self, lookup: &Lookup<TeamSummary>) -> Result<()> {
        self.emit(lookup, || match lookup {
            Lookup::Found(summary) => render_team(summary),
            Lookup::NotFound { message } => format!("{}\n", message),
        })
    }

    pub fn project(&self, lookup: &Lookup<ProjectSummary>) -> Result<()> {
        self.emit(lookup, || match lookup {
            Lookup::Found(summary) => render_project(summary),
            Lookup::NotFound { message } => format!("{}\n", message),
        })
    }

    pub fn updated(&self, row: u32, update: &ProgressUpdate) -> Result<()> {
        self.emit(update, || {
            format!(
                "Row {}: progress {:.2}, estimate {:.2}, completion {:.1}%, variance {:+.1} pp\n",
                row, update.progress, update.estimate, update.completion_pct, update.variance_pp
            )
        })
    }

    pub fn metrics(&self, scope: &MetricsScope, metrics: &Metrics) -> Result<()> {
        self.emit(metrics, || render_metrics(scope, metrics))
    }

    pub fn paths(&self, config: &LedgerConfig) -> Result<()> {
        self.emit(config, || format!("{}\n", config.describe_active_paths()))
    }
}

fn render_catalogs(catalogs: &Catalogs) -> String {
    let mut out = String::new();
    for (label, values) in [
        ("Statuses", &catalogs.statuses),
        ("Priorities", &catalogs.priorities),
        ("Requesters", &catalogs.requesters),
        ("Areas", &catalogs.areas),
        ("Initiatives", &catalogs.initiatives),
        ("Groups", &catalogs.groups),
        ("Teams", &catalogs.teams),
    ] {
        let _ = writeln!(out, "{}: {}", label, values.join(", "));
    }
    let _ = writeln!(out, "Dependency mapping:");
    for (team, header) in catalogs.team_map.iter() {
        let group = catalogs.group_map.group_of(team).unwrap_or("-");
        let _ = writeln!(out, "  {} [{}] -> {}", team, group, header);
    }
    out
}

fn render_team(summary: &TeamSummary) -> String {
    let mut out = format!(
        "{}: {} projects, {} pending, {} negotiated ({:.1}% pending)\n",
        summary.team, summary.total, summary.pending, summary.negotiated, summary.pending_pct
    );
    for row in &summary.rows {
        // CellValue's Display does not pad
        let quarter = row.quarter.to_string();
        let _ = writeln!(out, "  row {:>4}  {:<4} {}  [{}]", row.row, quarter, row.project, row.flag);
    }
    out
}

fn render_project(summary: &ProjectSummary) -> String {
    let signal = summary.signal;
    let mut out = format!(
        "{} (row {}, {})\n  {} dependencies, {} pending, {} negotiated: {} ({})\n",
        summary.project,
        summary.row,
        summary.quarter,
        summary.total,
        summary.pending,
        summary.negotiated,
        signal.description(),
        signal.color(),
    );
    let _ = writeln!(
        out,
        "  baseline {:.2}, progress {:.2}, estimate {:.2}",
        summary.baseline, summary.progress, summary.estimate
    );
    for detail in &summary.details {
        if detail.description.is_empty() {
            let _ = writeln!(out, "  {} [{}]", detail.team, detail.flag);
        } else {
            let _ = writeln!(out, "  {} [{}] {}", detail.team, detail.flag, detail.description);
        }
    }
    if summary.has_drift() {
        let stored = &summary.stored;
        let _ = writeln!(
            out,
            "  stored aggregates differ: total {}, negotiated {}, pending {}, coverage {:.2}",
            stored.total, stored.negotiated, stored.pending, stored.coverage
        );
    }
    out
}

fn render_metrics(scope: &MetricsScope, m: &Metrics) -> String {
    format!(
        "Scope: {}\n\
         Projects: {} ({} priority)\n\
         Dependencies: {} ({} pending, {} negotiated, {:.1}% pending)\n\
         Average progress: {:.2} (priority {:.2}, other {:.2})\n",
        scope,
        m.total_projects,
        m.priority_count,
        m.total_dependencies,
        m.total_pending,
        m.total_negotiated,
        m.coverage_pct,
        m.avg_progress,
        m.avg_priority_progress,
        m.avg_non_priority_progress,
    )
}
