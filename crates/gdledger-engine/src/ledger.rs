//! File-backed ledger handle
//!
//! Every operation reloads the workbook from disk. Mutations run as a single
//! transaction (load, mutate in memory, save) while holding an exclusive
//! writer gate, so writers within one process never interleave. The gate does
//! not extend across processes: two processes saving the same file can still
//! lose an update.

use std::path::{Path, PathBuf};

use gdledger_core::{
    Allocation, Catalogs, Dependency, LedgerLayout, Lookup, Metrics, NewProject,
    PercentConvention, ProgressUpdate, ProjectSummary, Result, RowIndex, TeamSummary,
};
use gdledger_xlsx::Workbook;
use parking_lot::Mutex;

use crate::config::LedgerConfig;
use crate::metrics::{compute_metrics, MetricsScope};
use crate::repository::{self, RowUpdate};

pub struct Ledger {
    path: PathBuf,
    layout: LedgerLayout,
    convention: PercentConvention,
    write_gate: Mutex<()>,
}

impl Ledger {
    /// Handle on the workbook at `path`. The file is not touched until the
    /// first operation.
    pub fn new(path: impl Into<PathBuf>, layout: LedgerLayout) -> Result<Self> {
        layout.validate()?;
        Ok(Self {
            path: path.into(),
            layout,
            convention: PercentConvention::default(),
            write_gate: Mutex::new(()),
        })
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Ok(Self::new(config.workbook.clone(), config.layout.clone())?
            .with_convention(config.percent_convention))
    }

    pub fn with_convention(mut self, convention: PercentConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &LedgerLayout {
        &self.layout
    }

    pub fn convention(&self) -> PercentConvention {
        self.convention
    }

    /// Load the workbook and check the required sheets
    pub fn open_workbook(&self) -> Result<Workbook> {
        Workbook::open(&self.path, &self.layout)
    }

    fn read<T>(&self, f: impl FnOnce(&Workbook) -> Result<T>) -> Result<T> {
        let workbook = self.open_workbook()?;
        f(&workbook)
    }

    /// Load, apply `f` and save, holding the writer gate throughout.
    ///
    /// Nothing is written when `f` fails.
    fn transact<T>(&self, f: impl FnOnce(&mut Workbook) -> Result<T>) -> Result<T> {
        let _guard = self.write_gate.lock();
        let mut workbook = self.open_workbook()?;
        let out = f(&mut workbook)?;
        workbook.save(&self.path)?;
        Ok(out)
    }

    // ------------------------------------------------------------------------
    // Catalogs
    // ------------------------------------------------------------------------

    /// Load catalogs, degrading to empty catalogs on any failure
    pub fn load_catalogs(&self) -> Catalogs {
        match self.try_load_catalogs() {
            Ok(catalogs) => catalogs,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "catalogs unavailable, continuing with empty catalogs"
                );
                Catalogs::default()
            }
        }
    }

    /// Load catalogs, propagating the failure
    pub fn try_load_catalogs(&self) -> Result<Catalogs> {
        self.read(|wb| crate::catalog::load_catalogs(wb, &self.layout))
    }

    /// Re-derive the catalog snapshot after the reference sheet changed
    pub fn refresh_catalogs(&self, catalogs: &mut Catalogs) {
        *catalogs = self.load_catalogs();
    }

    // ------------------------------------------------------------------------
    // Project rows
    // ------------------------------------------------------------------------

    /// Append a project and save. Requires a non-empty team mapping.
    pub fn create_project(
        &self,
        project: &NewProject,
        deps: &[Dependency],
        catalogs: &Catalogs,
    ) -> Result<Allocation> {
        let team_map = catalogs.require_team_map()?;
        self.transact(|wb| repository::insert_project(wb, &self.layout, project, deps, team_map))
    }

    /// Update progress, estimate and dependencies of `row` and save.
    /// Requires a non-empty team mapping.
    pub fn update_project_row(
        &self,
        row: RowIndex,
        changes: &RowUpdate,
        catalogs: &Catalogs,
    ) -> Result<ProgressUpdate> {
        let team_map = catalogs.require_team_map()?;
        self.transact(|wb| {
            repository::update_row(wb, &self.layout, self.convention, row, changes, team_map)
        })
    }

    pub fn list_project_names(&self, filter: Option<&str>) -> Result<Vec<String>> {
        self.read(|wb| repository::project_names(wb, &self.layout, filter))
    }

    pub fn summarize_by_team(&self, team: &str) -> Result<Lookup<TeamSummary>> {
        self.read(|wb| repository::team_summary(wb, &self.layout, team))
    }

    pub fn summarize_by_project(
        &self,
        name: &str,
        catalogs: &Catalogs,
    ) -> Result<Lookup<ProjectSummary>> {
        self.read(|wb| {
            repository::project_summary(wb, &self.layout, self.convention, name, &catalogs.team_map)
        })
    }

    // ------------------------------------------------------------------------
    // Metrics
    // ------------------------------------------------------------------------

    pub fn compute_metrics(&self, scope: &MetricsScope, catalogs: &Catalogs) -> Result<Metrics> {
        self.read(|wb| compute_metrics(wb, &self.layout, self.convention, scope, catalogs))
    }
}
