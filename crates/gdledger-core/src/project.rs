//! Project records

use serde::{Deserialize, Serialize};

use crate::layout::{Column, FieldColumns};
use crate::value::CellValue;

/// Fields of a project row to be created
///
/// Every optional field that is `None` clears its cell when written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProject {
    pub name: String,
    pub status: Option<String>,
    pub quarter: Option<String>,
    pub prioritized: Option<String>,
    pub owner: Option<String>,
    pub requesting_area: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub target_date: Option<String>,
    pub baseline: Option<f64>,
    pub baseline_at_period: Option<f64>,
    pub progress: Option<f64>,
    pub estimated_progress: Option<f64>,
    pub contribution: Option<f64>,
    pub initiative: Option<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn quarter(mut self, quarter: impl Into<String>) -> Self {
        self.quarter = Some(quarter.into());
        self
    }

    pub fn prioritized(mut self, value: impl Into<String>) -> Self {
        self.prioritized = Some(value.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn requesting_area(mut self, area: impl Into<String>) -> Self {
        self.requesting_area = Some(area.into());
        self
    }

    pub fn baseline(mut self, baseline: f64) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn estimated_progress(mut self, estimate: f64) -> Self {
        self.estimated_progress = Some(estimate);
        self
    }

    pub fn initiative(mut self, initiative: impl Into<String>) -> Self {
        self.initiative = Some(initiative.into());
        self
    }

    /// Project the record onto its fixed-letter columns.
    ///
    /// The identifier and the completion column are not part of the record:
    /// the first is allocated, the second derived on update.
    pub fn cells(&self, fields: &FieldColumns) -> Vec<(Column, CellValue)> {
        vec![
            (fields.name, CellValue::from(self.name.as_str())),
            (fields.status, self.status.clone().into()),
            (fields.quarter, self.quarter.clone().into()),
            (fields.prioritized, self.prioritized.clone().into()),
            (fields.owner, self.owner.clone().into()),
            (fields.requesting_area, self.requesting_area.clone().into()),
            (fields.description, self.description.clone().into()),
            (fields.start_date, self.start_date.clone().into()),
            (fields.target_date, self.target_date.clone().into()),
            (fields.baseline, self.baseline.into()),
            (fields.baseline_at_period, self.baseline_at_period.into()),
            (fields.progress, self.progress.into()),
            (fields.estimated_progress, self.estimated_progress.into()),
            (fields.contribution, self.contribution.into()),
            (fields.initiative, self.initiative.clone().into()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_cover_every_mapped_field() {
        let fields = FieldColumns::default();
        let project = NewProject::new("CRM").status("Open").baseline(0.3);
        let cells = project.cells(&fields);

        assert_eq!(cells.len(), 15);
        assert!(cells.contains(&(fields.name, CellValue::from("CRM"))));
        assert!(cells.contains(&(fields.status, CellValue::from("Open"))));
        assert!(cells.contains(&(fields.baseline, CellValue::Number(0.3))));
        assert!(cells.contains(&(fields.owner, CellValue::Empty)));
        assert!(!cells.iter().any(|(c, _)| *c == fields.id || *c == fields.completion));
    }
}
