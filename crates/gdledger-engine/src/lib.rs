//! # gdledger-engine
//!
//! Ledger operations over a workbook: catalog loading, the per-team
//! dependency matrix, project rows and scoped metrics.
//!
//! The free functions in [`catalog`], [`matrix`], [`repository`] and
//! [`metrics`] work on an in-memory [`gdledger_xlsx::Workbook`]. [`Ledger`]
//! binds them to a file and turns each mutation into a load/mutate/save
//! transaction.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gdledger_core::{Dependency, NewProject};
//! use gdledger_engine::{Ledger, LedgerConfig, MetricsScope};
//!
//! let ledger = Ledger::from_config(&LedgerConfig::default())?;
//! let catalogs = ledger.load_catalogs();
//!
//! let project = NewProject::new("CRM Migration").quarter("Q1").progress(0.1);
//! let deps = [Dependency::new("Beta", "P", "needs API")];
//! let slot = ledger.create_project(&project, &deps, &catalogs)?;
//! println!("created row {} with id {}", slot.row, slot.id);
//!
//! let scope = MetricsScope::parse("celula", Some("Beta"))?;
//! let metrics = ledger.compute_metrics(&scope, &catalogs)?;
//! println!("{} projects depend on Beta", metrics.total_projects);
//! # Ok::<(), gdledger_core::LedgerError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod matrix;
pub mod metrics;
pub mod repository;

pub use config::{ConfigError, LedgerConfig, DEFAULT_WORKBOOK, WORKBOOK_ENV};
pub use ledger::Ledger;
pub use metrics::MetricsScope;
pub use repository::RowUpdate;
