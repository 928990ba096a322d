//! gdledger CLI - project and dependency ledger
//!
//! Command-line interface over a shared workbook: create and update project
//! rows, inspect per-team and per-project dependencies, compute metrics.

mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gdledger_core::{Dependency, NewProject, PercentConvention};
use gdledger_engine::{Ledger, LedgerConfig, MetricsScope, RowUpdate, WORKBOOK_ENV};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::output::Printer;

#[derive(Parser)]
#[command(name = "gdledger")]
#[command(author, version, about = "Project and dependency ledger", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Workbook path
    #[arg(short, long, global = true, env = WORKBOOK_ENV, value_name = "FILE")]
    workbook: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How text such as "45%" is read as a number
    #[arg(long, global = true, value_enum)]
    percent: Option<PercentArg>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PercentArg {
    /// "45%" reads as 45
    Strip,
    /// "45%" reads as 0.45
    Fraction,
}

impl From<PercentArg> for PercentConvention {
    fn from(arg: PercentArg) -> Self {
        match arg {
            PercentArg::Strip => PercentConvention::Strip,
            PercentArg::Fraction => PercentConvention::Fraction,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the catalogs of the reference sheet
    Catalogs,

    /// Append a project row
    Create {
        /// Project name
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(long)]
        status: Option<String>,

        /// Priority quarter, e.g. Q1
        #[arg(long)]
        quarter: Option<String>,

        /// Prioritized flag (SI marks a priority project)
        #[arg(long)]
        prioritized: Option<String>,

        #[arg(long)]
        owner: Option<String>,

        /// Requesting area
        #[arg(long)]
        area: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        baseline: Option<f64>,

        #[arg(long)]
        baseline_at_period: Option<f64>,

        #[arg(long)]
        progress: Option<f64>,

        #[arg(long)]
        estimate: Option<f64>,

        #[arg(long)]
        contribution: Option<f64>,

        /// Strategic initiative
        #[arg(long)]
        initiative: Option<String>,

        /// Dependency on a team (repeatable)
        #[arg(long = "dep", value_name = "TEAM:FLAG[:DESC]")]
        deps: Vec<Dependency>,
    },

    /// List project names
    List {
        /// Case-insensitive substring filter
        #[arg(long)]
        filter: Option<String>,
    },

    /// Projects depending on a team
    Team {
        #[arg(value_name = "TEAM")]
        name: String,
    },

    /// Dependencies of a project
    Project {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Update progress, estimate and dependencies of a row
    Update {
        /// Worksheet row number
        #[arg(value_name = "ROW")]
        row: u32,

        #[arg(long)]
        progress: Option<f64>,

        #[arg(long)]
        estimate: Option<f64>,

        /// Replacement dependency list (repeatable; none clears the row)
        #[arg(long = "dep", value_name = "TEAM:FLAG[:DESC]")]
        deps: Vec<Dependency>,
    },

    /// Aggregate metrics
    Metrics {
        /// all, area (group, tren) or celula (team)
        #[arg(long, default_value = "all")]
        scope: String,

        /// Group or team name for a scoped computation
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show the active workbook and layout
    Paths,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Defaults, then the config file, then flag or environment overrides
fn resolve_config(cli: &Cli) -> Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(workbook) = &cli.workbook {
        config = config.with_workbook(workbook.clone());
    }
    if let Some(percent) = cli.percent {
        config = config.with_percent_convention(percent.into());
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    tracing::debug!(workbook = %config.workbook.display(), "configuration resolved");
    let printer = Printer::new(cli.format);

    let Some(command) = cli.command else {
        println!("gdledger - project and dependency ledger");
        println!("Run with --help for usage information");
        return Ok(());
    };

    let ledger = Ledger::from_config(&config).context("Invalid ledger layout")?;
    let workbook = config.workbook.display();

    match command {
        Commands::Catalogs => {
            let catalogs = ledger
                .try_load_catalogs()
                .with_context(|| format!("Failed to load catalogs from {}", workbook))?;
            printer.catalogs(&catalogs)
        }
        Commands::Create {
            name,
            status,
            quarter,
            prioritized,
            owner,
            area,
            description,
            start,
            target,
            baseline,
            baseline_at_period,
            progress,
            estimate,
            contribution,
            initiative,
            deps,
        } => {
            let project = NewProject {
                name,
                status,
                quarter,
                prioritized,
                owner,
                requesting_area: area,
                description,
                start_date: start,
                target_date: target,
                baseline,
                baseline_at_period,
                progress,
                estimated_progress: estimate,
                contribution,
                initiative,
            };
            let catalogs = ledger.load_catalogs();
            let slot = ledger
                .create_project(&project, &deps, &catalogs)
                .with_context(|| format!("Failed to create project in {}", workbook))?;
            printer.created(&project.name, &slot)
        }
        Commands::List { filter } => {
            let names = ledger
                .list_project_names(filter.as_deref())
                .with_context(|| format!("Failed to read {}", workbook))?;
            printer.names(&names)
        }
        Commands::Team { name } => {
            let lookup = ledger
                .summarize_by_team(&name)
                .with_context(|| format!("Failed to read {}", workbook))?;
            printer.team(&lookup)
        }
        Commands::Project { name } => {
            let catalogs = ledger.load_catalogs();
            let lookup = ledger
                .summarize_by_project(&name, &catalogs)
                .with_context(|| format!("Failed to read {}", workbook))?;
            printer.project(&lookup)
        }
        Commands::Update {
            row,
            progress,
            estimate,
            deps,
        } => {
            let changes = RowUpdate {
                progress,
                estimate,
                dependencies: deps,
            };
            let catalogs = ledger.load_catalogs();
            let update = ledger
                .update_project_row(row, &changes, &catalogs)
                .with_context(|| format!("Failed to update row {} in {}", row, workbook))?;
            printer.updated(row, &update)
        }
        Commands::Metrics { scope, filter } => {
            let scope = MetricsScope::parse(&scope, filter.as_deref())?;
            let catalogs = ledger.load_catalogs();
            let metrics = ledger
                .compute_metrics(&scope, &catalogs)
                .with_context(|| format!("Failed to read {}", workbook))?;
            printer.metrics(&scope, &metrics)
        }
        Commands::Paths => printer.paths(&config),
    }
}
