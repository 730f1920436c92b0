use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use capgrid_common::{Entity, PeriodId, RollupPolicy};
use capgrid_eval::{
    BudgetClass, CellValueResolver, ColumnTotal, DraftMap, GridConfig, LatestMap, MatrixModel,
    ProgressRollup, Rollups, ViewMode, commit_payload,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "capgrid", about = "Rollups and commit payloads for grid snapshots")]
struct Cli {
    /// Log engine spans and events to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print row, column and earned-value totals as JSON.
    Totals(TotalsArgs),
    /// Print the commit payload of the snapshot's drafts as JSON.
    Payload(PayloadArgs),
}

#[derive(Parser, Debug)]
struct TotalsArgs {
    /// Snapshot JSON file.
    snapshot: PathBuf,

    /// Restrict every total to one `YYYYMM` period (day totals).
    #[arg(long)]
    period: Option<PeriodId>,
}

#[derive(Parser, Debug)]
struct PayloadArgs {
    /// Snapshot JSON file.
    snapshot: PathBuf,
}

/// One grid as stored on disk: the model description plus both value maps.
#[derive(Deserialize, Debug)]
struct Snapshot {
    periods: Vec<PeriodId>,
    entities: Vec<Entity>,
    mode: ViewMode,
    #[serde(default)]
    latest: LatestMap,
    #[serde(default)]
    draft: DraftMap,
    /// Budget grid weighting the earned-value rollup. Defaults to the budget
    /// columns of this snapshot's own maps.
    #[serde(default)]
    budget: Option<BudgetSnapshot>,
    #[serde(default)]
    config: GridConfig,
}

#[derive(Deserialize, Debug)]
struct BudgetSnapshot {
    #[serde(default)]
    periods: Option<Vec<PeriodId>>,
    #[serde(default)]
    latest: LatestMap,
    #[serde(default)]
    draft: DraftMap,
}

#[derive(Serialize, Debug)]
struct RowTotals {
    entity: String,
    totals: BTreeMap<String, f64>,
}

#[derive(Serialize, Debug)]
struct TotalsReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<PeriodId>,
    rows: Vec<RowTotals>,
    columns: Vec<ColumnTotal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    earned_value: Option<ProgressRollup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_cost: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Totals(args) => run_totals(args),
        Command::Payload(args) => run_payload(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))
}

fn build_model(snapshot: &Snapshot) -> Result<MatrixModel> {
    MatrixModel::from_period_ids(
        snapshot.periods.iter().copied(),
        snapshot.entities.clone(),
        snapshot.mode.clone(),
        &snapshot.config,
    )
    .context("invalid grid description")
}

fn run_totals(args: TotalsArgs) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let config = &snapshot.config;
    let full = build_model(&snapshot)?;
    let model = match args.period {
        Some(p) => {
            anyhow::ensure!(
                full.periods().iter().any(|period| period.id == p),
                "period {p} is not part of the snapshot"
            );
            full.period_scope(p, p)
        }
        None => full.clone(),
    };
    tracing::debug!(cells = model.cell_count(), "grid loaded");

    let resolver = CellValueResolver::new(&snapshot.latest, &snapshot.draft);
    let rollups = Rollups::new(&model, resolver, config);

    let rows = model
        .entities()
        .iter()
        .map(|e| RowTotals {
            entity: e.code.clone(),
            totals: model
                .columns()
                .iter()
                .map(|c| {
                    let value = match c.rollup {
                        RollupPolicy::LastNonEmpty => rollups.row_current(&e.code, &c.key),
                        _ => rollups.row_total(&e.code, &c.key),
                    };
                    (c.key.clone(), value)
                })
                .collect(),
        })
        .collect();

    let (earned_value, actual_cost) = match model.mode() {
        ViewMode::Progress { with_actual_cost } => {
            let earned_value = match &snapshot.budget {
                Some(budget) => {
                    let budget_model = MatrixModel::from_period_ids(
                        budget
                            .periods
                            .clone()
                            .unwrap_or_else(|| snapshot.periods.clone()),
                        snapshot.entities.clone(),
                        ViewMode::Budget {
                            class: BudgetClass::Orig,
                        },
                        config,
                    )
                    .context("invalid budget grid description")?;
                    let budget_resolver = CellValueResolver::new(&budget.latest, &budget.draft);
                    rollups.earned_value_progress(&Rollups::new(
                        &budget_model,
                        budget_resolver,
                        config,
                    ))
                }
                None => rollups.earned_value_progress(&Rollups::new(&full, resolver, config)),
            };
            let actual_cost = with_actual_cost.then(|| rollups.actual_cost_total());
            (Some(earned_value), actual_cost)
        }
        _ => (None, None),
    };

    let report = TotalsReport {
        period: args.period,
        rows,
        columns: rollups.column_totals(),
        earned_value,
        actual_cost,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_payload(args: PayloadArgs) -> Result<()> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let model = build_model(&snapshot)?;
    let payload = commit_payload(&snapshot.draft, &model);
    tracing::debug!(entries = payload.len(), "commit payload built");
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
