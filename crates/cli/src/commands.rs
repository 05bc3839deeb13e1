//! CLI subcommands.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context};
use clap::Subcommand;
use corelib::{
    compute_server_load, decay_cost, DecayModelTable, HostedSegment, LedgerReport, NodeCostLedger, NodeId,
    PlacementConfig, SegmentWindow, ServerLoadReport, StaticClusterState, TableName, TableType,
};
use replication::{BalancedLoadStrategy, PlacementDecision, TrainedCostModel};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run placement decisions for new segments of one table.
    Place {
        /// Training samples (`table,<ignored>,cost` per line).
        #[arg(long)]
        training: Option<PathBuf>,
        /// Table receiving the new segments.
        #[arg(long)]
        table: String,
        /// Append the `_OFFLINE` / `_REALTIME` suffix to the table name.
        #[arg(long)]
        table_type: Option<TableType>,
        /// Eligible nodes, comma separated.
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        nodes: Vec<String>,
        /// Replicas per segment.
        #[arg(long, default_value_t = 3)]
        replicas: usize,
        /// Number of segments to place.
        #[arg(long, default_value_t = 1)]
        rounds: usize,
        /// Threads placing segments concurrently.
        #[arg(long, default_value_t = 1)]
        workers: usize,
        /// Segments the table already has before the first round.
        #[arg(long, default_value_t = 0)]
        existing_segments: usize,
    },

    /// Evaluate a table's decay curve for a single segment.
    Decay {
        /// Decay model file.
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        table: String,
        #[arg(long, default_value_t = 1)]
        docs: u64,
        /// Segment start, epoch seconds.
        #[arg(long, default_value_t = 0)]
        start: i64,
        /// Segment end, epoch seconds; defaults to the start.
        #[arg(long)]
        end: Option<i64>,
        /// Evaluation time, epoch seconds; defaults to now.
        #[arg(long)]
        reference: Option<i64>,
    },

    /// Compute a server's load from a JSON list of hosted segments.
    Report {
        /// Decay model file.
        #[arg(long)]
        model: Option<PathBuf>,
        /// JSON array of hosted segments.
        #[arg(long)]
        segments: PathBuf,
        /// Evaluation time, epoch seconds; defaults to now.
        #[arg(long)]
        reference: Option<i64>,
    },
}

/// Output of a placement run.
#[derive(Debug, Serialize)]
pub struct PlaceOutput {
    pub decisions: Vec<PlacementDecision>,
    pub ledger: LedgerReport,
}

#[derive(Debug, Serialize)]
pub struct DecayOutput {
    pub table: TableName,
    pub reference_time: i64,
    pub cost: f64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum CommandResult {
    Place(PlaceOutput),
    Decay(DecayOutput),
    Report(ServerLoadReport),
}

impl Command {
    pub fn execute(&self, config: &PlacementConfig) -> anyhow::Result<CommandResult> {
        match self {
            Command::Place {
                training,
                table,
                table_type,
                nodes,
                replicas,
                rounds,
                workers,
                existing_segments,
            } => {
                let table = table_name(table, *table_type)?;
                let candidates = nodes
                    .iter()
                    .map(|n| NodeId::new(n.as_str()))
                    .collect::<corelib::Result<Vec<_>>>()?;
                let training = training.as_ref().or(config.training_data.as_ref());
                let run = PlaceRun {
                    table,
                    candidates,
                    replicas: *replicas,
                    rounds: *rounds,
                    workers: *workers,
                    existing_segments: *existing_segments,
                };
                Ok(CommandResult::Place(place(&run, training.map(PathBuf::as_path), config)?))
            }
            Command::Decay {
                model,
                table,
                docs,
                start,
                end,
                reference,
            } => {
                let models = load_models(model.as_deref(), config)?;
                let table = TableName::new(table.as_str())?;
                let params = models
                    .get(table.as_str())
                    .ok_or_else(|| anyhow!("no decay model for table {}", table))?;
                let reference_time = reference.map_or_else(now_epoch_secs, Ok)?;
                let window = SegmentWindow::new(*docs, *start, end.unwrap_or(*start));
                let cost = decay_cost(params, &window, reference_time);
                Ok(CommandResult::Decay(DecayOutput {
                    table,
                    reference_time,
                    cost,
                }))
            }
            Command::Report {
                model,
                segments,
                reference,
            } => {
                let models = load_models(model.as_deref(), config)?;
                let raw = fs::read_to_string(segments)
                    .with_context(|| format!("reading segments from {}", segments.display()))?;
                let hosted: Vec<HostedSegment> = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing segments from {}", segments.display()))?;
                let reference_time = reference.map_or_else(now_epoch_secs, Ok)?;
                Ok(CommandResult::Report(compute_server_load(&hosted, &models, reference_time)))
            }
        }
    }
}

/// Parameters of one `place` invocation.
#[derive(Debug, Clone)]
pub struct PlaceRun {
    pub table: TableName,
    pub candidates: Vec<NodeId>,
    pub replicas: usize,
    pub rounds: usize,
    pub workers: usize,
    pub existing_segments: usize,
}

/// Run `run.rounds` placement decisions, spread over `run.workers` threads.
///
/// Every decision that selects at least one node adds a segment to the
/// simulated cluster, so only the first rounds of a new table bootstrap.
pub fn place(run: &PlaceRun, training: Option<&Path>, config: &PlacementConfig) -> anyhow::Result<PlaceOutput> {
    let ledger = Arc::new(match config.ledger_half_life() {
        Some(half_life) => NodeCostLedger::with_half_life(half_life),
        None => NodeCostLedger::new(),
    });
    let model = match training {
        Some(path) => TrainedCostModel::from_path(path, Arc::clone(&ledger))
            .with_context(|| format!("loading training data from {}", path.display()))?,
        None => {
            warn!("no training data given, table baselines are zero");
            TrainedCostModel::from_rows(Vec::new(), Arc::clone(&ledger))
        }
    };

    let cluster = Arc::new(StaticClusterState::new());
    for _ in 0..run.existing_segments {
        cluster.add_segment(&run.table);
    }
    let strategy = BalancedLoadStrategy::with_config(Arc::new(model), cluster.clone(), config);

    let workers = run.workers.max(1);
    let shares: Vec<usize> = (0..workers)
        .map(|w| run.rounds / workers + usize::from(w < run.rounds % workers))
        .collect();

    let joined = crossbeam::scope(|s| {
        let handles: Vec<_> = shares
            .iter()
            .map(|&rounds| {
                let strategy = &strategy;
                let cluster = &cluster;
                s.spawn(move |_| {
                    let mut decisions = Vec::with_capacity(rounds);
                    for _ in 0..rounds {
                        let decision = strategy.select_replicas(&run.candidates, &run.table, run.replicas);
                        if !decision.selected.is_empty() {
                            cluster.add_segment(&run.table);
                        }
                        decisions.push(decision);
                    }
                    decisions
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
    })
    .map_err(|_| anyhow!("placement worker panicked"))?;

    let mut decisions = Vec::with_capacity(run.rounds);
    for result in joined {
        decisions.extend(result.map_err(|_| anyhow!("placement worker panicked"))?);
    }

    let short = decisions.iter().filter(|d| d.is_short()).count();
    info!(
        table = %run.table,
        decisions = decisions.len(),
        short,
        "placement run finished"
    );
    Ok(PlaceOutput {
        decisions,
        ledger: LedgerReport::capture(&ledger),
    })
}

fn table_name(raw: &str, table_type: Option<TableType>) -> anyhow::Result<TableName> {
    let table = match table_type {
        Some(t) => TableName::with_type(raw, t)?,
        None => TableName::new(raw)?,
    };
    Ok(table)
}

fn load_models(path: Option<&Path>, config: &PlacementConfig) -> anyhow::Result<DecayModelTable> {
    let Some(path) = path.or(config.decay_model.as_deref()) else {
        bail!("no decay model file given (use --model or decay_model in the config)");
    };
    DecayModelTable::from_path(path).with_context(|| format!("loading decay model from {}", path.display()))
}

fn now_epoch_secs() -> anyhow::Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?;
    Ok(elapsed.as_secs() as i64)
}
