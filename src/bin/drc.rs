//! `drc`: check a board description against design rules

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pcb_find::board::{Board, BoardIndex, FlagUndoLog};
use pcb_find::drc::{drc_all, DesignRules, ReportDecision, Violation};
use pcb_find::find::connection_report;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "drc")]
#[command(about = "Run design-rule checks on a board description")]
struct Cli {
    /// Board description (JSON)
    #[arg(long)]
    board: PathBuf,
    /// Design rules (JSON); missing fields take their defaults
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Stop after this many violations
    #[arg(long)]
    stop_after: Option<usize>,
    /// Also print which element pins are connected to each other
    #[arg(long)]
    connections: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    board: &'a str,
    rules: &'a DesignRules,
    aborted: bool,
    violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connections: Option<Vec<pcb_find::find::ElementConnections>>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.stop_after == Some(0) {
        bail!("--stop-after must be at least 1");
    }

    let mut board = Board::load(&cli.board)?;
    for problem in board.validate() {
        warn!("{}", problem);
    }
    let rules = match &cli.rules {
        Some(path) => DesignRules::load(path)?,
        None => DesignRules::default(),
    };

    let mut violations = Vec::new();
    let mut reporter = |v: &Violation| {
        violations.push(v.clone());
        match cli.stop_after {
            Some(limit) if violations.len() >= limit => ReportDecision::Stop,
            _ => ReportDecision::Continue,
        }
    };
    let mut undo = FlagUndoLog::new();
    let count = drc_all(&mut board, &rules, &mut reporter, &mut undo);
    info!("{} violations on {}", count.unsigned_abs(), cli.board.display());

    let connections = if cli.connections {
        let index = BoardIndex::build(&board);
        Some(connection_report(&mut board, &index))
    } else {
        None
    };

    let report = Report {
        board: &board.name,
        rules: &rules,
        aborted: count < 0,
        violations,
        connections,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
