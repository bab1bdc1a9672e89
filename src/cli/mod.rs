//! Command-line interface.
//!
//! A thin caller shell over the application layer: parses flags, wires the
//! configured stores and runner together, and renders machine output. The
//! core contract lives below this layer.

pub mod commands;

use clap::{Parser, Subcommand};

use crate::domain::models::BatchStatus;

/// Overlord - autonomous goal execution orchestrator.
#[derive(Debug, Parser)]
#[command(name = "overlord", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a config file (defaults to .overlord/config.yaml).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a batch of goals.
    Run(commands::run::RunArgs),
    /// Run the governance convergence loop.
    Govern(commands::govern::GovernArgs),
    /// Show KPI buckets and anomalies.
    Kpi(commands::kpi::KpiArgs),
    /// Manage the recovery memory.
    Memory(commands::memory::MemoryArgs),
}

/// Process exit code for a batch status.
pub fn exit_code(status: BatchStatus) -> u8 {
    match status {
        BatchStatus::Completed => 0,
        BatchStatus::Failed => 1,
        BatchStatus::PartialFailed => 2,
    }
}
