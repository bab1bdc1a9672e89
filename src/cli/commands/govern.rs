//! `overlord govern` - run the governance convergence loop.

use anyhow::Result;
use clap::Args;

use crate::application::{ArchiveHealthProbe, StoreMaintenanceExecutor};
use crate::domain::models::Config;
use crate::domain::ports::PassingGate;
use crate::infrastructure::stores::{FileRecoveryStore, RunArchive};
use crate::services::GovernanceLoop;

/// Arguments for the `govern` command.
#[derive(Debug, Args)]
pub struct GovernArgs {
    /// Compute the action plan without applying it.
    #[arg(long)]
    pub plan_only: bool,

    /// Override the round ceiling.
    #[arg(long)]
    pub max_rounds: Option<u32>,
}

/// Execute the command; returns the process exit code.
pub async fn execute(args: GovernArgs, mut config: Config, json: bool) -> Result<u8> {
    if args.plan_only {
        config.governance.plan_only = true;
    }
    if let Some(rounds) = args.max_rounds {
        config.governance.max_rounds = rounds;
    }

    let archive = RunArchive::new(&config.storage.run_archive_dir);
    let memory_store = FileRecoveryStore::new(&config.storage.recovery_memory_path);
    let probe = ArchiveHealthProbe::new(&archive);
    let executor = StoreMaintenanceExecutor::new(&archive, &memory_store, config.recovery.clone());
    let gate = PassingGate;

    let looper = GovernanceLoop::new(config.governance.clone(), &probe, &gate, &executor)?;
    let report = looper.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("governance: {}", report.outcome.as_str());
        for round in &report.rounds {
            println!(
                "  round {}: risk {} failure_rate {:.2} pending {} applied {:?}",
                round.round,
                round.risk.as_str(),
                round.health.failure_rate,
                round.health.pending_goals,
                round.applied_actions
            );
        }
        for reason in &report.blocking_reasons {
            println!("  blocked: {reason}");
        }
    }

    use crate::domain::models::GovernanceOutcome;
    Ok(match report.outcome {
        GovernanceOutcome::Converged | GovernanceOutcome::PlanOnly => 0,
        GovernanceOutcome::Blocked => 3,
        _ => 1,
    })
}
