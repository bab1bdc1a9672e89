//! `overlord memory` - recovery memory management.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::domain::models::Config;
use crate::domain::ports::RecoveryStore;
use crate::infrastructure::stores::FileRecoveryStore;
use crate::services::RecoveryPlanner;

/// Arguments for the `memory` command.
#[derive(Debug, Args)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub command: MemoryCommands,
}

/// Recovery memory subcommands.
#[derive(Debug, Subcommand)]
pub enum MemoryCommands {
    /// Drop entries unused for longer than the TTL.
    Prune {
        /// Age cutoff in days; defaults to the configured TTL.
        #[arg(long)]
        ttl_days: Option<i64>,
    },
    /// Show the stored signatures and their action statistics.
    Show,
}

/// Execute the command; returns the process exit code.
pub async fn execute(args: MemoryArgs, config: Config, json: bool) -> Result<u8> {
    let store = FileRecoveryStore::new(&config.storage.recovery_memory_path);

    match args.command {
        MemoryCommands::Prune { ttl_days } => {
            let ttl = ttl_days.unwrap_or(config.recovery.memory_ttl_days);
            let planner = RecoveryPlanner::new(&store, config.recovery.scope.clone());
            let removed = planner.prune(ttl).await?;
            if json {
                println!("{}", serde_json::json!({ "removed": removed, "ttl_days": ttl }));
            } else {
                println!("pruned {removed} signature(s) older than {ttl} day(s)");
            }
        }
        MemoryCommands::Show => {
            let memory = store.load().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&memory)?);
            } else if memory.signatures.is_empty() {
                println!("recovery memory is empty");
            } else {
                for (signature, entry) in &memory.signatures {
                    println!(
                        "{signature}: {}/{} succeeded",
                        entry.successes, entry.attempts
                    );
                    for (action, stats) in &entry.actions {
                        println!(
                            "  action #{action}: {}/{} succeeded",
                            stats.successes, stats.attempts
                        );
                    }
                }
            }
        }
    }

    Ok(0)
}
