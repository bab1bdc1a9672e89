//! `overlord run` - execute a batch of goals.

use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use tracing::info;

use crate::application::{BatchOrchestrator, BatchReport};
use crate::domain::models::{Config, SchedulingStrategy};
use crate::domain::ports::{GoalRunner, RunHistory};
use crate::infrastructure::runners::{HttpGoalRunner, MockGoalRunner};
use crate::infrastructure::stores::RunArchive;

/// Arguments for the `run` command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Goal descriptions, one per argument.
    pub goals: Vec<String>,

    /// YAML file containing a list of goal strings.
    #[arg(long)]
    pub goals_file: Option<String>,

    /// Override the configured base parallelism.
    #[arg(long)]
    pub parallel: Option<u32>,

    /// Override the configured agent budget.
    #[arg(long)]
    pub agent_budget: Option<u32>,

    /// Scheduling strategy: fifo, complex-first, complex-last, critical-first.
    #[arg(long)]
    pub strategy: Option<String>,

    /// Retry until every goal resolves (bounded by the round ceiling).
    #[arg(long)]
    pub retry_until_complete: bool,

    /// Override the retry round ceiling.
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Stop launching new goals after the first failure.
    #[arg(long)]
    pub stop_on_error: bool,

    /// Use the built-in mock runner instead of the HTTP endpoint.
    #[arg(long)]
    pub mock: bool,
}

/// Execute the command; returns the process exit code.
pub async fn execute(args: RunArgs, mut config: Config, json: bool) -> Result<u8> {
    let goal_texts = collect_goals(&args)?;
    if goal_texts.is_empty() {
        bail!("no goals given: pass goals as arguments or via --goals-file");
    }

    apply_overrides(&args, &mut config)?;

    let runner: Box<dyn GoalRunner> = if args.mock {
        Box::new(MockGoalRunner::new())
    } else {
        Box::new(HttpGoalRunner::new(&config.runner)?)
    };

    let orchestrator =
        BatchOrchestrator::new(config.scheduler.clone(), config.retry.clone(), runner.as_ref());
    let report = orchestrator.run(goal_texts).await;

    let archive = RunArchive::new(&config.storage.run_archive_dir);
    BatchOrchestrator::archive(&report, "batch", true, &archive as &dyn RunHistory)
        .await
        .context("failed to archive run summary")?;
    info!(run_id = %report.run_id, status = report.status.as_str(), "run archived");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render(&report);
    }

    Ok(crate::cli::exit_code(report.status))
}

fn collect_goals(args: &RunArgs) -> Result<Vec<String>> {
    let mut goals = args.goals.clone();
    if let Some(ref path) = args.goals_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read goals file {path}"))?;
        let from_file: Vec<String> =
            serde_yaml::from_str(&raw).with_context(|| format!("invalid goals file {path}"))?;
        goals.extend(from_file);
    }
    Ok(goals)
}

fn apply_overrides(args: &RunArgs, config: &mut Config) -> Result<()> {
    if let Some(parallel) = args.parallel {
        config.scheduler.base_parallel = parallel;
    }
    if let Some(budget) = args.agent_budget {
        config.scheduler.agent_budget = Some(budget);
    }
    if let Some(ref strategy) = args.strategy {
        config.scheduler.strategy = SchedulingStrategy::from_str(strategy)
            .with_context(|| format!("unknown strategy: {strategy}"))?;
    }
    if args.retry_until_complete {
        config.retry.retry_until_complete = true;
    }
    if let Some(rounds) = args.max_rounds {
        config.retry.max_rounds = rounds;
    }
    if args.stop_on_error {
        config.scheduler.continue_on_error = false;
    }

    crate::infrastructure::config::ConfigLoader::validate(config)?;
    Ok(())
}

fn render(report: &BatchReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["#", "Attempt", "Status", "Artifacts", "Error"]);
    for result in &report.results {
        table.add_row(vec![
            result.source_index.to_string(),
            result.attempt.to_string(),
            result.status.as_str().to_string(),
            result.sub_artifact_count.to_string(),
            result.error.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");
    println!("batch: {}", report.status.as_str());

    if !report.failure_clusters.is_empty() {
        println!("\nfailure clusters:");
        for cluster in &report.failure_clusters {
            println!("  {} x{} {:?}", cluster.signature, cluster.count, cluster.goal_indexes);
        }
    }
    if !report.remediation_actions.is_empty() {
        println!("\nremediation:");
        for action in &report.remediation_actions {
            println!("  [{}] {} - {}", action.priority.as_str(), action.action, action.reason);
        }
    }
    if let Some(ref rec) = report.recommendation {
        println!(
            "\nrecommendation: concurrency {}, budget {:?}, rounds {} ({})",
            rec.suggested_concurrency, rec.suggested_budget, rec.suggested_max_rounds, rec.reason
        );
    }
}
