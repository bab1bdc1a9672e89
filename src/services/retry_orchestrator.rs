//! Retry orchestrator: multi-round scheduling with adaptive backpressure.
//!
//! Wraps the scheduler in up to `round_budget` rounds. After each round the
//! unresolved goals (failed, error, unknown, stopped) become the next
//! round's input with their attempt counter bumped, and observed rate-limit
//! telemetry shrinks the next round's concurrency and agent budget:
//! severe pressure halves both (floor, min 1), mild pressure decrements
//! both (min 1).

use std::time::Instant;

use tracing::{info, warn};

use crate::domain::models::{
    BackpressureLevel, BackpressureThresholds, BatchStatus, Goal, GoalPlan, GoalResult,
    RecoveryRecommendation, RetryConfig, RetryRoundRecord, ScheduleSummary, SchedulerConfig,
};
use crate::domain::ports::GoalRunner;
use crate::services::{budget_allocator, plan_builder::PlanBuilder, scheduler};

/// Outcome of a full retry run.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    /// Final result per goal, ordered by `source_index`. Each goal's most
    /// recent attempt wins.
    pub results: Vec<GoalResult>,
    /// Batch status derived from the final result set.
    pub batch_status: BatchStatus,
    /// One record per executed round.
    pub rounds: Vec<RetryRoundRecord>,
    /// Aggregated scheduling counters across rounds.
    pub summary: ScheduleSummary,
    /// Advice for the caller when retries exhausted under rate-limit
    /// pressure.
    pub recommendation: Option<RecoveryRecommendation>,
}

/// Orchestrates scheduling passes across retry rounds.
pub struct RetryOrchestrator {
    scheduler_config: SchedulerConfig,
    retry_config: RetryConfig,
}

impl RetryOrchestrator {
    pub fn new(scheduler_config: SchedulerConfig, retry_config: RetryConfig) -> Self {
        Self {
            scheduler_config,
            retry_config,
        }
    }

    /// Run the batch to completion or exhaustion.
    pub async fn run(&self, goals: Vec<Goal>, runner: &dyn GoalRunner) -> RetryOutcome {
        let started = Instant::now();
        let round_budget = self.retry_config.round_budget().max(1);

        let mut concurrency = self.scheduler_config.base_parallel;
        let mut agent_budget = self.scheduler_config.agent_budget;
        let mut current: Vec<Goal> = goals;
        let mut final_results: Vec<GoalResult> = Vec::new();
        let mut rounds: Vec<RetryRoundRecord> = Vec::new();
        let mut summary = ScheduleSummary::default();
        let mut pressure_seen = false;

        for round in 1..=round_budget {
            if current.is_empty() {
                break;
            }

            if self.elapsed_budget_spent(started) {
                warn!(round, "retry wall-clock budget spent, stopping early");
                break;
            }

            // The first round honors the caller's continue-on-error; under
            // the adaptive strategy later rounds never stop the batch early.
            let continue_on_error = if round == 1 {
                self.scheduler_config.continue_on_error
            } else {
                self.retry_config.adaptive || self.scheduler_config.continue_on_error
            };

            let mut round_scheduler = self.scheduler_config.clone();
            round_scheduler.base_parallel = concurrency;
            round_scheduler.agent_budget = agent_budget;

            let builder = PlanBuilder::new(round_scheduler.strategy, round_scheduler.agent_budget);
            let hints = vec![None; current.len()];
            let plans: Vec<GoalPlan> = builder.build(&current, &hints);

            let resource_plan = budget_allocator::allocate(&round_scheduler, &plans);
            let pass =
                scheduler::run_pass(plans, &resource_plan, continue_on_error, false, runner).await;

            summary.max_concurrent = summary.max_concurrent.max(pass.summary.max_concurrent);
            summary.max_wait_ticks = summary.max_wait_ticks.max(pass.summary.max_wait_ticks);
            summary.starvation_waits += pass.summary.starvation_waits;

            let input_goals = current.len();
            let signals: u32 = pass
                .results
                .iter()
                .map(|r| r.rate_limit.signal_count)
                .sum();
            let backoff_ms: u64 = pass
                .results
                .iter()
                .map(|r| r.rate_limit.total_backoff_ms)
                .sum();
            let launch_hold_ms: u64 = pass
                .results
                .iter()
                .map(|r| r.rate_limit.last_launch_hold_ms)
                .max()
                .unwrap_or(0);

            let level = classify_backpressure(
                &self.retry_config.backpressure,
                input_goals,
                signals,
                backoff_ms,
                launch_hold_ms,
            );
            pressure_seen = pressure_seen || level != BackpressureLevel::None;

            let unresolved: Vec<Goal> = pass
                .results
                .iter()
                .filter(|r| r.is_unresolved())
                .filter_map(|r| {
                    current
                        .iter()
                        .find(|g| g.source_index == r.source_index)
                        .map(Goal::next_attempt)
                })
                .collect();

            rounds.push(RetryRoundRecord {
                round,
                input_goals,
                processed_goals: pass.launched,
                failed_goals: pass.results.iter().filter(|r| r.is_unresolved()).count(),
                unprocessed_goals: input_goals - pass.launched,
                applied_concurrency: concurrency,
                applied_budget: agent_budget,
                rate_limit_signals: signals,
                backpressure: level,
            });

            info!(
                round,
                input_goals,
                unresolved = unresolved.len(),
                rate_limit_signals = signals,
                backpressure = level.as_str(),
                "retry round finished"
            );

            merge_results(&mut final_results, pass.results);

            if unresolved.is_empty() {
                current = Vec::new();
                break;
            }
            current = unresolved;

            if self.retry_config.adaptive {
                (concurrency, agent_budget) =
                    apply_backpressure(level, concurrency, agent_budget);
            }
        }

        let recommendation = if !current.is_empty() && pressure_seen {
            Some(RecoveryRecommendation {
                suggested_concurrency: (concurrency / 2).max(1),
                suggested_budget: agent_budget.map(|b| (b / 2).max(1)),
                suggested_max_rounds: round_budget + 2,
                reason: format!(
                    "{} goal(s) unresolved after {} round(s) under rate-limit pressure; \
                     resume with reduced concurrency and a larger round budget",
                    current.len(),
                    rounds.len()
                ),
            })
        } else {
            None
        };

        if !current.is_empty() {
            warn!(
                unresolved = current.len(),
                rounds = rounds.len(),
                "retry budget exhausted with unresolved goals"
            );
            // Retry-until-complete promised resolution; the round budget
            // vetoed it, so the survivors are stopped with that reason.
            // Fixed-round runs keep each goal's own terminal status.
            if self.retry_config.retry_until_complete {
                mark_exhausted(&mut final_results, &current, rounds.len());
            }
        }

        final_results.sort_by_key(|r| r.source_index);
        let batch_status = BatchStatus::from_results(&final_results);

        RetryOutcome {
            results: final_results,
            batch_status,
            rounds,
            summary,
            recommendation,
        }
    }

    fn elapsed_budget_spent(&self, started: Instant) -> bool {
        self.retry_config.max_elapsed_secs > 0
            && started.elapsed().as_secs() >= self.retry_config.max_elapsed_secs
    }
}

/// Classify one round's rate-limit telemetry.
pub fn classify_backpressure(
    thresholds: &BackpressureThresholds,
    input_goals: usize,
    signals: u32,
    backoff_ms: u64,
    launch_hold_ms: u64,
) -> BackpressureLevel {
    if input_goals == 0 {
        return BackpressureLevel::None;
    }

    let signals_per_goal = f64::from(signals) / input_goals as f64;
    if signals_per_goal >= thresholds.severe_signals_per_goal
        || backoff_ms >= thresholds.severe_backoff_ms
        || launch_hold_ms >= thresholds.severe_launch_hold_ms
    {
        BackpressureLevel::Severe
    } else if signals > 0 || backoff_ms > 0 || launch_hold_ms > 0 {
        BackpressureLevel::Mild
    } else {
        BackpressureLevel::None
    }
}

/// Shrink concurrency and budget for the next round.
pub fn apply_backpressure(
    level: BackpressureLevel,
    concurrency: u32,
    agent_budget: Option<u32>,
) -> (u32, Option<u32>) {
    match level {
        BackpressureLevel::Severe => (
            (concurrency / 2).max(1),
            agent_budget.map(|b| (b / 2).max(1)),
        ),
        BackpressureLevel::Mild => (
            concurrency.saturating_sub(1).max(1),
            agent_budget.map(|b| b.saturating_sub(1).max(1)),
        ),
        BackpressureLevel::None => (concurrency, agent_budget),
    }
}

/// Keep the most recent attempt's result per source index.
fn merge_results(accumulated: &mut Vec<GoalResult>, new_results: Vec<GoalResult>) {
    for result in new_results {
        match accumulated
            .iter_mut()
            .find(|r| r.source_index == result.source_index)
        {
            Some(existing) => *existing = result,
            None => accumulated.push(result),
        }
    }
}

/// Rewrite still-unresolved goals as stopped with an exhaustion reason.
fn mark_exhausted(results: &mut [GoalResult], unresolved: &[Goal], rounds: usize) {
    for goal in unresolved {
        if let Some(result) = results
            .iter_mut()
            .find(|r| r.source_index == goal.source_index)
        {
            let mut stopped = GoalResult::stopped(
                goal,
                format!("retry budget exhausted after {rounds} round(s)"),
            );
            // Preserve the telemetry the last real attempt produced.
            stopped.rate_limit = result.rate_limit;
            stopped.attempt = result.attempt;
            *result = stopped;
        }
    }
}
