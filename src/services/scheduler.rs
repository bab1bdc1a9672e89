//! Goal scheduler: the admission loop.
//!
//! One scheduling pass owns a pending set and a bounded set of in-flight
//! goal-runner calls. Each tick admits the highest-priority pending goal
//! whose weight fits the remaining agent budget, then suspends until at
//! least one active goal settles, the only blocking point in the loop,
//! and ages every goal still waiting.
//!
//! Admission never work-steals: when the top candidate does not fit the
//! remaining budget, the loop records a starvation-wait event and holds the
//! capacity open instead of launching a smaller, lower-priority goal past
//! it. Aging guarantees a blocked goal's effective priority only grows.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::models::{GoalPlan, GoalResult, GoalStatus, ResourcePlan, ScheduleSummary};
use crate::domain::ports::{GoalRunner, RunConfig};

/// Outcome of one scheduling pass.
#[derive(Debug, Clone)]
pub struct SchedulePass {
    /// Every goal's result, ordered by `source_index`.
    pub results: Vec<GoalResult>,
    /// The resource plan the pass ran under.
    pub resource_plan: ResourcePlan,
    /// Observability counters.
    pub summary: ScheduleSummary,
    /// Goals actually launched (as opposed to stopped before launch).
    pub launched: usize,
}

/// Run one scheduling pass over `plans` against the goal runner.
///
/// Per-goal failures are captured in the result set and never escape; with
/// `continue_on_error` false the first unresolved settle stops further
/// launches while already-active goals drain to completion.
pub async fn run_pass(
    plans: Vec<GoalPlan>,
    resource_plan: &ResourcePlan,
    continue_on_error: bool,
    dry_run: bool,
    runner: &dyn GoalRunner,
) -> SchedulePass {
    let goal_count = plans.len();
    let mut pending = plans;
    let mut active = FuturesUnordered::new();
    let mut used_slots: u32 = 0;
    let mut stop_launching = false;
    let mut launched = 0usize;
    let mut summary = ScheduleSummary::default();
    let mut results: Vec<GoalResult> = Vec::with_capacity(goal_count);

    info!(
        goal_count,
        effective_parallel = resource_plan.effective_parallel,
        agent_budget = ?resource_plan.agent_budget,
        strategy = resource_plan.strategy.as_str(),
        "scheduling pass started"
    );

    loop {
        // Admit as many goals as capacity and budget allow.
        while !stop_launching && (active.len() as u32) < resource_plan.effective_parallel {
            let Some(best) = best_candidate(&pending, resource_plan.aging_factor) else {
                break;
            };

            if let Some(budget) = resource_plan.agent_budget {
                if used_slots + pending[best].scheduling_weight > budget {
                    // The top candidate is blocked on budget; hold the slot
                    // open rather than launching past it.
                    summary.starvation_waits += 1;
                    debug!(
                        source_index = pending[best].goal.source_index,
                        weight = pending[best].scheduling_weight,
                        used_slots,
                        budget,
                        "top candidate blocked on budget, holding capacity"
                    );
                    break;
                }
            }

            let plan = pending.swap_remove(best);
            used_slots += plan.scheduling_weight;
            launched += 1;

            let run_config = RunConfig {
                max_parallel: resource_plan.per_goal_max_parallel,
                attempt: plan.goal.attempt,
                dry_run,
            };
            debug!(
                source_index = plan.goal.source_index,
                attempt = plan.goal.attempt,
                weight = plan.scheduling_weight,
                wait_ticks = plan.wait_ticks,
                "launching goal"
            );
            active.push(launch(plan, run_config, runner));
            summary.max_concurrent = summary.max_concurrent.max(active.len() as u32);
        }

        if active.is_empty() {
            // Nothing in flight: either everything settled, or the stop
            // flag is holding the remaining pending goals back.
            break;
        }

        // Await at least one completion, the only suspension point.
        if let Some((weight, result)) = active.next().await {
            used_slots -= weight;
            if result.is_unresolved() {
                if continue_on_error {
                    debug!(
                        source_index = result.source_index,
                        status = result.status.as_str(),
                        "goal unresolved, continuing"
                    );
                } else {
                    warn!(
                        source_index = result.source_index,
                        status = result.status.as_str(),
                        "goal unresolved, stopping further launches"
                    );
                    stop_launching = true;
                }
            }
            results.push(result);
        }

        // Age everything still waiting.
        for plan in &mut pending {
            plan.wait_ticks += 1;
            summary.max_wait_ticks = summary.max_wait_ticks.max(plan.wait_ticks);
        }
    }

    // Goals held back by the stop flag still get a result record.
    for plan in pending {
        results.push(GoalResult::stopped(
            &plan.goal,
            "not launched: batch stopped after an earlier failure",
        ));
    }

    // Callers always see original submission order, regardless of
    // completion order.
    results.sort_by_key(|r| (r.source_index, r.attempt));

    info!(
        launched,
        unresolved = results.iter().filter(|r| r.is_unresolved()).count(),
        max_concurrent = summary.max_concurrent,
        max_wait_ticks = summary.max_wait_ticks,
        starvation_waits = summary.starvation_waits,
        "scheduling pass finished"
    );

    SchedulePass {
        results,
        resource_plan: resource_plan.clone(),
        summary,
        launched,
    }
}

/// Index of the pending plan with the highest effective priority.
///
/// Ties break by lowest `source_index`, then highest scheduling weight.
fn best_candidate(pending: &[GoalPlan], aging_factor: f64) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (i, plan) in pending.iter().enumerate() {
        let Some(current) = best else {
            best = Some(i);
            continue;
        };
        if beats(plan, &pending[current], aging_factor) {
            best = Some(i);
        }
    }

    best
}

fn beats(a: &GoalPlan, b: &GoalPlan, aging_factor: f64) -> bool {
    let pa = a.effective_priority(aging_factor);
    let pb = b.effective_priority(aging_factor);
    if pa != pb {
        return pa > pb;
    }
    if a.goal.source_index != b.goal.source_index {
        return a.goal.source_index < b.goal.source_index;
    }
    a.scheduling_weight > b.scheduling_weight
}

/// Run one goal to settlement, capturing runner errors as results.
async fn launch(
    plan: GoalPlan,
    run_config: RunConfig,
    runner: &dyn GoalRunner,
) -> (u32, GoalResult) {
    let weight = plan.scheduling_weight;
    let goal = plan.goal;

    let result = match runner.run(&goal.text, &run_config).await {
        Ok(run) => GoalResult {
            source_index: goal.source_index,
            attempt: goal.attempt,
            status: run.status,
            sub_artifact_count: run.sub_artifact_count,
            rate_limit: run.rate_limit,
            error: run.diagnostics.filter(|_| run.status != GoalStatus::Completed),
            settled_at: chrono::Utc::now(),
        },
        Err(err) => GoalResult {
            source_index: goal.source_index,
            attempt: goal.attempt,
            status: GoalStatus::Error,
            sub_artifact_count: 0,
            rate_limit: Default::default(),
            error: Some(err.to_string()),
            settled_at: chrono::Utc::now(),
        },
    };

    (weight, result)
}
