//! Resource budget allocator.
//!
//! Computes the effective concurrency and per-goal capacity for one
//! scheduling pass via greedy weighted bin-packing: plan weights are sorted
//! ascending and accumulated into the agent budget until either the budget
//! or the base parallelism is exhausted.
//!
//! Contract: for a non-empty batch the allocator never returns zero
//! parallelism.

use tracing::debug;

use crate::domain::models::{GoalPlan, ResourcePlan, SchedulerConfig};

/// Compute the resource plan for one scheduling pass.
pub fn allocate(config: &SchedulerConfig, plans: &[GoalPlan]) -> ResourcePlan {
    let goal_count = plans.len() as u32;

    let effective_parallel = match config.agent_budget {
        None => config.base_parallel.min(goal_count).max(1),
        Some(budget) => {
            let mut weights: Vec<u32> = plans.iter().map(|p| p.scheduling_weight).collect();
            weights.sort_unstable();

            let mut used = 0u32;
            let mut count = 0u32;
            for weight in weights {
                if count >= config.base_parallel || used + weight > budget {
                    break;
                }
                used += weight;
                count += 1;
            }

            count.min(config.base_parallel).min(goal_count).max(1)
        }
    };

    let per_goal_max_parallel = per_goal_cap(config, effective_parallel);

    let plan = ResourcePlan {
        agent_budget: config.agent_budget,
        base_parallel: config.base_parallel,
        effective_parallel,
        per_goal_max_parallel,
        aging_factor: config.aging_factor,
        strategy: config.strategy,
    };

    debug!(
        goal_count,
        effective_parallel = plan.effective_parallel,
        per_goal_max_parallel = plan.per_goal_max_parallel,
        agent_budget = ?plan.agent_budget,
        "allocated resource plan"
    );

    plan
}

/// Inner-parallelism cap per goal-runner invocation.
///
/// Defaults to `max(1, floor(agent_budget / effective_parallel))`; an
/// explicit caller request is clamped to that same floor.
fn per_goal_cap(config: &SchedulerConfig, effective_parallel: u32) -> u32 {
    let floor = config
        .agent_budget
        .map_or(1, |budget| (budget / effective_parallel.max(1)).max(1));

    match config.per_goal_parallel {
        Some(requested) => requested.clamp(1, floor),
        None => floor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Goal, SchedulingStrategy};

    fn plan_with_weight(index: usize, weight: u32) -> GoalPlan {
        GoalPlan {
            goal: Goal::new(format!("g{index}"), index),
            complexity_weight: weight,
            criticality_weight: 1,
            scheduling_weight: weight,
            base_priority: -(index as i64),
            wait_ticks: 0,
        }
    }

    fn config(base_parallel: u32, agent_budget: Option<u32>) -> SchedulerConfig {
        SchedulerConfig {
            base_parallel,
            agent_budget,
            per_goal_parallel: None,
            aging_factor: 1.0,
            strategy: SchedulingStrategy::Fifo,
            continue_on_error: true,
        }
    }

    #[test]
    fn test_unlimited_budget_caps_at_goal_count() {
        let plans: Vec<_> = (0..3).map(|i| plan_with_weight(i, 1)).collect();
        let plan = allocate(&config(8, None), &plans);
        assert_eq!(plan.effective_parallel, 3);
        assert_eq!(plan.per_goal_max_parallel, 1);
    }

    #[test]
    fn test_greedy_packing_respects_budget() {
        // Weights 1, 1, 3 into budget 4: greedy ascending fits 1+1 and
        // stops before the 3.
        let plans = vec![
            plan_with_weight(0, 3),
            plan_with_weight(1, 1),
            plan_with_weight(2, 1),
        ];
        let plan = allocate(&config(8, Some(4)), &plans);
        assert_eq!(plan.effective_parallel, 2); // 1 + 1 fit; the 3 would overflow
    }

    #[test]
    fn test_heavy_goal_never_zeroes_parallelism() {
        // A single goal heavier than the budget still gets one slot.
        let plans = vec![plan_with_weight(0, 3)];
        let plan = allocate(&config(4, Some(2)), &plans);
        assert_eq!(plan.effective_parallel, 1);
    }

    #[test]
    fn test_base_parallel_bounds_packing() {
        let plans: Vec<_> = (0..10).map(|i| plan_with_weight(i, 1)).collect();
        let plan = allocate(&config(2, Some(10)), &plans);
        assert_eq!(plan.effective_parallel, 2);
        // floor(10 / 2) = 5 inner slots per goal.
        assert_eq!(plan.per_goal_max_parallel, 5);
    }

    #[test]
    fn test_explicit_per_goal_cap_is_clamped() {
        let plans: Vec<_> = (0..4).map(|i| plan_with_weight(i, 1)).collect();
        let mut cfg = config(2, Some(4));
        cfg.per_goal_parallel = Some(9);
        let plan = allocate(&cfg, &plans);
        // floor(4 / 2) = 2; the requested 9 clamps down.
        assert_eq!(plan.per_goal_max_parallel, 2);

        cfg.per_goal_parallel = Some(1);
        let plan = allocate(&cfg, &plans);
        assert_eq!(plan.per_goal_max_parallel, 1);
    }
}
