//! End-to-end admission scenarios through the plan builder, allocator and
//! scheduler.

mod common;

use std::collections::HashMap;

use common::BudgetTrackingRunner;
use overlord::domain::models::{Goal, SchedulerConfig, SchedulingStrategy};
use overlord::services::{budget_allocator, scheduler, PlanBuilder};

/// A complex goal submitted second is admitted first under complex-first
/// scheduling, even when its weight consumes the whole budget.
#[tokio::test]
async fn complex_goal_admitted_first() {
    let config = SchedulerConfig {
        base_parallel: 2,
        agent_budget: Some(2),
        strategy: SchedulingStrategy::ComplexFirst,
        ..Default::default()
    };

    let goals = vec![Goal::new("g0", 0), Goal::new("g1", 1), Goal::new("g2", 2)];
    // g1 carries an explicit sub-unit hint that scores complexity 3; the
    // others stay at 1.
    let builder = PlanBuilder::new(config.strategy, config.agent_budget);
    let plans = builder.build(&goals, &[None, Some(5), None]);

    assert_eq!(plans[1].complexity_weight, 3);
    assert_eq!(plans[1].scheduling_weight, 2); // clamped to the budget

    let weights: HashMap<String, u32> = plans
        .iter()
        .map(|p| (p.goal.text.clone(), p.scheduling_weight))
        .collect();
    let runner = BudgetTrackingRunner::new(weights);

    let resource_plan = budget_allocator::allocate(&config, &plans);
    let pass = scheduler::run_pass(plans, &resource_plan, true, false, &runner).await;

    assert_eq!(runner.launches()[0], "g1");
    assert!(runner.max_weight_seen() <= 2);
    assert_eq!(pass.results.len(), 3);
    let indexes: Vec<usize> = pass.results.iter().map(|r| r.source_index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

/// Goals that age identically never reorder: a huge aging factor still
/// preserves FIFO order because every pending goal gains the same boost
/// per tick.
#[tokio::test]
async fn uniform_aging_preserves_fifo_order() {
    let config = SchedulerConfig {
        base_parallel: 1,
        agent_budget: None,
        aging_factor: 100.0,
        strategy: SchedulingStrategy::Fifo,
        ..Default::default()
    };

    let goals: Vec<Goal> = (0..4).map(|i| Goal::new(format!("g{i}"), i)).collect();
    let builder = PlanBuilder::new(config.strategy, config.agent_budget);
    let plans = builder.build(&goals, &[None, None, None, None]);

    let weights: HashMap<String, u32> =
        plans.iter().map(|p| (p.goal.text.clone(), 1)).collect();
    let runner = BudgetTrackingRunner::new(weights);
    let resource_plan = budget_allocator::allocate(&config, &plans);

    scheduler::run_pass(plans, &resource_plan, true, false, &runner).await;

    assert_eq!(runner.launches(), vec!["g0", "g1", "g2", "g3"]);
}
