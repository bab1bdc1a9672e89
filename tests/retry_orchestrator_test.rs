//! Retry convergence and backpressure monotonicity.

use overlord::domain::models::{
    BackpressureLevel, BatchStatus, Goal, RateLimitTelemetry, RetryConfig, SchedulerConfig,
};
use overlord::infrastructure::runners::{MockGoalRunner, MockResponse};
use overlord::services::RetryOrchestrator;

fn scheduler_config(parallel: u32, budget: Option<u32>) -> SchedulerConfig {
    SchedulerConfig {
        base_parallel: parallel,
        agent_budget: budget,
        ..Default::default()
    }
}

fn retry_until(max_rounds: u32) -> RetryConfig {
    RetryConfig {
        retry_until_complete: true,
        max_rounds,
        ..Default::default()
    }
}

/// A goal runner that always succeeds on its second attempt converges the
/// batch when at least two rounds are allowed.
#[tokio::test]
async fn second_attempt_success_converges() {
    let runner = MockGoalRunner::new();
    runner.set_response("g0", MockResponse::flaky_until(2)).await;
    runner.set_response("g1", MockResponse::flaky_until(2)).await;

    let orchestrator = RetryOrchestrator::new(scheduler_config(2, None), retry_until(3));
    let goals = vec![Goal::new("g0", 0), Goal::new("g1", 1)];
    let outcome = orchestrator.run(goals, &runner).await;

    assert_eq!(outcome.batch_status, BatchStatus::Completed);
    assert_eq!(outcome.rounds.len(), 2);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.attempt == 2));
    assert!(outcome.recommendation.is_none());
}

/// Severe rate-limit pressure halves the next round's concurrency and
/// budget, and neither ever drops below one.
#[tokio::test]
async fn severe_backpressure_shrinks_next_round() {
    let runner = MockGoalRunner::new();
    // Each attempt reports heavy pressure; goals resolve on attempt 3.
    let telemetry = RateLimitTelemetry {
        signal_count: 2,
        total_backoff_ms: 5_000,
        last_launch_hold_ms: 2_500,
    };
    for i in 0..2 {
        runner
            .set_response(
                format!("g{i}"),
                MockResponse::flaky_until(3).with_rate_limit(telemetry),
            )
            .await;
    }

    let orchestrator = RetryOrchestrator::new(scheduler_config(4, Some(4)), retry_until(4));
    let goals = vec![Goal::new("g0", 0), Goal::new("g1", 1)];
    let outcome = orchestrator.run(goals, &runner).await;

    assert_eq!(outcome.batch_status, BatchStatus::Completed);
    assert!(outcome.rounds.len() >= 3);

    for pair in outcome.rounds.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.backpressure == BackpressureLevel::Severe {
            assert!(next.applied_concurrency <= prev.applied_concurrency);
            assert!(next.applied_budget.unwrap() <= prev.applied_budget.unwrap());
        }
        assert!(next.applied_concurrency >= 1);
        assert!(next.applied_budget.unwrap() >= 1);
    }

    // Round 1 saw severe pressure, so round 2 runs halved.
    assert_eq!(outcome.rounds[0].applied_concurrency, 4);
    assert_eq!(outcome.rounds[0].backpressure, BackpressureLevel::Severe);
    assert_eq!(outcome.rounds[1].applied_concurrency, 2);
    assert_eq!(outcome.rounds[1].applied_budget, Some(2));
}

/// Exhausted retries under pressure mark the survivors stopped and emit a
/// structured recovery recommendation.
#[tokio::test]
async fn exhaustion_with_pressure_emits_recommendation() {
    let runner = MockGoalRunner::new();
    let telemetry = RateLimitTelemetry {
        signal_count: 3,
        total_backoff_ms: 6_000,
        last_launch_hold_ms: 0,
    };
    runner
        .set_response(
            "stuck goal",
            MockResponse::failure("resource exhausted").with_rate_limit(telemetry),
        )
        .await;

    let orchestrator = RetryOrchestrator::new(scheduler_config(2, Some(2)), retry_until(2));
    let outcome = orchestrator
        .run(vec![Goal::new("stuck goal", 0)], &runner)
        .await;

    assert_eq!(outcome.batch_status, BatchStatus::Failed);
    assert_eq!(outcome.rounds.len(), 2);

    let result = &outcome.results[0];
    assert_eq!(result.status, overlord::domain::models::GoalStatus::Stopped);
    assert!(result.error.as_deref().unwrap().contains("retry budget exhausted"));

    let rec = outcome.recommendation.expect("recommendation present");
    assert!(rec.suggested_concurrency >= 1);
    assert!(rec.suggested_max_rounds > 2);
}

/// Without retry-until-complete the fixed round count applies.
#[tokio::test]
async fn fixed_rounds_bound_retries() {
    let runner = MockGoalRunner::new();
    runner
        .set_response("never", MockResponse::failure("always fails"))
        .await;

    let retry = RetryConfig {
        retry_until_complete: false,
        fixed_rounds: 2,
        ..Default::default()
    };
    let orchestrator = RetryOrchestrator::new(scheduler_config(1, None), retry);
    let outcome = orchestrator.run(vec![Goal::new("never", 0)], &runner).await;

    assert_eq!(outcome.rounds.len(), 2);
    assert_eq!(runner.calls().await.len(), 2);
    assert_eq!(outcome.batch_status, BatchStatus::Failed);
}
