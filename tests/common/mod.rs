//! Shared helpers for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;

use overlord::domain::error::RunnerError;
use overlord::domain::models::{Goal, GoalPlan, GoalStatus, RateLimitTelemetry};
use overlord::domain::ports::{GoalRunner, RunConfig, RunResult};

/// Runner that tracks the summed scheduling weight of concurrently running
/// goals, for asserting the budget invariant.
pub struct BudgetTrackingRunner {
    weights: HashMap<String, u32>,
    current_weight: AtomicU32,
    max_weight_seen: AtomicU32,
    launches: StdMutex<Vec<String>>,
}

impl BudgetTrackingRunner {
    pub fn new(weights: HashMap<String, u32>) -> Self {
        Self {
            weights,
            current_weight: AtomicU32::new(0),
            max_weight_seen: AtomicU32::new(0),
            launches: StdMutex::new(Vec::new()),
        }
    }

    /// Highest concurrent summed weight observed.
    pub fn max_weight_seen(&self) -> u32 {
        self.max_weight_seen.load(Ordering::SeqCst)
    }

    /// Goal texts in launch order.
    pub fn launches(&self) -> Vec<String> {
        self.launches.lock().unwrap().clone()
    }
}

#[async_trait]
impl GoalRunner for BudgetTrackingRunner {
    fn name(&self) -> &'static str {
        "budget-tracking"
    }

    async fn run(&self, goal_text: &str, _config: &RunConfig) -> Result<RunResult, RunnerError> {
        let weight = self.weights.get(goal_text).copied().unwrap_or(1);
        self.launches.lock().unwrap().push(goal_text.to_string());

        let now = self.current_weight.fetch_add(weight, Ordering::SeqCst) + weight;
        self.max_weight_seen.fetch_max(now, Ordering::SeqCst);

        // Hold the weight long enough for other launches to overlap.
        tokio::time::sleep(Duration::from_millis(2)).await;

        self.current_weight.fetch_sub(weight, Ordering::SeqCst);
        Ok(RunResult {
            status: GoalStatus::Completed,
            sub_artifact_count: 1,
            rate_limit: RateLimitTelemetry::default(),
            diagnostics: None,
        })
    }
}

/// Build a plan directly, bypassing the text heuristics.
pub fn plan(index: usize, text: &str, weight: u32, base_priority: i64) -> GoalPlan {
    GoalPlan {
        goal: Goal::new(text, index),
        complexity_weight: weight,
        criticality_weight: 1,
        scheduling_weight: weight,
        base_priority,
        wait_ticks: 0,
    }
}
