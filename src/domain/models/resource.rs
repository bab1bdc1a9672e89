//! Resource plans and scheduling summaries.

use serde::{Deserialize, Serialize};

use super::plan::SchedulingStrategy;

/// Concurrency/budget envelope computed by the budget allocator and applied
/// by one scheduling pass.
///
/// Invariants: `effective_parallel <= min(base_parallel, goal_count)`, and
/// while the pass runs the summed scheduling weight of active goals never
/// exceeds `agent_budget` (when set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePlan {
    /// Total concurrent weighted capacity, `None` for unlimited.
    pub agent_budget: Option<u32>,
    /// Caller-requested parallelism ceiling.
    pub base_parallel: u32,
    /// Concurrent launches this pass will actually use.
    pub effective_parallel: u32,
    /// Inner-parallelism cap handed to each goal-runner invocation.
    pub per_goal_max_parallel: u32,
    /// Priority boost per tick spent waiting.
    pub aging_factor: f64,
    /// Admission order policy.
    pub strategy: SchedulingStrategy,
}

/// Observability counters reported by one scheduling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Peak number of concurrently active goals.
    pub max_concurrent: u32,
    /// Largest wait-tick count any goal accumulated before launch.
    pub max_wait_ticks: u32,
    /// Times the top-priority candidate was blocked on budget and the
    /// admission loop held the slot open rather than launching a smaller
    /// lower-priority goal past it.
    pub starvation_waits: u32,
}
