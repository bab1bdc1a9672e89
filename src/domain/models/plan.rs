//! Scheduling plans derived from goals.
//!
//! A [`GoalPlan`] carries the weights and priority the scheduler needs:
//! complexity and criticality weights in `1..=3`, the budget slots the goal
//! occupies while active, a strategy-dependent base priority, and the aging
//! counter bumped once per scheduling tick spent waiting.

use serde::{Deserialize, Serialize};

use super::goal::Goal;

/// Order in which goals are admitted by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulingStrategy {
    /// Submission order.
    Fifo,
    /// Heaviest complexity first.
    ComplexFirst,
    /// Lightest complexity first.
    ComplexLast,
    /// Criticality dominates, then complexity.
    CriticalFirst,
}

impl Default for SchedulingStrategy {
    fn default() -> Self {
        Self::Fifo
    }
}

impl SchedulingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "fifo",
            Self::ComplexFirst => "complex-first",
            Self::ComplexLast => "complex-last",
            Self::CriticalFirst => "critical-first",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fifo" => Some(Self::Fifo),
            "complex-first" => Some(Self::ComplexFirst),
            "complex-last" => Some(Self::ComplexLast),
            "critical-first" => Some(Self::CriticalFirst),
            _ => None,
        }
    }
}

/// A goal annotated with everything the admission loop needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPlan {
    /// The underlying goal.
    pub goal: Goal,
    /// Estimated complexity in `1..=3`.
    pub complexity_weight: u32,
    /// Estimated criticality in `1..=3`.
    pub criticality_weight: u32,
    /// Budget slots this goal occupies while active.
    pub scheduling_weight: u32,
    /// Strategy-dependent static priority. Higher schedules first.
    pub base_priority: i64,
    /// Ticks spent pending; bumped once per scheduling tick while waiting.
    pub wait_ticks: u32,
}

impl GoalPlan {
    /// Effective priority after aging.
    ///
    /// With `aging_factor == 0` this reduces to the pure base priority, so
    /// ties keep breaking by insertion index and no starvation prevention
    /// applies.
    pub fn effective_priority(&self, aging_factor: f64) -> f64 {
        self.base_priority as f64 + f64::from(self.wait_ticks) * aging_factor
    }
}
