//! Retry round records and adaptive backpressure.
//!
//! The retry orchestrator classifies observed rate-limit telemetry into a
//! [`BackpressureLevel`] per round and shrinks the next round's concurrency
//! and budget accordingly. The cut-offs are empirically chosen constants
//! carried on [`BackpressureThresholds`] so deployments can override them.

use serde::{Deserialize, Serialize};

/// Severity of rate-limit pressure observed in one retry round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressureLevel {
    /// No rate-limit signal observed.
    None,
    /// Some pressure: decrement concurrency and budget by one (min 1).
    Mild,
    /// Heavy pressure: halve concurrency and budget (floor, min 1).
    Severe,
}

impl BackpressureLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Mild => "mild",
            Self::Severe => "severe",
        }
    }
}

/// Cut-offs for classifying rate-limit pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackpressureThresholds {
    /// Signals per input goal at or above which pressure is severe.
    pub severe_signals_per_goal: f64,
    /// Total backoff milliseconds at or above which pressure is severe.
    pub severe_backoff_ms: u64,
    /// Launch-hold milliseconds at or above which pressure is severe.
    pub severe_launch_hold_ms: u64,
}

impl Default for BackpressureThresholds {
    fn default() -> Self {
        Self {
            severe_signals_per_goal: 1.5,
            severe_backoff_ms: 4_000,
            severe_launch_hold_ms: 2_000,
        }
    }
}

/// One retry round's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryRoundRecord {
    /// Round number, starting at 1.
    pub round: u32,
    /// Goals submitted into this round.
    pub input_goals: usize,
    /// Goals the scheduler actually launched.
    pub processed_goals: usize,
    /// Goals that settled unresolved.
    pub failed_goals: usize,
    /// Goals never launched (stop-launching flag).
    pub unprocessed_goals: usize,
    /// Concurrency the round ran with.
    pub applied_concurrency: u32,
    /// Agent budget the round ran with, if any.
    pub applied_budget: Option<u32>,
    /// Total rate-limit signals observed across the round.
    pub rate_limit_signals: u32,
    /// Pressure classification for this round.
    pub backpressure: BackpressureLevel,
}

/// Structured advice emitted when retries exhaust under rate-limit pressure.
///
/// The caller acts on this externally; the orchestrator itself stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRecommendation {
    /// Suggested concurrency for a future resume.
    pub suggested_concurrency: u32,
    /// Suggested agent budget for a future resume.
    pub suggested_budget: Option<u32>,
    /// Suggested retry-round ceiling for a future resume.
    pub suggested_max_rounds: u32,
    /// Human-readable rationale.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = BackpressureThresholds::default();
        assert!((t.severe_signals_per_goal - 1.5).abs() < f64::EPSILON);
        assert_eq!(t.severe_backoff_ms, 4_000);
        assert_eq!(t.severe_launch_hold_ms, 2_000);
    }
}
