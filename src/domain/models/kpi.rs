//! KPI run records, period buckets, and anomalies.
//!
//! Buckets are pure aggregates recomputed on each query; only run records
//! are persisted. Anomaly detection compares the most recent bucket against
//! the mean of all prior buckets; the thresholds are empirical constants
//! carried on [`AnomalyThresholds`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Granularity of KPI period bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    /// ISO-8601 week (`YYYY-Www`), UTC.
    Week,
    /// Calendar day (`YYYY-MM-DD`), UTC.
    Day,
}

impl Default for PeriodUnit {
    fn default() -> Self {
        Self::Week
    }
}

/// One archived run summary, the enumerable KPI source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Mode label of the run (e.g. `"batch"`, `"recovery"`).
    pub mode: String,
    /// Final batch status string.
    pub status: String,
    /// When the run completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Fallback timestamp when `completed_at` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Percentage of goals that resolved, `0.0..=100.0`.
    pub success_rate_percent: f64,
    /// Percentage of goals that ran to completion out of those launched.
    pub completion_rate_percent: f64,
    /// Goals left unresolved at the end of the run.
    pub failed_goals: u32,
    /// Total sub-artifacts reported by the runner across the batch.
    pub total_sub_artifacts: u32,
    /// Artifacts the run estimated it created.
    pub estimated_created: u32,
    /// Whether the external quality gate passed for this run.
    #[serde(default)]
    pub gate_passed: bool,
    /// Rate-limit signals observed across the run.
    #[serde(default)]
    pub rate_limit_signals: u32,
    /// Total rate-limit backoff across the run, milliseconds.
    #[serde(default)]
    pub rate_limit_backoff_ms: u64,
}

impl RunRecord {
    /// The timestamp used for period bucketing: completion time, falling
    /// back to the update time.
    pub fn effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.completed_at.or(self.updated_at)
    }
}

/// Aggregate KPI values for one period.
///
/// All `avg_*` fields are averages over the runs in the period; the `*_runs`
/// fields are raw counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiBucket {
    /// Period key (`YYYY-Www` or `YYYY-MM-DD`).
    pub period: String,
    /// Runs whose completion timestamp maps to this period.
    pub runs: usize,
    /// Runs that finished with a completed status.
    pub completed_runs: usize,
    /// Runs that did not.
    pub non_completed_runs: usize,
    /// Runs whose quality gate passed.
    pub gate_passed_runs: usize,
    /// Average success rate percentage.
    pub avg_success_rate: f64,
    /// Average completion rate percentage.
    pub avg_completion_rate: f64,
    /// Average unresolved-goal count.
    pub avg_failed_goals: f64,
    /// Average sub-artifact count.
    pub avg_sub_artifacts: f64,
    /// Average estimated-created count.
    pub avg_estimated_created: f64,
    /// Average rate-limit signal count.
    pub avg_rate_limit_signals: f64,
    /// Average rate-limit backoff, milliseconds.
    pub avg_rate_limit_backoff_ms: f64,
}

/// Kinds of KPI anomaly the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyType {
    SuccessRateDrop,
    FailedGoalsRise,
    GrowthSpike,
    RateLimitPressure,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuccessRateDrop => "success-rate-drop",
            Self::FailedGoalsRise => "failed-goals-rise",
            Self::GrowthSpike => "growth-spike",
            Self::RateLimitPressure => "rate-limit-pressure",
        }
    }
}

/// Severity of a detected anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Medium,
    High,
}

/// A statistically significant deviation of the latest period from its
/// trailing baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// What deviated.
    pub anomaly_type: AnomalyType,
    /// How badly.
    pub severity: AnomalySeverity,
    /// Metric name, for reporting.
    pub metric: String,
    /// Mean of all buckets before the latest.
    pub baseline_value: f64,
    /// The latest bucket's value.
    pub latest_value: f64,
    /// Deviation in the bad direction (always positive when anomalous).
    pub delta: f64,
}

/// Detection cut-offs per metric: `(medium, high)` deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// Success-rate drop in percentage points.
    pub success_rate_drop: (f64, f64),
    /// Rise in average failed-goal count.
    pub failed_goals_rise: (f64, f64),
    /// Rise in average estimated-created count.
    pub growth_spike: (f64, f64),
    /// Rise in average rate-limit signal count.
    pub rate_limit_rise: (f64, f64),
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            success_rate_drop: (20.0, 35.0),
            failed_goals_rise: (2.0, 4.0),
            growth_spike: (3.0, 6.0),
            rate_limit_rise: (1.0, 2.0),
        }
    }
}
