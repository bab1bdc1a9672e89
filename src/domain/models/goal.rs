//! Goal domain model.
//!
//! A goal is one unit of requested autonomous work, identified by its
//! position in the submitted batch and a retry attempt counter. Retrying a
//! goal creates a fresh record with `attempt + 1` pointing at the same
//! `source_index`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a goal after the goal runner settles (or declines to run) it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// Goal ran to completion successfully.
    Completed,
    /// Goal ran and reported failure.
    Failed,
    /// The goal runner raised an error before producing a result.
    Error,
    /// The goal runner produced an unrecognized status.
    Unknown,
    /// Goal was never launched (batch stop or retry budget exhausted).
    Stopped,
    /// Dry-run: the goal was planned but not executed.
    Planned,
    /// Dry-run: inputs were prepared but nothing was executed.
    Prepared,
}

impl Default for GoalStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Unknown => "unknown",
            Self::Stopped => "stopped",
            Self::Planned => "planned",
            Self::Prepared => "prepared",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "error" => Some(Self::Error),
            "unknown" => Some(Self::Unknown),
            "stopped" => Some(Self::Stopped),
            "planned" => Some(Self::Planned),
            "prepared" => Some(Self::Prepared),
            _ => None,
        }
    }

    /// Whether this status leaves the goal unresolved.
    ///
    /// Unresolved goals become the next retry round's input and drive the
    /// batch status. `Planned`/`Prepared` are dry-run outcomes and count as
    /// resolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Failed | Self::Error | Self::Unknown | Self::Stopped)
    }
}

/// One unit of requested autonomous work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// The natural-language work description.
    pub text: String,
    /// Position in the originally submitted batch. Stable across retries.
    pub source_index: usize,
    /// Retry attempt, starting at 1 for the first run.
    pub attempt: u32,
}

impl Goal {
    /// Create a first-attempt goal.
    pub fn new(text: impl Into<String>, source_index: usize) -> Self {
        Self {
            text: text.into(),
            source_index,
            attempt: 1,
        }
    }

    /// Derive the next-attempt goal for a retry round.
    pub fn next_attempt(&self) -> Self {
        Self {
            text: self.text.clone(),
            source_index: self.source_index,
            attempt: self.attempt + 1,
        }
    }
}

/// Rate-limit telemetry reported by the goal runner for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitTelemetry {
    /// Number of rate-limit signals observed during the run.
    pub signal_count: u32,
    /// Total milliseconds spent backing off.
    pub total_backoff_ms: u64,
    /// Milliseconds the last launch was held before starting.
    pub last_launch_hold_ms: u64,
}

impl RateLimitTelemetry {
    /// Whether any rate-limit pressure was observed at all.
    pub fn any_pressure(&self) -> bool {
        self.signal_count > 0 || self.total_backoff_ms > 0 || self.last_launch_hold_ms > 0
    }
}

/// Immutable record of one launched (or deliberately skipped) goal.
///
/// Created once per goal per scheduling pass; never mutated after the goal
/// runner resolves or rejects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalResult {
    /// Position in the originally submitted batch.
    pub source_index: usize,
    /// Which attempt produced this result.
    pub attempt: u32,
    /// Terminal status for this attempt.
    pub status: GoalStatus,
    /// Number of sub-artifacts the runner reported producing.
    pub sub_artifact_count: u32,
    /// Rate-limit telemetry from the runner.
    pub rate_limit: RateLimitTelemetry,
    /// Error text, for failed/error/stopped goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the result settled.
    pub settled_at: DateTime<Utc>,
}

impl GoalResult {
    /// Record a goal that was never launched.
    pub fn stopped(goal: &Goal, reason: impl Into<String>) -> Self {
        Self {
            source_index: goal.source_index,
            attempt: goal.attempt,
            status: GoalStatus::Stopped,
            sub_artifact_count: 0,
            rate_limit: RateLimitTelemetry::default(),
            error: Some(reason.into()),
            settled_at: Utc::now(),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.status.is_unresolved()
    }
}

/// Overall outcome of a batch, derived purely from the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every goal resolved.
    Completed,
    /// Some goals resolved, some did not.
    PartialFailed,
    /// No goal resolved.
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::PartialFailed => "partial-failed",
            Self::Failed => "failed",
        }
    }

    /// Derive the batch status from a complete result set.
    pub fn from_results(results: &[GoalResult]) -> Self {
        let unresolved = results.iter().filter(|r| r.is_unresolved()).count();
        if unresolved == 0 {
            Self::Completed
        } else if unresolved == results.len() {
            Self::Failed
        } else {
            Self::PartialFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_next_attempt() {
        let goal = Goal::new("migrate the schema", 3);
        assert_eq!(goal.attempt, 1);

        let retry = goal.next_attempt();
        assert_eq!(retry.source_index, 3);
        assert_eq!(retry.attempt, 2);
        assert_eq!(retry.text, goal.text);
    }

    #[test]
    fn test_status_unresolved_set() {
        assert!(GoalStatus::Failed.is_unresolved());
        assert!(GoalStatus::Error.is_unresolved());
        assert!(GoalStatus::Unknown.is_unresolved());
        assert!(GoalStatus::Stopped.is_unresolved());
        assert!(!GoalStatus::Completed.is_unresolved());
        assert!(!GoalStatus::Planned.is_unresolved());
        assert!(!GoalStatus::Prepared.is_unresolved());
    }

    #[test]
    fn test_status_roundtrip() {
        for s in [
            GoalStatus::Completed,
            GoalStatus::Failed,
            GoalStatus::Error,
            GoalStatus::Unknown,
            GoalStatus::Stopped,
            GoalStatus::Planned,
            GoalStatus::Prepared,
        ] {
            assert_eq!(GoalStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(GoalStatus::from_str("complete"), Some(GoalStatus::Completed));
        assert_eq!(GoalStatus::from_str("nope"), None);
    }

    #[test]
    fn test_batch_status_derivation() {
        let goal = Goal::new("g", 0);
        let ok = GoalResult {
            source_index: 0,
            attempt: 1,
            status: GoalStatus::Completed,
            sub_artifact_count: 1,
            rate_limit: RateLimitTelemetry::default(),
            error: None,
            settled_at: Utc::now(),
        };
        let bad = GoalResult::stopped(&goal, "never launched");

        assert_eq!(BatchStatus::from_results(&[ok.clone()]), BatchStatus::Completed);
        assert_eq!(
            BatchStatus::from_results(&[ok, bad.clone()]),
            BatchStatus::PartialFailed
        );
        assert_eq!(BatchStatus::from_results(&[bad]), BatchStatus::Failed);
    }

    #[test]
    fn test_telemetry_pressure() {
        assert!(!RateLimitTelemetry::default().any_pressure());
        let t = RateLimitTelemetry {
            signal_count: 0,
            total_backoff_ms: 1200,
            last_launch_hold_ms: 0,
        };
        assert!(t.any_pressure());
    }
}
