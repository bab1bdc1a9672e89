//! Failure clusters and remediation actions.
//!
//! Clusters are derived fresh from each batch's results and never persisted;
//! remediation actions are ranked advice about scheduling/retry configuration
//! changes.

use serde::{Deserialize, Serialize};

/// Reported goal indexes per cluster are capped at this many.
pub const MAX_CLUSTER_GOAL_INDEXES: usize = 20;

/// At most this many remediation actions are reported per batch.
pub const MAX_REMEDIATION_ACTIONS: usize = 5;

/// A group of failed goals sharing a normalized error signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCluster {
    /// `status:normalized-signature` grouping key.
    pub signature: String,
    /// The shared status of the clustered results.
    pub status: String,
    /// How many results fell into this cluster.
    pub count: usize,
    /// Goal text of the first member, for context.
    pub example_goal: String,
    /// Raw error text of the first member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_error: Option<String>,
    /// Source indexes of members, capped at [`MAX_CLUSTER_GOAL_INDEXES`].
    pub goal_indexes: Vec<usize>,
}

/// Urgency ranking of a remediation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationPriority {
    High,
    Medium,
    Low,
    Monitor,
}

impl RemediationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Monitor => "monitor",
        }
    }
}

/// A concrete change to scheduling/retry configuration that an action
/// recommends applying before resuming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_budget: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_max_rounds: Option<u32>,
    /// Run quality gates before, not after, the bulk of the batch.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub front_load_gates: bool,
}

/// One ranked piece of remediation advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationAction {
    /// Urgency of this action.
    pub priority: RemediationPriority,
    /// Short imperative name of the action.
    pub action: String,
    /// Why this action is suggested.
    pub reason: String,
    /// Optional concrete configuration change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_patch: Option<StrategyPatch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(RemediationPriority::High < RemediationPriority::Medium);
        assert!(RemediationPriority::Medium < RemediationPriority::Low);
        assert!(RemediationPriority::Low < RemediationPriority::Monitor);
    }

    #[test]
    fn test_strategy_patch_skips_empty_fields() {
        let patch = StrategyPatch {
            concurrency: Some(2),
            agent_budget: Some(2),
            ..Default::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert!(json.contains("concurrency"));
        assert!(!json.contains("retry_max_rounds"));
        assert!(!json.contains("front_load_gates"));
    }
}
