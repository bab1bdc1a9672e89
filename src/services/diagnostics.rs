//! Failure diagnostics: signature normalization, clustering, remediation.
//!
//! Error signatures collapse the noise that varies between repeats of the
//! same failure (digit runs, filesystem paths, quotes) so clustering and
//! the recovery memory both see stable keys.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::models::{
    FailureCluster, GoalResult, RemediationAction, RemediationPriority, StrategyPatch,
    MAX_CLUSTER_GOAL_INDEXES, MAX_REMEDIATION_ACTIONS,
};

/// Normalized signatures are truncated to this many characters.
const SIGNATURE_MAX_LEN: usize = 120;

static DIGIT_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static PATH_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[A-Za-z]:)?(?:[\w.#~-]*[/\\])+[\w.#~-]*").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Vocabulary that indicates timeout or resource exhaustion failures.
const TIMEOUT_RESOURCE_VOCAB: &[&str] = &[
    "timeout",
    "timed out",
    "deadline",
    "resource",
    "memory",
    "oom",
    "overload",
    "rate limit",
    "throttle",
    "capacity",
];

/// Vocabulary that indicates quality or test failures.
const QUALITY_VOCAB: &[&str] = &[
    "test",
    "assert",
    "lint",
    "quality",
    "coverage",
    "regression",
    "validation",
    "gate",
];

/// Collapse an error message to a stable signature.
///
/// Lowercase, digit runs become `#`, path-like substrings become `<path>`,
/// quotes are stripped, whitespace collapses, and the result truncates to
/// 120 characters.
pub fn normalize_error_signature(message: &str) -> String {
    let lowered = message.to_lowercase();
    let no_paths = PATH_LIKE.replace_all(&lowered, "<path>");
    let no_digits = DIGIT_RUNS.replace_all(&no_paths, "#");
    let no_quotes: String = no_digits
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`'))
        .collect();
    let collapsed = WHITESPACE.replace_all(no_quotes.trim(), " ");

    collapsed.chars().take(SIGNATURE_MAX_LEN).collect()
}

/// Group failed results by `status:normalized-signature`.
///
/// Clusters sort by count descending then signature ascending; reported
/// goal indexes are capped at 20 per cluster.
pub fn cluster_failures(results: &[GoalResult], goal_texts: &[String]) -> Vec<FailureCluster> {
    let mut groups: BTreeMap<String, FailureCluster> = BTreeMap::new();

    for result in results.iter().filter(|r| r.is_unresolved()) {
        let error_sig = result
            .error
            .as_deref()
            .map_or_else(|| "no-error-detail".to_string(), normalize_error_signature);
        let key = format!("{}:{}", result.status.as_str(), error_sig);

        let cluster = groups.entry(key.clone()).or_insert_with(|| FailureCluster {
            signature: key,
            status: result.status.as_str().to_string(),
            count: 0,
            example_goal: goal_texts
                .get(result.source_index)
                .cloned()
                .unwrap_or_default(),
            example_error: result.error.clone(),
            goal_indexes: Vec::new(),
        });
        cluster.count += 1;
        if cluster.goal_indexes.len() < MAX_CLUSTER_GOAL_INDEXES {
            cluster.goal_indexes.push(result.source_index);
        }
    }

    let mut clusters: Vec<FailureCluster> = groups.into_values().collect();
    clusters.sort_by(|a, b| b.count.cmp(&a.count).then(a.signature.cmp(&b.signature)));

    debug!(clusters = clusters.len(), "clustered failed results");
    clusters
}

/// Derive ranked remediation actions from a finished batch.
///
/// With no failures a single `monitor` action is returned. Otherwise a
/// "resume unresolved goals" high action always leads, followed by advice
/// driven by round exhaustion and cluster vocabulary, capped at 5 actions
/// ordered by priority then insertion.
pub fn remediation_actions(
    unresolved_count: usize,
    rounds_exhausted: bool,
    clusters: &[FailureCluster],
) -> Vec<RemediationAction> {
    if unresolved_count == 0 {
        return vec![RemediationAction {
            priority: RemediationPriority::Monitor,
            action: "monitor".to_string(),
            reason: "no unresolved goals; keep watching KPI trends".to_string(),
            strategy_patch: None,
        }];
    }

    let mut actions = vec![RemediationAction {
        priority: RemediationPriority::High,
        action: "resume unresolved goals".to_string(),
        reason: format!("{unresolved_count} goal(s) remain unresolved"),
        strategy_patch: None,
    }];

    if rounds_exhausted {
        actions.push(RemediationAction {
            priority: RemediationPriority::High,
            action: "increase retry ceiling or shrink scope".to_string(),
            reason: "retry rounds were exhausted before the batch resolved".to_string(),
            strategy_patch: Some(StrategyPatch {
                retry_max_rounds: Some(8),
                ..Default::default()
            }),
        });
    }

    let cluster_text = clusters
        .iter()
        .flat_map(|c| [c.signature.as_str(), c.example_error.as_deref().unwrap_or("")])
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if TIMEOUT_RESOURCE_VOCAB.iter().any(|v| cluster_text.contains(v)) {
        actions.push(RemediationAction {
            priority: RemediationPriority::Medium,
            action: "reduce parallel pressure".to_string(),
            reason: "failure clusters mention timeouts or resource exhaustion".to_string(),
            strategy_patch: Some(StrategyPatch {
                concurrency: Some(2),
                agent_budget: Some(2),
                ..Default::default()
            }),
        });
    }

    if QUALITY_VOCAB.iter().any(|v| cluster_text.contains(v)) {
        actions.push(RemediationAction {
            priority: RemediationPriority::Medium,
            action: "front-load strict gates".to_string(),
            reason: "failure clusters mention quality or test failures".to_string(),
            strategy_patch: Some(StrategyPatch {
                front_load_gates: true,
                ..Default::default()
            }),
        });
    }

    actions.sort_by(|a, b| a.priority.cmp(&b.priority));
    actions.truncate(MAX_REMEDIATION_ACTIONS);
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Goal, GoalStatus};
    use chrono::Utc;

    fn failed_result(index: usize, error: &str) -> GoalResult {
        GoalResult {
            source_index: index,
            attempt: 1,
            status: GoalStatus::Failed,
            sub_artifact_count: 0,
            rate_limit: Default::default(),
            error: Some(error.to_string()),
            settled_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_collapses_digits_and_paths() {
        let sig = normalize_error_signature("Timeout 4321ms on /tmp/x");
        assert_eq!(sig, "timeout #ms on <path>");
    }

    #[test]
    fn test_normalize_strips_quotes_and_whitespace() {
        let sig = normalize_error_signature("  Could  not open 'file'   at\t\"C:\\temp\\y\"  ");
        assert_eq!(sig, "could not open file at <path>");
    }

    #[test]
    fn test_normalize_truncates() {
        let long = "x".repeat(500);
        assert_eq!(normalize_error_signature(&long).len(), 120);
    }

    #[test]
    fn test_cluster_groups_same_signature() {
        let texts = vec!["g0".to_string(), "g1".to_string(), "g2".to_string()];
        let results = vec![
            failed_result(0, "Timeout 4321ms on /tmp/x"),
            failed_result(1, "Timeout 99ms on /var/y"),
            failed_result(2, "assertion failed in tests"),
        ];

        let clusters = cluster_failures(&results, &texts);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].signature, "failed:timeout #ms on <path>");
        assert_eq!(clusters[0].count, 2);
        assert_eq!(clusters[0].goal_indexes, vec![0, 1]);
        assert_eq!(clusters[0].example_goal, "g0");
    }

    #[test]
    fn test_cluster_caps_goal_indexes() {
        let texts: Vec<String> = (0..30).map(|i| format!("g{i}")).collect();
        let results: Vec<_> = (0..30).map(|i| failed_result(i, "same error")).collect();

        let clusters = cluster_failures(&results, &texts);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 30);
        assert_eq!(clusters[0].goal_indexes.len(), MAX_CLUSTER_GOAL_INDEXES);
    }

    #[test]
    fn test_no_failures_yields_monitor() {
        let actions = remediation_actions(0, false, &[]);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].priority, RemediationPriority::Monitor);
    }

    #[test]
    fn test_timeout_cluster_suggests_reducing_pressure() {
        let texts = vec!["g0".to_string()];
        let results = vec![failed_result(0, "Timeout 4321ms on /tmp/x")];
        let clusters = cluster_failures(&results, &texts);

        let actions = remediation_actions(1, false, &clusters);
        assert_eq!(actions[0].action, "resume unresolved goals");
        let pressure = actions
            .iter()
            .find(|a| a.action == "reduce parallel pressure")
            .expect("pressure action present");
        assert_eq!(pressure.priority, RemediationPriority::Medium);
        let patch = pressure.strategy_patch.as_ref().unwrap();
        assert_eq!(patch.concurrency, Some(2));
        assert_eq!(patch.agent_budget, Some(2));
    }

    #[test]
    fn test_exhausted_rounds_adds_high_action_and_caps_at_five() {
        let texts = vec!["g0".to_string()];
        let results = vec![failed_result(0, "test regression: assertion Timeout resource")];
        let clusters = cluster_failures(&results, &texts);

        let actions = remediation_actions(1, true, &clusters);
        assert!(actions.len() <= MAX_REMEDIATION_ACTIONS);
        assert!(actions
            .iter()
            .any(|a| a.action == "increase retry ceiling or shrink scope"
                && a.priority == RemediationPriority::High));
        // High actions come before medium ones.
        assert_eq!(actions[0].priority, RemediationPriority::High);
        assert_eq!(actions[1].priority, RemediationPriority::High);
    }

    #[test]
    fn test_stopped_goals_cluster_without_error_detail() {
        let goal = Goal::new("g0", 0);
        let mut result = GoalResult::stopped(&goal, "retry budget exhausted after 2 round(s)");
        result.error = None;
        let clusters = cluster_failures(&[result], &["g0".to_string()]);
        assert_eq!(clusters[0].signature, "stopped:no-error-detail");
    }
}
