//! Recovery memory: signature-keyed remediation selection and bookkeeping.
//!
//! Failure signatures intentionally collapse numeric and path noise (via the
//! diagnostics normalizer) so repeats of the same kind of failure map to the
//! same key. Against each signature the memory tracks how often each
//! remediation action was attempted and how often it led to a completed
//! batch; selection picks the highest expected value with a mild bonus for
//! well-tried actions.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::error::StoreError;
use crate::domain::models::{
    ActionStats, FailureCluster, GoalStatus, RecoveryMemory, RemediationAction, SignatureEntry,
};
use crate::domain::ports::RecoveryStore;

/// Signature component used when a batch has no failure clusters.
const NO_CLUSTER_MARKER: &str = "no-failure-cluster";

/// Cap on the attempt-count bonus in action scoring.
const ATTEMPT_BONUS_CAP: f64 = 25.0;

/// Build the failure signature for a finished batch.
///
/// Format: `scope|mode|failed-<count>|<top-3 cluster signatures>` with the
/// cluster part joined by `|`, or `no-failure-cluster` when the batch
/// produced none.
pub fn build_signature(
    scope: &str,
    mode: &str,
    failed_count: usize,
    clusters: &[FailureCluster],
) -> String {
    let cluster_part = if clusters.is_empty() {
        NO_CLUSTER_MARKER.to_string()
    } else {
        clusters
            .iter()
            .take(3)
            .map(|c| c.signature.as_str())
            .collect::<Vec<_>>()
            .join("|")
    };

    format!("{scope}|{mode}|failed-{failed_count}|{cluster_part}")
}

/// Pick the historically best action index (1-based) for a signature.
///
/// Only actions with recorded attempts participate:
/// `score = success_rate * 100 + min(25, attempts)`, ties broken by more
/// attempts then lower index. Returns `None` when no action has history;
/// callers fall back to the default action #1.
pub fn select_action(
    available_actions: &[RemediationAction],
    entry: &SignatureEntry,
) -> Option<usize> {
    let mut best: Option<(usize, f64, u32)> = None;

    for index in 1..=available_actions.len() {
        let Some(stats) = entry.actions.get(&index.to_string()) else {
            continue;
        };
        if stats.attempts == 0 {
            continue;
        }

        let score = stats.success_rate() * 100.0 + f64::from(stats.attempts).min(ATTEMPT_BONUS_CAP);
        let replace = match best {
            None => true,
            Some((best_index, best_score, best_attempts)) => {
                score > best_score
                    || (score == best_score && stats.attempts > best_attempts)
                    || (score == best_score
                        && stats.attempts == best_attempts
                        && index < best_index)
            }
        };
        if replace {
            best = Some((index, score, stats.attempts));
        }
    }

    best.map(|(index, _, _)| index)
}

/// Record one recovery attempt's outcome against a signature.
///
/// Bumps the signature's aggregate counters and the selected action's own
/// counters; the action counts a success iff the final status is
/// `Completed`. Timestamps are refreshed so pruning sees the entry as live.
pub fn update(
    memory: &mut RecoveryMemory,
    signature: &str,
    action_index: usize,
    final_status: GoalStatus,
    scope: &str,
    now: DateTime<Utc>,
) {
    let entry = memory
        .signatures
        .entry(signature.to_string())
        .or_default();
    entry.scope = scope.to_string();
    entry.attempts += 1;
    entry.last_used_at = Some(now);

    let succeeded = final_status == GoalStatus::Completed;
    if succeeded {
        entry.successes += 1;
    } else {
        entry.failures += 1;
    }

    let stats = entry
        .actions
        .entry(action_index.to_string())
        .or_insert_with(ActionStats::default);
    stats.attempts += 1;
    if succeeded {
        stats.successes += 1;
    } else {
        stats.failures += 1;
    }
    stats.last_status = Some(final_status);
    stats.last_used_at = Some(now);

    debug!(
        signature,
        action_index,
        status = final_status.as_str(),
        "recovery memory updated"
    );
}

/// Decision produced by [`RecoveryPlanner::choose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryDecision {
    /// Signature the decision is keyed under.
    pub signature: String,
    /// 1-based index into the available actions.
    pub action_index: usize,
    /// Whether memory history drove the pick (vs. the default fallback).
    pub from_memory: bool,
}

/// Combines signature building, memory lookup and ranked remediation
/// actions into one pick-and-record workflow over a [`RecoveryStore`].
pub struct RecoveryPlanner<'a> {
    store: &'a dyn RecoveryStore,
    scope: String,
}

impl<'a> RecoveryPlanner<'a> {
    pub fn new(store: &'a dyn RecoveryStore, scope: impl Into<String>) -> Self {
        Self {
            store,
            scope: scope.into(),
        }
    }

    /// Pick the action to attempt for a failed batch.
    ///
    /// Falls back to action #1 when the memory has no history for this
    /// signature. A corrupt or missing memory document behaves as empty.
    pub async fn choose(
        &self,
        mode: &str,
        failed_count: usize,
        clusters: &[FailureCluster],
        available_actions: &[RemediationAction],
    ) -> Result<RecoveryDecision, StoreError> {
        let signature = build_signature(&self.scope, mode, failed_count, clusters);
        let memory = self.store.load().await?;

        let picked = memory
            .signatures
            .get(&signature)
            .and_then(|entry| select_action(available_actions, entry));

        let decision = match picked {
            Some(index) => RecoveryDecision {
                signature,
                action_index: index,
                from_memory: true,
            },
            None => RecoveryDecision {
                signature,
                action_index: 1,
                from_memory: false,
            },
        };

        info!(
            signature = %decision.signature,
            action_index = decision.action_index,
            from_memory = decision.from_memory,
            "recovery action selected"
        );
        Ok(decision)
    }

    /// Record the outcome of an attempted decision and persist the memory.
    ///
    /// Read-modify-write over the whole document; last writer wins.
    pub async fn record_outcome(
        &self,
        decision: &RecoveryDecision,
        final_status: GoalStatus,
    ) -> Result<(), StoreError> {
        let mut memory = self.store.load().await?;
        update(
            &mut memory,
            &decision.signature,
            decision.action_index,
            final_status,
            &self.scope,
            Utc::now(),
        );
        self.store.save(&memory).await
    }

    /// Prune entries unused for longer than `ttl_days`.
    pub async fn prune(&self, ttl_days: i64) -> Result<usize, StoreError> {
        let mut memory = self.store.load().await?;
        let removed = memory.prune_older_than(ttl_days, Utc::now());
        if removed > 0 {
            warn!(removed, ttl_days, "pruned stale recovery memory entries");
            self.store.save(&memory).await?;
        }
        Ok(removed)
    }
}
