//! Recovery memory document model.
//!
//! The recovery memory is a persisted table keyed by failure signature.
//! Each signature entry tracks aggregate attempt/success/failure counters
//! plus per-remediation-action statistics, so recurring failure patterns can
//! be answered with the historically best remediation.
//!
//! The document is read whole, mutated once per recovery attempt outcome,
//! and written back whole (last-writer-wins, atomic replace at the store
//! layer). Entries only disappear through an explicit age-based prune.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::goal::GoalStatus;

/// Current on-disk document version.
pub const RECOVERY_MEMORY_VERSION: u32 = 1;

/// Per-action outcome statistics under one signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    /// Times this action was attempted for the signature.
    pub attempts: u32,
    /// Attempts that ended with a completed batch.
    pub successes: u32,
    /// Attempts that did not.
    pub failures: u32,
    /// Status of the most recent attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<GoalStatus>,
    /// When this action was last attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ActionStats {
    /// Fraction of attempts that succeeded, 0.0 when never attempted.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.successes) / f64::from(self.attempts)
        }
    }
}

/// All recorded history for one failure signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Total recovery attempts against this signature.
    pub attempts: u32,
    /// Attempts that resolved the failure.
    pub successes: u32,
    /// Attempts that did not.
    pub failures: u32,
    /// Scope the signature was observed under (e.g. a project identifier).
    #[serde(default)]
    pub scope: String,
    /// Per-action statistics keyed by action index (as emitted by
    /// diagnostics, `"1"`-based).
    #[serde(default)]
    pub actions: BTreeMap<String, ActionStats>,
    /// When any action under this signature was last attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// The persisted recovery-memory document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryMemory {
    /// Document schema version.
    pub version: u32,
    /// Signature table.
    #[serde(default)]
    pub signatures: BTreeMap<String, SignatureEntry>,
}

impl Default for RecoveryMemory {
    fn default() -> Self {
        Self {
            version: RECOVERY_MEMORY_VERSION,
            signatures: BTreeMap::new(),
        }
    }
}

impl RecoveryMemory {
    /// Drop entries and actions whose `last_used_at` is older than `ttl_days`.
    ///
    /// An entry survives if at least one of its actions survives. Entries
    /// with no recorded timestamp at all are treated as stale.
    ///
    /// Returns the number of signatures removed.
    pub fn prune_older_than(&mut self, ttl_days: i64, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(ttl_days);
        let before = self.signatures.len();

        self.signatures.retain(|_, entry| {
            entry
                .actions
                .retain(|_, stats| stats.last_used_at.is_some_and(|t| t > cutoff));
            !entry.actions.is_empty() || entry.last_used_at.is_some_and(|t| t > cutoff)
        });

        before - self.signatures.len()
    }
}
