//! Governance loop state: health assessment, risk, actions, outcomes.

use serde::{Deserialize, Serialize};

/// Ordinal risk level derived from a health assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Verdict reported by the external quality gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSignal {
    /// Whether the gate passed.
    pub passed: bool,
    /// Whether the gate vetoes further remediation outright.
    pub hard_block: bool,
    /// Reasons behind a failing or blocking verdict.
    #[serde(default)]
    pub blocking_reasons: Vec<String>,
}

/// Point-in-time system health consumed by one governance round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Fraction of recent runs that left goals unresolved, `0.0..=1.0`.
    pub failure_rate: f64,
    /// Unresolved goals currently pending across recent runs.
    pub pending_goals: u32,
    /// External quality-gate verdict.
    pub gate: GateSignal,
}

/// A maintenance or advisory step the governance loop can apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaintenanceAction {
    /// Drop archived run summaries older than the TTL.
    PruneArchive { ttl_days: i64 },
    /// Drop recovery-memory entries older than the TTL.
    PruneRecoveryMemory { ttl_days: i64 },
    /// Execute a recovery pass for unresolved goals.
    RunRecovery { reason: String },
    /// Advise resuming the unresolved queue with patched settings.
    ResumeQueue { reason: String },
}

impl MaintenanceAction {
    /// Short name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PruneArchive { .. } => "prune-archive",
            Self::PruneRecoveryMemory { .. } => "prune-recovery-memory",
            Self::RunRecovery { .. } => "run-recovery",
            Self::ResumeQueue { .. } => "resume-queue",
        }
    }
}

/// Why the governance loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceOutcome {
    /// Risk at or below target.
    Converged,
    /// Round budget ran out before convergence.
    Exhausted,
    /// The external quality gate vetoed continuation.
    Blocked,
    /// An applied action failed.
    Failed,
    /// No applicable action existed this round.
    NoActionableState,
    /// Dry run: the plan was computed but not applied.
    PlanOnly,
}

impl GovernanceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::Exhausted => "exhausted",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
            Self::NoActionableState => "no_actionable_state",
            Self::PlanOnly => "plan_only",
        }
    }
}

/// One governance round's bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceRound {
    /// Round number, starting at 1.
    pub round: u32,
    /// Health observed at the top of the round.
    pub health: HealthSnapshot,
    /// Risk derived from that health.
    pub risk: RiskLevel,
    /// Actions planned this round.
    pub planned_actions: Vec<MaintenanceAction>,
    /// Names of actions actually applied.
    pub applied_actions: Vec<String>,
}

/// Final report of a governance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceReport {
    /// Why the loop stopped.
    pub outcome: GovernanceOutcome,
    /// Rounds executed, in order.
    pub rounds: Vec<GovernanceRound>,
    /// Blocking reasons, when the outcome is `Blocked`.
    #[serde(default)]
    pub blocking_reasons: Vec<String>,
}
