//! Governance convergence loop.
//!
//! Repeatedly assesses system health, derives a risk level, and applies
//! maintenance/advisory remediation until risk reaches the target
//! (converged), the round budget runs out (exhausted), an applied action
//! fails (failed), or the external quality gate vetoes continuation
//! (blocked). Plan-only runs compute one round's plan and halt.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::error::{ConfigError, StoreError};
use crate::domain::models::{
    GovernanceConfig, GovernanceOutcome, GovernanceReport, GovernanceRound, HealthSnapshot,
    MaintenanceAction, RiskLevel,
};
use crate::domain::ports::QualityGate;

/// Failure rate at or above which risk is high.
const HIGH_RISK_FAILURE_RATE: f64 = 0.5;

/// Failure rate at or above which risk is at least medium.
const MEDIUM_RISK_FAILURE_RATE: f64 = 0.2;

/// Pending goals at or above which risk is at least medium.
const MEDIUM_RISK_PENDING_GOALS: u32 = 5;

/// Provides the health inputs one governance round assesses.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Failure rate and pending-goal count over recent history.
    async fn assess(&self) -> Result<HealthSnapshot, StoreError>;
}

/// Applies maintenance actions. The governance loop decides *what* to do;
/// this seam does it.
#[async_trait]
pub trait MaintenanceExecutor: Send + Sync {
    /// Apply one action. An `Err` stops the loop with the `Failed` outcome.
    async fn apply(&self, action: &MaintenanceAction) -> Result<(), StoreError>;
}

/// Derive the risk level from a health snapshot.
///
/// A failing (but not blocking) gate raises risk one level; hard blocks are
/// handled before risk is consulted.
pub fn assess_risk(health: &HealthSnapshot) -> RiskLevel {
    let mut risk = if health.failure_rate >= HIGH_RISK_FAILURE_RATE {
        RiskLevel::High
    } else if health.failure_rate >= MEDIUM_RISK_FAILURE_RATE
        || health.pending_goals >= MEDIUM_RISK_PENDING_GOALS
    {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    if !health.gate.passed && risk < RiskLevel::High {
        risk = match risk {
            RiskLevel::Low => RiskLevel::Medium,
            _ => RiskLevel::High,
        };
    }

    risk
}

/// Compute the maintenance plan for one round.
pub fn plan_actions(config: &GovernanceConfig, health: &HealthSnapshot) -> Vec<MaintenanceAction> {
    let mut actions = vec![
        MaintenanceAction::PruneArchive {
            ttl_days: config.archive_ttl_days,
        },
        MaintenanceAction::PruneRecoveryMemory {
            ttl_days: config.archive_ttl_days,
        },
    ];

    if health.failure_rate >= MEDIUM_RISK_FAILURE_RATE {
        actions.push(MaintenanceAction::RunRecovery {
            reason: format!(
                "failure rate {:.0}% at or above remediation threshold",
                health.failure_rate * 100.0
            ),
        });
    }
    if health.pending_goals > 0 {
        actions.push(MaintenanceAction::ResumeQueue {
            reason: format!("{} goal(s) pending resume", health.pending_goals),
        });
    }

    actions
}

/// The convergence-gated governance loop.
pub struct GovernanceLoop<'a> {
    config: GovernanceConfig,
    target_risk: RiskLevel,
    probe: &'a dyn HealthProbe,
    gate: &'a dyn QualityGate,
    executor: &'a dyn MaintenanceExecutor,
}

impl<'a> GovernanceLoop<'a> {
    /// Build the loop, validating the configured target risk.
    pub fn new(
        config: GovernanceConfig,
        probe: &'a dyn HealthProbe,
        gate: &'a dyn QualityGate,
        executor: &'a dyn MaintenanceExecutor,
    ) -> Result<Self, ConfigError> {
        let target_risk = RiskLevel::from_str(&config.target_risk)
            .ok_or_else(|| ConfigError::InvalidTargetRisk(config.target_risk.clone()))?;

        Ok(Self {
            config,
            target_risk,
            probe,
            gate,
            executor,
        })
    }

    /// Run rounds until a terminal outcome.
    pub async fn run(&self) -> Result<GovernanceReport, StoreError> {
        let started = Instant::now();
        let mut rounds: Vec<GovernanceRound> = Vec::new();

        for round in 1..=self.config.max_rounds.max(1) {
            if self.config.max_elapsed_secs > 0
                && started.elapsed().as_secs() >= self.config.max_elapsed_secs
            {
                warn!(round, "governance wall-clock budget spent");
                return Ok(report(GovernanceOutcome::Exhausted, rounds, vec![]));
            }

            let mut health = self.probe.assess().await?;
            health.gate = self.gate.check().await;

            // An intentional external veto, not an internal failure.
            if health.gate.hard_block {
                let reasons = health.gate.blocking_reasons.clone();
                warn!(round, reasons = ?reasons, "quality gate hard block");
                rounds.push(GovernanceRound {
                    round,
                    risk: assess_risk(&health),
                    health,
                    planned_actions: vec![],
                    applied_actions: vec![],
                });
                return Ok(report(GovernanceOutcome::Blocked, rounds, reasons));
            }

            let risk = assess_risk(&health);
            info!(
                round,
                risk = risk.as_str(),
                failure_rate = health.failure_rate,
                pending_goals = health.pending_goals,
                "governance round assessed"
            );

            if risk <= self.target_risk {
                rounds.push(GovernanceRound {
                    round,
                    risk,
                    health,
                    planned_actions: vec![],
                    applied_actions: vec![],
                });
                return Ok(report(GovernanceOutcome::Converged, rounds, vec![]));
            }

            let planned = plan_actions(&self.config, &health);
            if planned.is_empty() {
                rounds.push(GovernanceRound {
                    round,
                    risk,
                    health,
                    planned_actions: vec![],
                    applied_actions: vec![],
                });
                return Ok(report(GovernanceOutcome::NoActionableState, rounds, vec![]));
            }

            if self.config.plan_only {
                // Dry run: report the plan and halt after one round.
                rounds.push(GovernanceRound {
                    round,
                    risk,
                    health,
                    planned_actions: planned,
                    applied_actions: vec![],
                });
                return Ok(report(GovernanceOutcome::PlanOnly, rounds, vec![]));
            }

            let mut applied = Vec::new();
            for action in &planned {
                match self.executor.apply(action).await {
                    Ok(()) => applied.push(action.name().to_string()),
                    Err(err) => {
                        warn!(action = action.name(), error = %err, "maintenance action failed");
                        rounds.push(GovernanceRound {
                            round,
                            risk,
                            health,
                            planned_actions: planned.clone(),
                            applied_actions: applied,
                        });
                        return Ok(report(GovernanceOutcome::Failed, rounds, vec![]));
                    }
                }
            }

            rounds.push(GovernanceRound {
                round,
                risk,
                health,
                planned_actions: planned,
                applied_actions: applied,
            });
        }

        Ok(report(GovernanceOutcome::Exhausted, rounds, vec![]))
    }
}

fn report(
    outcome: GovernanceOutcome,
    rounds: Vec<GovernanceRound>,
    blocking_reasons: Vec<String>,
) -> GovernanceReport {
    GovernanceReport {
        outcome,
        rounds,
        blocking_reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::GateSignal;
    use crate::domain::ports::PassingGate;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    struct ScriptedProbe {
        // One snapshot per round; the last repeats.
        snapshots: Vec<HealthSnapshot>,
        calls: AtomicU32,
    }

    impl ScriptedProbe {
        fn new(snapshots: Vec<HealthSnapshot>) -> Self {
            Self {
                snapshots,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn assess(&self) -> Result<HealthSnapshot, StoreError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(self
                .snapshots
                .get(i)
                .or_else(|| self.snapshots.last())
                .cloned()
                .unwrap())
        }
    }

    struct RecordingExecutor {
        applied: StdMutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingExecutor {
        fn new() -> Self {
            Self {
                applied: StdMutex::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl MaintenanceExecutor for RecordingExecutor {
        async fn apply(&self, action: &MaintenanceAction) -> Result<(), StoreError> {
            if self.fail_on == Some(action.name()) {
                return Err(StoreError::Write {
                    path: "test".to_string(),
                    source: std::io::Error::other("boom"),
                });
            }
            self.applied.lock().unwrap().push(action.name().to_string());
            Ok(())
        }
    }

    struct BlockingGate;

    #[async_trait]
    impl QualityGate for BlockingGate {
        async fn check(&self) -> GateSignal {
            GateSignal {
                passed: false,
                hard_block: true,
                blocking_reasons: vec!["release evidence regression".to_string()],
            }
        }
    }

    fn healthy() -> HealthSnapshot {
        HealthSnapshot {
            failure_rate: 0.0,
            pending_goals: 0,
            gate: GateSignal::default(),
        }
    }

    fn unhealthy() -> HealthSnapshot {
        HealthSnapshot {
            failure_rate: 0.6,
            pending_goals: 8,
            gate: GateSignal::default(),
        }
    }

    #[test]
    fn test_risk_tiers() {
        assert_eq!(assess_risk(&healthy()), RiskLevel::Low);
        assert_eq!(assess_risk(&unhealthy()), RiskLevel::High);

        let medium = HealthSnapshot {
            failure_rate: 0.3,
            pending_goals: 0,
            gate: GateSignal {
                passed: true,
                ..Default::default()
            },
        };
        assert_eq!(assess_risk(&medium), RiskLevel::Medium);
    }

    #[test]
    fn test_failing_gate_raises_risk() {
        let mut health = healthy();
        health.gate.passed = false;
        assert_eq!(assess_risk(&health), RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_converges_immediately_when_healthy() {
        let probe = ScriptedProbe::new(vec![healthy()]);
        let executor = RecordingExecutor::new();
        let gate = PassingGate;
        let looper =
            GovernanceLoop::new(GovernanceConfig::default(), &probe, &gate, &executor).unwrap();

        let result = looper.run().await.unwrap();
        assert_eq!(result.outcome, GovernanceOutcome::Converged);
        assert_eq!(result.rounds.len(), 1);
        assert!(executor.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remediates_then_converges() {
        let probe = ScriptedProbe::new(vec![unhealthy(), healthy()]);
        let executor = RecordingExecutor::new();
        let gate = PassingGate;
        let looper =
            GovernanceLoop::new(GovernanceConfig::default(), &probe, &gate, &executor).unwrap();

        let result = looper.run().await.unwrap();
        assert_eq!(result.outcome, GovernanceOutcome::Converged);
        assert_eq!(result.rounds.len(), 2);

        let applied = executor.applied.lock().unwrap();
        assert!(applied.contains(&"prune-archive".to_string()));
        assert!(applied.contains(&"run-recovery".to_string()));
        assert!(applied.contains(&"resume-queue".to_string()));
    }

    #[tokio::test]
    async fn test_exhausts_when_never_healthy() {
        let probe = ScriptedProbe::new(vec![unhealthy()]);
        let executor = RecordingExecutor::new();
        let gate = PassingGate;
        let config = GovernanceConfig {
            max_rounds: 2,
            ..Default::default()
        };
        let looper = GovernanceLoop::new(config, &probe, &gate, &executor).unwrap();

        let result = looper.run().await.unwrap();
        assert_eq!(result.outcome, GovernanceOutcome::Exhausted);
        assert_eq!(result.rounds.len(), 2);
    }

    #[tokio::test]
    async fn test_hard_block_reports_blocked() {
        let probe = ScriptedProbe::new(vec![unhealthy()]);
        let executor = RecordingExecutor::new();
        let gate = BlockingGate;
        let looper =
            GovernanceLoop::new(GovernanceConfig::default(), &probe, &gate, &executor).unwrap();

        let result = looper.run().await.unwrap();
        assert_eq!(result.outcome, GovernanceOutcome::Blocked);
        assert_eq!(
            result.blocking_reasons,
            vec!["release evidence regression".to_string()]
        );
        assert!(executor.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plan_only_halts_after_one_round() {
        let probe = ScriptedProbe::new(vec![unhealthy()]);
        let executor = RecordingExecutor::new();
        let gate = PassingGate;
        let config = GovernanceConfig {
            plan_only: true,
            ..Default::default()
        };
        let looper = GovernanceLoop::new(config, &probe, &gate, &executor).unwrap();

        let result = looper.run().await.unwrap();
        assert_eq!(result.outcome, GovernanceOutcome::PlanOnly);
        assert_eq!(result.rounds.len(), 1);
        assert!(!result.rounds[0].planned_actions.is_empty());
        assert!(executor.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_action_failure_stops_loop() {
        let probe = ScriptedProbe::new(vec![unhealthy()]);
        let executor = RecordingExecutor {
            applied: StdMutex::new(Vec::new()),
            fail_on: Some("run-recovery"),
        };
        let gate = PassingGate;
        let looper =
            GovernanceLoop::new(GovernanceConfig::default(), &probe, &gate, &executor).unwrap();

        let result = looper.run().await.unwrap();
        assert_eq!(result.outcome, GovernanceOutcome::Failed);
    }

    #[test]
    fn test_invalid_target_risk_rejected() {
        let probe = ScriptedProbe::new(vec![healthy()]);
        let executor = RecordingExecutor::new();
        let gate = PassingGate;
        let config = GovernanceConfig {
            target_risk: "extreme".to_string(),
            ..Default::default()
        };
        assert!(GovernanceLoop::new(config, &probe, &gate, &executor).is_err());
    }
}
