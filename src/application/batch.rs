//! Batch orchestration use case.
//!
//! Wires the retry orchestrator, failure diagnostics and the run archive
//! into one entry point: submit goal strings, get back a complete,
//! machine-readable report: results in submission order, round records,
//! failure clusters, ranked remediation actions, and the recovery
//! recommendation when retries exhausted under pressure. Nothing throws
//! mid-batch for individual goal failures.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::{
    BatchStatus, FailureCluster, Goal, GoalResult, RecoveryRecommendation, RemediationAction,
    RetryConfig, RetryRoundRecord, RunRecord, SchedulerConfig, ScheduleSummary,
};
use crate::domain::ports::{GoalRunner, RunHistory};
use crate::services::{diagnostics, RetryOrchestrator};

/// Complete machine-readable outcome of one batch invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// Overall outcome.
    pub status: BatchStatus,
    /// Every goal's final result, ordered by source index.
    pub results: Vec<GoalResult>,
    /// One record per retry round executed.
    pub rounds: Vec<RetryRoundRecord>,
    /// Aggregated scheduling counters.
    pub summary: ScheduleSummary,
    /// Failure clusters derived from the final results.
    pub failure_clusters: Vec<FailureCluster>,
    /// Ranked remediation advice.
    pub remediation_actions: Vec<RemediationAction>,
    /// Advice for resuming after exhaustion under rate-limit pressure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<RecoveryRecommendation>,
}

/// Runs batches of goals end to end.
pub struct BatchOrchestrator<'a> {
    scheduler_config: SchedulerConfig,
    retry_config: RetryConfig,
    runner: &'a dyn GoalRunner,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        scheduler_config: SchedulerConfig,
        retry_config: RetryConfig,
        runner: &'a dyn GoalRunner,
    ) -> Self {
        Self {
            scheduler_config,
            retry_config,
            runner,
        }
    }

    /// Execute the batch and derive its diagnostics.
    pub async fn run(&self, goal_texts: Vec<String>) -> BatchReport {
        let goals: Vec<Goal> = goal_texts
            .iter()
            .enumerate()
            .map(|(i, text)| Goal::new(text.clone(), i))
            .collect();
        let run_id = Uuid::new_v4();

        info!(run_id = %run_id, goals = goals.len(), "batch started");

        let orchestrator =
            RetryOrchestrator::new(self.scheduler_config.clone(), self.retry_config.clone());
        let outcome = orchestrator.run(goals, self.runner).await;

        let unresolved = outcome
            .results
            .iter()
            .filter(|r| r.is_unresolved())
            .count();
        let rounds_exhausted =
            unresolved > 0 && outcome.rounds.len() as u32 >= self.retry_config.round_budget();

        let failure_clusters = diagnostics::cluster_failures(&outcome.results, &goal_texts);
        let remediation_actions =
            diagnostics::remediation_actions(unresolved, rounds_exhausted, &failure_clusters);

        if unresolved > 0 {
            warn!(
                run_id = %run_id,
                unresolved,
                clusters = failure_clusters.len(),
                "batch finished with unresolved goals"
            );
        } else {
            info!(run_id = %run_id, "batch completed");
        }

        BatchReport {
            run_id,
            status: outcome.batch_status,
            results: outcome.results,
            rounds: outcome.rounds,
            summary: outcome.summary,
            failure_clusters,
            remediation_actions,
            recommendation: outcome.recommendation,
        }
    }

    /// Summarize a report as an archivable run record.
    pub fn to_run_record(report: &BatchReport, mode: &str, gate_passed: bool) -> RunRecord {
        let total = report.results.len().max(1) as f64;
        let resolved = report
            .results
            .iter()
            .filter(|r| !r.is_unresolved())
            .count() as f64;
        let launched: usize = report.rounds.iter().map(|r| r.processed_goals).sum();
        let completed = report
            .results
            .iter()
            .filter(|r| r.status == crate::domain::models::GoalStatus::Completed)
            .count() as f64;

        RunRecord {
            run_id: report.run_id,
            mode: mode.to_string(),
            status: report.status.as_str().to_string(),
            completed_at: Some(Utc::now()),
            updated_at: None,
            success_rate_percent: resolved / total * 100.0,
            completion_rate_percent: if launched == 0 {
                0.0
            } else {
                completed / launched as f64 * 100.0
            },
            failed_goals: report.results.iter().filter(|r| r.is_unresolved()).count() as u32,
            total_sub_artifacts: report.results.iter().map(|r| r.sub_artifact_count).sum(),
            estimated_created: report.results.iter().map(|r| r.sub_artifact_count).sum(),
            gate_passed,
            rate_limit_signals: report
                .results
                .iter()
                .map(|r| r.rate_limit.signal_count)
                .sum(),
            rate_limit_backoff_ms: report
                .results
                .iter()
                .map(|r| r.rate_limit.total_backoff_ms)
                .sum(),
        }
    }

    /// Archive a finished report. Archive failures propagate: losing the
    /// record would silently starve KPI and governance.
    pub async fn archive(
        report: &BatchReport,
        mode: &str,
        gate_passed: bool,
        history: &dyn RunHistory,
    ) -> Result<(), crate::domain::error::StoreError> {
        let record = Self::to_run_record(report, mode, gate_passed);
        history.append(&record).await
    }
}
