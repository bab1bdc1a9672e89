//! Store-backed health probe and maintenance executor for governance.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::error::StoreError;
use crate::domain::models::{GateSignal, HealthSnapshot, MaintenanceAction, RecoveryConfig};
use crate::domain::ports::{RecoveryStore, RunHistory};
use crate::services::{HealthProbe, MaintenanceExecutor, RecoveryPlanner};

/// Recent runs considered when assessing health.
const HEALTH_WINDOW_RUNS: usize = 20;

/// Derives health from the run archive.
pub struct ArchiveHealthProbe<'a> {
    history: &'a dyn RunHistory,
}

impl<'a> ArchiveHealthProbe<'a> {
    pub fn new(history: &'a dyn RunHistory) -> Self {
        Self { history }
    }
}

#[async_trait]
impl HealthProbe for ArchiveHealthProbe<'_> {
    async fn assess(&self) -> Result<HealthSnapshot, StoreError> {
        let mut records = self.history.load_records().await?;
        records.sort_by_key(|r| r.effective_timestamp());
        let recent: Vec<_> = records.iter().rev().take(HEALTH_WINDOW_RUNS).collect();

        let failure_rate = if recent.is_empty() {
            0.0
        } else {
            recent.iter().filter(|r| r.failed_goals > 0).count() as f64 / recent.len() as f64
        };
        let pending_goals = recent.iter().map(|r| r.failed_goals).max().unwrap_or(0);

        debug!(
            runs = recent.len(),
            failure_rate, pending_goals, "assessed archive health"
        );

        Ok(HealthSnapshot {
            failure_rate,
            pending_goals,
            // The gate is filled in by the governance loop.
            gate: GateSignal::default(),
        })
    }
}

/// Applies maintenance actions against the stores.
///
/// Recovery and queue-resume actions are advisory in this core: they are
/// logged for the caller to act on, while pruning actions mutate the stores
/// directly.
pub struct StoreMaintenanceExecutor<'a> {
    history: &'a dyn RunHistory,
    memory_store: &'a dyn RecoveryStore,
    recovery_config: RecoveryConfig,
}

impl<'a> StoreMaintenanceExecutor<'a> {
    pub fn new(
        history: &'a dyn RunHistory,
        memory_store: &'a dyn RecoveryStore,
        recovery_config: RecoveryConfig,
    ) -> Self {
        Self {
            history,
            memory_store,
            recovery_config,
        }
    }
}

#[async_trait]
impl MaintenanceExecutor for StoreMaintenanceExecutor<'_> {
    async fn apply(&self, action: &MaintenanceAction) -> Result<(), StoreError> {
        match action {
            MaintenanceAction::PruneArchive { ttl_days } => {
                let removed = self.history.prune_older_than(*ttl_days).await?;
                info!(removed, ttl_days, "pruned run archive");
                Ok(())
            }
            MaintenanceAction::PruneRecoveryMemory { .. } => {
                let planner =
                    RecoveryPlanner::new(self.memory_store, self.recovery_config.scope.clone());
                let removed = planner.prune(self.recovery_config.memory_ttl_days).await?;
                info!(
                    removed,
                    ttl_days = self.recovery_config.memory_ttl_days,
                    "pruned recovery memory"
                );
                Ok(())
            }
            MaintenanceAction::RunRecovery { reason } => {
                info!(%reason, "recovery advised; run `overlord run` against the unresolved goals");
                Ok(())
            }
            MaintenanceAction::ResumeQueue { reason } => {
                info!(%reason, "queue resume advised");
                Ok(())
            }
        }
    }
}
