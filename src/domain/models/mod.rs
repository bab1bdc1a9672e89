//! Domain models: pure data types with no I/O.

pub mod config;
pub mod diagnostics;
pub mod goal;
pub mod governance;
pub mod kpi;
pub mod plan;
pub mod recovery;
pub mod resource;
pub mod retry;

pub use config::{
    Config, GovernanceConfig, KpiConfig, LoggingConfig, RecoveryConfig, RetryConfig, RunnerConfig,
    SchedulerConfig, StorageConfig,
};
pub use diagnostics::{
    FailureCluster, RemediationAction, RemediationPriority, StrategyPatch,
    MAX_CLUSTER_GOAL_INDEXES, MAX_REMEDIATION_ACTIONS,
};
pub use goal::{BatchStatus, Goal, GoalResult, GoalStatus, RateLimitTelemetry};
pub use governance::{
    GateSignal, GovernanceOutcome, GovernanceReport, GovernanceRound, HealthSnapshot,
    MaintenanceAction, RiskLevel,
};
pub use kpi::{
    Anomaly, AnomalySeverity, AnomalyThresholds, AnomalyType, KpiBucket, PeriodUnit, RunRecord,
};
pub use plan::{GoalPlan, SchedulingStrategy};
pub use recovery::{ActionStats, RecoveryMemory, SignatureEntry, RECOVERY_MEMORY_VERSION};
pub use resource::{ResourcePlan, ScheduleSummary};
pub use retry::{
    BackpressureLevel, BackpressureThresholds, RecoveryRecommendation, RetryRoundRecord,
};
