//! Service layer: the core scheduling, retry, recovery and governance logic.

pub mod budget_allocator;
pub mod diagnostics;
pub mod governance;
pub mod kpi_engine;
pub mod plan_builder;
pub mod recovery_memory;
pub mod retry_orchestrator;
pub mod scheduler;

pub use governance::{GovernanceLoop, HealthProbe, MaintenanceExecutor};
pub use plan_builder::PlanBuilder;
pub use recovery_memory::{RecoveryDecision, RecoveryPlanner};
pub use retry_orchestrator::{RetryOrchestrator, RetryOutcome};
pub use scheduler::SchedulePass;
