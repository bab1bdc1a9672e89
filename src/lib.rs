//! Overlord - Autonomous Goal Execution Orchestrator
//!
//! Overlord schedules, runs, retries, and recovers batches of
//! natural-language work goals against an external goal runner, then learns
//! from outcomes (recovery memory, KPI anomalies, governance) to pick better
//! remediation over time.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic and domain models
//! - **Application Layer** (`application`): Use case orchestration
//! - **Service Layer** (`services`): Scheduling, retry, recovery, KPI and
//!   governance logic
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, storage
//!   and runner adapters
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use overlord::application::BatchOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire a runner and run a batch
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{BatchOrchestrator, BatchReport};
pub use domain::models::{
    BatchStatus, Config, Goal, GoalPlan, GoalResult, GoalStatus, RecoveryMemory, ResourcePlan,
    RetryConfig, SchedulerConfig, SchedulingStrategy,
};
pub use domain::ports::{GoalRunner, QualityGate, RecoveryStore, RunConfig, RunHistory, RunResult};
pub use infrastructure::config::ConfigLoader;
pub use services::{GovernanceLoop, PlanBuilder, RecoveryPlanner, RetryOrchestrator};
