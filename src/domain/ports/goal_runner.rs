//! Goal runner port - interface to the external execution collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::RunnerError;
use crate::domain::models::{GoalStatus, RateLimitTelemetry};

/// Per-invocation configuration handed to the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Inner-parallelism cap for this goal.
    pub max_parallel: u32,
    /// Which attempt this is, starting at 1.
    pub attempt: u32,
    /// Dry-run: plan or prepare without executing.
    #[serde(default)]
    pub dry_run: bool,
}

/// Structured result of one goal-runner invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Terminal status the runner reported.
    pub status: GoalStatus,
    /// Sub-artifacts the runner reported producing.
    #[serde(default)]
    pub sub_artifact_count: u32,
    /// Rate-limit telemetry for the run.
    #[serde(default)]
    pub rate_limit: RateLimitTelemetry,
    /// Optional diagnostic text (error detail, runner notes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

/// The single external collaborator the scheduler depends on.
///
/// Given one goal string and a run configuration, asynchronously produces a
/// structured result or fails. A returned error is captured per goal as
/// `GoalStatus::Error`; it never escapes the admission loop.
#[async_trait]
pub trait GoalRunner: Send + Sync {
    /// Adapter name, for logs.
    fn name(&self) -> &'static str;

    /// Execute one goal to completion.
    async fn run(&self, goal_text: &str, config: &RunConfig) -> Result<RunResult, RunnerError>;
}
