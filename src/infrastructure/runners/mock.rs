//! Mock goal runner for testing and dry runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::error::RunnerError;
use crate::domain::models::{GoalStatus, RateLimitTelemetry};
use crate::domain::ports::{GoalRunner, RunConfig, RunResult};

/// Scripted response configuration.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Status to report.
    pub status: GoalStatus,
    /// Sub-artifacts to report.
    pub sub_artifact_count: u32,
    /// Rate-limit telemetry to report.
    pub rate_limit: RateLimitTelemetry,
    /// Diagnostic text to attach.
    pub diagnostics: Option<String>,
    /// Attempts that fail before this response applies; earlier attempts
    /// report `Failed`.
    pub succeed_on_attempt: u32,
    /// Raise a transport error instead of returning a result.
    pub raise: bool,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: GoalStatus::Completed,
            sub_artifact_count: 1,
            rate_limit: RateLimitTelemetry::default(),
            diagnostics: None,
            succeed_on_attempt: 1,
            raise: false,
        }
    }
}

impl MockResponse {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: GoalStatus::Failed,
            diagnostics: Some(error.into()),
            ..Default::default()
        }
    }

    /// Fail until the given attempt, then complete.
    pub fn flaky_until(attempt: u32) -> Self {
        Self {
            succeed_on_attempt: attempt,
            ..Default::default()
        }
    }

    /// Attach rate-limit telemetry.
    pub fn with_rate_limit(mut self, telemetry: RateLimitTelemetry) -> Self {
        self.rate_limit = telemetry;
        self
    }
}

/// Mock goal runner with per-goal scripted responses.
pub struct MockGoalRunner {
    default_response: MockResponse,
    overrides: Arc<RwLock<HashMap<String, MockResponse>>>,
    calls: Arc<RwLock<Vec<(String, u32)>>>,
}

impl Default for MockGoalRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGoalRunner {
    pub fn new() -> Self {
        Self {
            default_response: MockResponse::default(),
            overrides: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_default_response(response: MockResponse) -> Self {
        Self {
            default_response: response,
            overrides: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Script a response for one goal text.
    pub async fn set_response(&self, goal_text: impl Into<String>, response: MockResponse) {
        self.overrides.write().await.insert(goal_text.into(), response);
    }

    /// All `(goal_text, attempt)` invocations, in call order.
    pub async fn calls(&self) -> Vec<(String, u32)> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl GoalRunner for MockGoalRunner {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn run(&self, goal_text: &str, config: &RunConfig) -> Result<RunResult, RunnerError> {
        self.calls
            .write()
            .await
            .push((goal_text.to_string(), config.attempt));

        let response = self
            .overrides
            .read()
            .await
            .get(goal_text)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());

        if response.raise {
            return Err(RunnerError::Transport("mock transport failure".to_string()));
        }

        if config.dry_run {
            return Ok(RunResult {
                status: GoalStatus::Planned,
                sub_artifact_count: 0,
                rate_limit: RateLimitTelemetry::default(),
                diagnostics: None,
            });
        }

        if config.attempt < response.succeed_on_attempt {
            return Ok(RunResult {
                status: GoalStatus::Failed,
                sub_artifact_count: 0,
                rate_limit: response.rate_limit,
                diagnostics: Some(format!(
                    "attempt {} failed; succeeds on attempt {}",
                    config.attempt, response.succeed_on_attempt
                )),
            });
        }

        Ok(RunResult {
            status: response.status,
            sub_artifact_count: response.sub_artifact_count,
            rate_limit: response.rate_limit,
            diagnostics: response.diagnostics,
        })
    }
}
