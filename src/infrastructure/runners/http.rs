//! HTTP goal runner adapter.
//!
//! Posts one JSON request per goal to the configured endpoint and maps the
//! response onto the runner contract. Outbound requests are paced by a
//! token-bucket rate limiter; transient transport failures (connection
//! errors, 429, 5xx) are retried with exponential backoff. The
//! collaborator's own rate-limit telemetry is surfaced unchanged; only
//! transport-level retries happen here.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::error::RunnerError;
use crate::domain::models::{GoalStatus, RateLimitTelemetry, RunnerConfig};
use crate::domain::ports::{GoalRunner, RunConfig, RunResult};

/// Retry policy for transient transport errors.
///
/// Backoff doubles with each retry: `initial * 2^attempt`, capped at
/// `max_backoff_ms`. Client errors (4xx other than 429) never retry.
#[derive(Debug, Clone)]
pub struct TransportRetryPolicy {
    /// Maximum number of retries before giving up.
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for TransportRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 250,
            max_backoff_ms: 10_000,
        }
    }
}

impl TransportRetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);
        Duration::from_millis(backoff_ms)
    }
}

/// Request body posted to the runner endpoint.
#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    goal: &'a str,
    max_parallel: u32,
    attempt: u32,
    dry_run: bool,
}

/// Wire shape of the runner's response. The status arrives as free text so
/// an unrecognized value degrades to `Unknown` instead of a decode error.
#[derive(Debug, Deserialize)]
struct RawRunResult {
    status: String,
    #[serde(default)]
    sub_artifact_count: u32,
    #[serde(default)]
    rate_limit: RateLimitTelemetry,
    #[serde(default)]
    diagnostics: Option<String>,
}

enum PostError {
    Transient(RunnerError),
    Permanent(RunnerError),
}

/// HTTP adapter for the goal runner collaborator.
pub struct HttpGoalRunner {
    client: reqwest::Client,
    endpoint: String,
    limiter: DefaultDirectRateLimiter,
    retry: TransportRetryPolicy,
}

impl HttpGoalRunner {
    /// Build the adapter from runner configuration.
    pub fn new(config: &RunnerConfig) -> Result<Self, RunnerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RunnerError::Transport(e.to_string()))?;

        let rate = NonZeroU32::new(config.requests_per_second.max(1)).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            retry: TransportRetryPolicy {
                max_retries: config.transport_retries,
                ..Default::default()
            },
        })
    }

    async fn post_once(&self, request: &RunRequest<'_>) -> Result<RunResult, PostError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| PostError::Transient(RunnerError::Transport(e.to_string())))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(PostError::Transient(RunnerError::Transport(format!(
                "runner returned {status}"
            ))));
        }
        if !status.is_success() {
            return Err(PostError::Permanent(RunnerError::Rejected(format!(
                "runner returned {status}"
            ))));
        }

        let raw: RawRunResult = response
            .json()
            .await
            .map_err(|e| PostError::Permanent(RunnerError::MalformedResult(e.to_string())))?;

        let status = GoalStatus::from_str(&raw.status).unwrap_or(GoalStatus::Unknown);
        Ok(RunResult {
            status,
            sub_artifact_count: raw.sub_artifact_count,
            rate_limit: raw.rate_limit,
            diagnostics: raw.diagnostics,
        })
    }
}

#[async_trait]
impl GoalRunner for HttpGoalRunner {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn run(&self, goal_text: &str, config: &RunConfig) -> Result<RunResult, RunnerError> {
        self.limiter.until_ready().await;

        let request = RunRequest {
            goal: goal_text,
            max_parallel: config.max_parallel,
            attempt: config.attempt,
            dry_run: config.dry_run,
        };

        debug!(endpoint = %self.endpoint, attempt = config.attempt, "posting goal to runner");

        let mut attempt = 0;
        loop {
            match self.post_once(&request).await {
                Ok(result) => return Ok(result),
                Err(PostError::Permanent(err)) => return Err(err),
                Err(PostError::Transient(err)) => {
                    if attempt >= self.retry.max_retries {
                        warn!(error = %err, attempts = attempt + 1, "transport retries exhausted");
                        return Err(err);
                    }
                    let backoff = self.retry.backoff(attempt);
                    warn!(error = %err, ?backoff, "transient transport error, retrying");
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
