//! Configuration structures for all components.
//!
//! Each component takes an explicit, validated config struct; unknown or
//! conflicting combinations are rejected at load time, before any
//! scheduling starts (see `infrastructure::config::ConfigLoader`).

use serde::{Deserialize, Serialize};

use super::kpi::AnomalyThresholds;
use super::plan::SchedulingStrategy;
use super::retry::BackpressureThresholds;

/// Main configuration structure for Overlord.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Scheduler admission settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Retry orchestration settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Recovery memory settings.
    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Governance loop settings.
    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Goal runner endpoint settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Storage paths.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// KPI anomaly thresholds.
    #[serde(default)]
    pub kpi: KpiConfig,
}

/// Scheduler admission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Parallelism ceiling before budget packing (1-64).
    #[serde(default = "default_base_parallel")]
    pub base_parallel: u32,

    /// Total concurrent weighted capacity; `None` means unlimited.
    #[serde(default)]
    pub agent_budget: Option<u32>,

    /// Explicit inner-parallelism cap per goal-runner call, clamped to the
    /// budget floor when set.
    #[serde(default)]
    pub per_goal_parallel: Option<u32>,

    /// Priority boost per tick spent waiting. Zero disables aging.
    #[serde(default = "default_aging_factor")]
    pub aging_factor: f64,

    /// Admission order policy.
    #[serde(default)]
    pub strategy: SchedulingStrategy,

    /// Keep launching goals after one fails.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

const fn default_base_parallel() -> u32 {
    4
}

const fn default_aging_factor() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_parallel: default_base_parallel(),
            agent_budget: None,
            per_goal_parallel: None,
            aging_factor: default_aging_factor(),
            strategy: SchedulingStrategy::default(),
            continue_on_error: true,
        }
    }
}

/// Retry orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Keep retrying until no unresolved goals remain (or rounds exhaust).
    #[serde(default)]
    pub retry_until_complete: bool,

    /// Round ceiling when `retry_until_complete` is set.
    #[serde(default = "default_retry_max_rounds")]
    pub max_rounds: u32,

    /// Round count when `retry_until_complete` is not set.
    #[serde(default = "default_fixed_rounds")]
    pub fixed_rounds: u32,

    /// Shrink concurrency/budget in response to rate-limit pressure.
    #[serde(default = "default_true")]
    pub adaptive: bool,

    /// Wall-clock ceiling for the whole retry run, seconds. Zero disables.
    #[serde(default)]
    pub max_elapsed_secs: u64,

    /// Backpressure classification cut-offs.
    #[serde(default)]
    pub backpressure: BackpressureThresholds,
}

const fn default_retry_max_rounds() -> u32 {
    5
}

const fn default_fixed_rounds() -> u32 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_until_complete: false,
            max_rounds: default_retry_max_rounds(),
            fixed_rounds: default_fixed_rounds(),
            adaptive: true,
            max_elapsed_secs: 0,
            backpressure: BackpressureThresholds::default(),
        }
    }
}

impl RetryConfig {
    /// Rounds this configuration allows.
    pub fn round_budget(&self) -> u32 {
        if self.retry_until_complete {
            self.max_rounds
        } else {
            self.fixed_rounds
        }
    }
}

/// Recovery memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecoveryConfig {
    /// Scope label baked into signatures (e.g. the project name).
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Entries older than this many days are pruned.
    #[serde(default = "default_memory_ttl_days")]
    pub memory_ttl_days: i64,
}

fn default_scope() -> String {
    "default".to_string()
}

const fn default_memory_ttl_days() -> i64 {
    90
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            memory_ttl_days: default_memory_ttl_days(),
        }
    }
}

/// Governance loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GovernanceConfig {
    /// Round ceiling before the loop reports exhaustion.
    #[serde(default = "default_governance_rounds")]
    pub max_rounds: u32,

    /// Risk level at or below which the loop converges.
    #[serde(default = "default_target_risk")]
    pub target_risk: String,

    /// Compute the action plan but do not apply it.
    #[serde(default)]
    pub plan_only: bool,

    /// Archived run summaries older than this many days are pruned.
    #[serde(default = "default_archive_ttl_days")]
    pub archive_ttl_days: i64,

    /// Wall-clock ceiling for the whole loop, seconds. Zero disables.
    #[serde(default)]
    pub max_elapsed_secs: u64,
}

const fn default_governance_rounds() -> u32 {
    3
}

fn default_target_risk() -> String {
    "low".to_string()
}

const fn default_archive_ttl_days() -> i64 {
    60
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_governance_rounds(),
            target_risk: default_target_risk(),
            plan_only: false,
            archive_ttl_days: default_archive_ttl_days(),
            max_elapsed_secs: 0,
        }
    }
}

/// Goal runner endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// HTTP endpoint the runner adapter posts goals to.
    #[serde(default = "default_runner_endpoint")]
    pub endpoint: String,

    /// Per-request timeout, seconds.
    #[serde(default = "default_runner_timeout")]
    pub request_timeout_secs: u64,

    /// Requests per second allowed toward the runner.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Transient transport errors are retried up to this many times.
    #[serde(default = "default_transport_retries")]
    pub transport_retries: u32,
}

fn default_runner_endpoint() -> String {
    "http://127.0.0.1:7717/run".to_string()
}

const fn default_runner_timeout() -> u64 {
    600
}

const fn default_requests_per_second() -> u32 {
    5
}

const fn default_transport_retries() -> u32 {
    2
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_runner_endpoint(),
            request_timeout_secs: default_runner_timeout(),
            requests_per_second: default_requests_per_second(),
            transport_retries: default_transport_retries(),
        }
    }
}

/// Storage paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Recovery memory document path.
    #[serde(default = "default_memory_path")]
    pub recovery_memory_path: String,

    /// Directory holding one JSON summary per archived run.
    #[serde(default = "default_archive_dir")]
    pub run_archive_dir: String,
}

fn default_memory_path() -> String {
    ".overlord/recovery_memory.json".to_string()
}

fn default_archive_dir() -> String {
    ".overlord/runs".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            recovery_memory_path: default_memory_path(),
            run_archive_dir: default_archive_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling file output.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// KPI engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KpiConfig {
    /// Anomaly detection cut-offs.
    #[serde(default)]
    pub thresholds: AnomalyThresholds,
}
