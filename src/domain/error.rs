//! Domain-level error taxonomy.
//!
//! Per-goal execution failures are data (`GoalResult`), never errors; only
//! configuration problems and storage write failures propagate to callers.

use thiserror::Error;

/// Configuration errors: invalid ranges or conflicting options.
///
/// These fail fast before scheduling starts and are never partially applied.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base_parallel: {0}. Must be between 1 and 64")]
    InvalidBaseParallel(u32),

    #[error("Invalid agent_budget: {0}. Must be at least 1 when set")]
    InvalidAgentBudget(u32),

    #[error("Invalid per_goal_parallel: {0}. Must be at least 1 when set")]
    InvalidPerGoalParallel(u32),

    #[error("Invalid aging_factor: {0}. Must be non-negative and finite")]
    InvalidAgingFactor(f64),

    #[error("Invalid retry rounds: {0}. Must be at least 1")]
    InvalidRetryRounds(u32),

    #[error("Invalid memory TTL: {0} days. Must be at least 1")]
    InvalidMemoryTtl(i64),

    #[error("Invalid archive TTL: {0} days. Must be at least 1")]
    InvalidArchiveTtl(i64),

    #[error("Invalid target risk: {0}. Must be one of: low, medium, high")]
    InvalidTargetRisk(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Runner endpoint cannot be empty")]
    EmptyRunnerEndpoint,

    #[error("Invalid requests_per_second: {0}. Must be at least 1")]
    InvalidRequestRate(u32),

    #[error("Recovery scope cannot be empty")]
    EmptyRecoveryScope,

    #[error("Configuration extraction failed: {0}")]
    Extraction(String),
}

/// Storage errors for the whole-document stores.
///
/// Read-side corruption is handled at the store (treated as an empty
/// document) so only genuinely unrecoverable I/O surfaces here.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode document for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a goal-runner adapter.
///
/// The scheduler captures these per goal as `GoalStatus::Error`; they do not
/// abort the batch.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Goal runner transport error: {0}")]
    Transport(String),

    #[error("Goal runner returned malformed result: {0}")]
    MalformedResult(String),

    #[error("Goal runner rejected the request: {0}")]
    Rejected(String),
}
