//! Configuration loader with hierarchical merging and fail-fast validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;

use crate::domain::error::ConfigError;
use crate::domain::models::{Config, RiskLevel};

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `.overlord/config.yaml` (project config)
    /// 3. `.overlord/local.yaml` (project local overrides, optional)
    /// 4. Environment variables (`OVERLORD_*` prefix, highest priority)
    ///
    /// Configuration is always project-local (`pwd/.overlord/`) so multiple
    /// orchestrators can coexist on one machine.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".overlord/config.yaml"))
            .merge(Yaml::file(".overlord/local.yaml"))
            .merge(Env::prefixed("OVERLORD_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    ///
    /// Rejects invalid numeric ranges and conflicting options before any
    /// scheduling starts; a rejected configuration is never partially
    /// applied.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let scheduler = &config.scheduler;
        if scheduler.base_parallel == 0 || scheduler.base_parallel > 64 {
            return Err(ConfigError::InvalidBaseParallel(scheduler.base_parallel));
        }
        if let Some(budget) = scheduler.agent_budget {
            if budget == 0 {
                return Err(ConfigError::InvalidAgentBudget(budget));
            }
        }
        if let Some(per_goal) = scheduler.per_goal_parallel {
            if per_goal == 0 {
                return Err(ConfigError::InvalidPerGoalParallel(per_goal));
            }
        }
        if !scheduler.aging_factor.is_finite() || scheduler.aging_factor < 0.0 {
            return Err(ConfigError::InvalidAgingFactor(scheduler.aging_factor));
        }

        if config.retry.max_rounds == 0 || config.retry.fixed_rounds == 0 {
            return Err(ConfigError::InvalidRetryRounds(
                config.retry.max_rounds.min(config.retry.fixed_rounds),
            ));
        }

        if config.recovery.scope.trim().is_empty() {
            return Err(ConfigError::EmptyRecoveryScope);
        }
        if config.recovery.memory_ttl_days < 1 {
            return Err(ConfigError::InvalidMemoryTtl(config.recovery.memory_ttl_days));
        }

        if config.governance.archive_ttl_days < 1 {
            return Err(ConfigError::InvalidArchiveTtl(
                config.governance.archive_ttl_days,
            ));
        }
        if RiskLevel::from_str(&config.governance.target_risk).is_none() {
            return Err(ConfigError::InvalidTargetRisk(
                config.governance.target_risk.clone(),
            ));
        }

        if config.runner.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyRunnerEndpoint);
        }
        if config.runner.requests_per_second == 0 {
            return Err(ConfigError::InvalidRequestRate(
                config.runner.requests_per_second,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
