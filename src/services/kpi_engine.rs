//! KPI trend and anomaly engine.
//!
//! Aggregates historical run records into UTC period buckets (ISO week or
//! day) and flags deviations of the most recent bucket against the mean of
//! all prior buckets. Buckets are recomputed on every query; nothing here
//! is persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::domain::models::{
    Anomaly, AnomalySeverity, AnomalyThresholds, AnomalyType, KpiBucket, PeriodUnit, RunRecord,
};

/// Map a timestamp to its period key, always in UTC.
///
/// Weeks use the ISO-8601 week-numbering year (`YYYY-Www`); days use the
/// calendar date (`YYYY-MM-DD`).
pub fn period_key(timestamp: DateTime<Utc>, unit: PeriodUnit) -> String {
    match unit {
        PeriodUnit::Week => {
            let week = timestamp.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        PeriodUnit::Day => timestamp.format("%Y-%m-%d").to_string(),
    }
}

/// Aggregate run records into period buckets, ordered by period key.
///
/// Records without any usable timestamp are skipped. Each bucket exposes
/// averages over its runs plus the raw run counts.
pub fn bucket(records: &[RunRecord], unit: PeriodUnit) -> Vec<KpiBucket> {
    struct Accum {
        runs: usize,
        completed: usize,
        gate_passed: usize,
        success_rate_sum: f64,
        completion_rate_sum: f64,
        failed_goals_sum: f64,
        sub_artifacts_sum: f64,
        estimated_created_sum: f64,
        signals_sum: f64,
        backoff_sum: f64,
    }

    let mut accums: BTreeMap<String, Accum> = BTreeMap::new();

    for record in records {
        let Some(timestamp) = record.effective_timestamp() else {
            debug!(run_id = %record.run_id, "run record has no timestamp, skipping");
            continue;
        };

        let accum = accums.entry(period_key(timestamp, unit)).or_insert(Accum {
            runs: 0,
            completed: 0,
            gate_passed: 0,
            success_rate_sum: 0.0,
            completion_rate_sum: 0.0,
            failed_goals_sum: 0.0,
            sub_artifacts_sum: 0.0,
            estimated_created_sum: 0.0,
            signals_sum: 0.0,
            backoff_sum: 0.0,
        });

        accum.runs += 1;
        if record.status == "completed" {
            accum.completed += 1;
        }
        if record.gate_passed {
            accum.gate_passed += 1;
        }
        accum.success_rate_sum += record.success_rate_percent;
        accum.completion_rate_sum += record.completion_rate_percent;
        accum.failed_goals_sum += f64::from(record.failed_goals);
        accum.sub_artifacts_sum += f64::from(record.total_sub_artifacts);
        accum.estimated_created_sum += f64::from(record.estimated_created);
        accum.signals_sum += f64::from(record.rate_limit_signals);
        accum.backoff_sum += record.rate_limit_backoff_ms as f64;
    }

    accums
        .into_iter()
        .map(|(period, a)| {
            let n = a.runs as f64;
            KpiBucket {
                period,
                runs: a.runs,
                completed_runs: a.completed,
                non_completed_runs: a.runs - a.completed,
                gate_passed_runs: a.gate_passed,
                avg_success_rate: a.success_rate_sum / n,
                avg_completion_rate: a.completion_rate_sum / n,
                avg_failed_goals: a.failed_goals_sum / n,
                avg_sub_artifacts: a.sub_artifacts_sum / n,
                avg_estimated_created: a.estimated_created_sum / n,
                avg_rate_limit_signals: a.signals_sum / n,
                avg_rate_limit_backoff_ms: a.backoff_sum / n,
            }
        })
        .collect()
}

/// Compare the latest bucket against the mean of all prior buckets.
///
/// Requires at least two buckets. Success rate anomalies use
/// `baseline - latest` (a drop is the bad direction); the other three
/// metrics use `latest - baseline`.
pub fn detect_anomalies(buckets: &[KpiBucket], thresholds: &AnomalyThresholds) -> Vec<Anomaly> {
    if buckets.len() < 2 {
        return Vec::new();
    }

    let (baseline_buckets, latest) = buckets.split_at(buckets.len() - 1);
    let latest = &latest[0];
    let n = baseline_buckets.len() as f64;

    let mean = |f: fn(&KpiBucket) -> f64| baseline_buckets.iter().map(f).sum::<f64>() / n;

    let baseline_success = mean(|b| b.avg_success_rate);
    let baseline_failed = mean(|b| b.avg_failed_goals);
    let baseline_growth = mean(|b| b.avg_estimated_created);
    let baseline_signals = mean(|b| b.avg_rate_limit_signals);

    let mut anomalies = Vec::new();
    let mut check = |anomaly_type: AnomalyType,
                     metric: &str,
                     baseline: f64,
                     latest_value: f64,
                     delta: f64,
                     cutoffs: (f64, f64)| {
        let (medium, high) = cutoffs;
        if delta >= medium {
            anomalies.push(Anomaly {
                anomaly_type,
                severity: if delta >= high {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                },
                metric: metric.to_string(),
                baseline_value: baseline,
                latest_value,
                delta,
            });
        }
    };

    check(
        AnomalyType::SuccessRateDrop,
        "avg_success_rate",
        baseline_success,
        latest.avg_success_rate,
        baseline_success - latest.avg_success_rate,
        thresholds.success_rate_drop,
    );
    check(
        AnomalyType::FailedGoalsRise,
        "avg_failed_goals",
        baseline_failed,
        latest.avg_failed_goals,
        latest.avg_failed_goals - baseline_failed,
        thresholds.failed_goals_rise,
    );
    check(
        AnomalyType::GrowthSpike,
        "avg_estimated_created",
        baseline_growth,
        latest.avg_estimated_created,
        latest.avg_estimated_created - baseline_growth,
        thresholds.growth_spike,
    );
    check(
        AnomalyType::RateLimitPressure,
        "avg_rate_limit_signals",
        baseline_signals,
        latest.avg_rate_limit_signals,
        latest.avg_rate_limit_signals - baseline_signals,
        thresholds.rate_limit_rise,
    );

    anomalies
}
