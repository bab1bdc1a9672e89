//! KPI bucketing and anomaly detection over the run archive.

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use overlord::domain::models::{AnomalySeverity, AnomalyThresholds, AnomalyType, PeriodUnit, RunRecord};
use overlord::domain::ports::RunHistory;
use overlord::infrastructure::stores::RunArchive;
use overlord::services::kpi_engine;

fn record(day: u32, success_rate: f64) -> RunRecord {
    RunRecord {
        run_id: Uuid::new_v4(),
        mode: "batch".to_string(),
        status: "completed".to_string(),
        completed_at: Some(Utc.with_ymd_and_hms(2026, 5, day, 9, 0, 0).unwrap()),
        updated_at: None,
        success_rate_percent: success_rate,
        completion_rate_percent: success_rate,
        failed_goals: 0,
        total_sub_artifacts: 4,
        estimated_created: 4,
        gate_passed: true,
        rate_limit_signals: 0,
        rate_limit_backoff_ms: 0,
    }
}

/// Six identical daily buckets followed by a 40-point success-rate drop
/// yield exactly one high-severity success-rate-drop anomaly, end to end
/// through the archive.
#[tokio::test]
async fn success_rate_drop_detected_from_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = RunArchive::new(dir.path());

    for day in 1..=6 {
        archive.append(&record(day, 90.0)).await.unwrap();
    }
    archive.append(&record(7, 50.0)).await.unwrap();

    let records = archive.load_records().await.unwrap();
    let buckets = kpi_engine::bucket(&records, PeriodUnit::Day);
    assert_eq!(buckets.len(), 7);

    let anomalies = kpi_engine::detect_anomalies(&buckets, &AnomalyThresholds::default());
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].anomaly_type, AnomalyType::SuccessRateDrop);
    assert_eq!(anomalies[0].severity, AnomalySeverity::High);
    assert!((anomalies[0].delta - 40.0).abs() < 1e-9);
}

/// Weekly bucketing groups runs by ISO week across a month boundary.
#[tokio::test]
async fn weekly_buckets_span_month_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let archive = RunArchive::new(dir.path());

    // 2026-04-29 (Wednesday) and 2026-05-01 (Friday) share ISO week
    // 2026-W18; 2026-05-04 (Monday) starts 2026-W19.
    let mut a = record(1, 90.0);
    a.completed_at = Some(Utc.with_ymd_and_hms(2026, 4, 29, 9, 0, 0).unwrap());
    let b = record(1, 90.0);
    let mut c = record(4, 90.0);
    c.completed_at = Some(Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap());

    archive.append(&a).await.unwrap();
    archive.append(&b).await.unwrap();
    archive.append(&c).await.unwrap();

    let records = archive.load_records().await.unwrap();
    let buckets = kpi_engine::bucket(&records, PeriodUnit::Week);

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].period, "2026-W18");
    assert_eq!(buckets[0].runs, 2);
    assert_eq!(buckets[1].period, "2026-W19");
}

/// Records updated long ago but completed recently bucket by completion
/// time; records with neither timestamp are skipped.
#[tokio::test]
async fn bucketing_uses_effective_timestamp() {
    let mut with_update_only = record(1, 90.0);
    with_update_only.completed_at = None;
    with_update_only.updated_at = Some(Utc.with_ymd_and_hms(2026, 5, 2, 9, 0, 0).unwrap());

    let mut timestampless = record(1, 90.0);
    timestampless.completed_at = None;
    timestampless.updated_at = None;

    let buckets = kpi_engine::bucket(
        &[with_update_only, timestampless],
        PeriodUnit::Day,
    );
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].period, "2026-05-02");
    assert_eq!(buckets[0].runs, 1);
}

/// Old runs age out of the archive without touching fresh ones.
#[tokio::test]
async fn archive_prunes_by_age() {
    let dir = tempfile::tempdir().unwrap();
    let archive = RunArchive::new(dir.path());

    let mut old = record(1, 90.0);
    old.completed_at = Some(Utc::now() - Duration::days(120));
    let fresh = RunRecord {
        completed_at: Some(Utc::now()),
        ..record(1, 90.0)
    };

    archive.append(&old).await.unwrap();
    archive.append(&fresh).await.unwrap();

    let removed = archive.prune_older_than(60).await.unwrap();
    assert_eq!(removed, 1);

    let remaining = archive.load_records().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].run_id, fresh.run_id);
}
