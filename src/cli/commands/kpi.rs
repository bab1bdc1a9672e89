//! `overlord kpi` - KPI buckets and anomaly detection.

use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::models::{Config, PeriodUnit};
use crate::domain::ports::RunHistory;
use crate::infrastructure::stores::RunArchive;
use crate::services::kpi_engine;

/// Arguments for the `kpi` command.
#[derive(Debug, Args)]
pub struct KpiArgs {
    /// Bucket granularity: week or day.
    #[arg(long, default_value = "week")]
    pub unit: String,
}

/// Execute the command; returns the process exit code.
pub async fn execute(args: KpiArgs, config: Config, json: bool) -> Result<u8> {
    let unit = match args.unit.as_str() {
        "week" => PeriodUnit::Week,
        "day" => PeriodUnit::Day,
        other => anyhow::bail!("unknown period unit: {other} (expected week or day)"),
    };

    let archive = RunArchive::new(&config.storage.run_archive_dir);
    let records = archive.load_records().await?;
    let buckets = kpi_engine::bucket(&records, unit);
    let anomalies = kpi_engine::detect_anomalies(&buckets, &config.kpi.thresholds);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "buckets": buckets,
                "anomalies": anomalies,
            }))?
        );
        return Ok(u8::from(!anomalies.is_empty()));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Period",
        "Runs",
        "Completed",
        "Avg success %",
        "Avg failed",
        "Avg signals",
    ]);
    for bucket in &buckets {
        table.add_row(vec![
            bucket.period.clone(),
            bucket.runs.to_string(),
            bucket.completed_runs.to_string(),
            format!("{:.1}", bucket.avg_success_rate),
            format!("{:.1}", bucket.avg_failed_goals),
            format!("{:.1}", bucket.avg_rate_limit_signals),
        ]);
    }
    println!("{table}");

    if anomalies.is_empty() {
        println!("no anomalies");
    } else {
        for anomaly in &anomalies {
            println!(
                "anomaly [{}] {}: baseline {:.1} latest {:.1} delta {:.1}",
                match anomaly.severity {
                    crate::domain::models::AnomalySeverity::High => "high",
                    crate::domain::models::AnomalySeverity::Medium => "medium",
                },
                anomaly.anomaly_type.as_str(),
                anomaly.baseline_value,
                anomaly.latest_value,
                anomaly.delta
            );
        }
    }

    Ok(u8::from(!anomalies.is_empty()))
}
