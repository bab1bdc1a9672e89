//! Run archive: one JSON summary document per run.
//!
//! The archive directory is the KPI engine's and governance's source of
//! truth. Each run is its own `<run_id>.json` file; enumeration parses each
//! file individually and skips the unparseable ones rather than failing the
//! whole query.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::domain::error::StoreError;
use crate::domain::models::RunRecord;
use crate::domain::ports::RunHistory;

/// Directory-backed run history.
pub struct RunArchive {
    dir: PathBuf,
}

impl RunArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, record: &RunRecord) -> PathBuf {
        self.dir.join(format!("{}.json", record.run_id))
    }
}

#[async_trait]
impl RunHistory for RunArchive {
    async fn load_records(&self) -> Result<Vec<RunRecord>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Read {
                    path: self.dir.display().to_string(),
                    source: err,
                })
            }
        };

        let mut records = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(raw) = tokio::fs::read_to_string(&path).await else {
                warn!(path = %path.display(), "unreadable run summary, skipping");
                continue;
            };
            match serde_json::from_str::<RunRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unparseable run summary, skipping");
                }
            }
        }

        debug!(records = records.len(), "loaded run archive");
        Ok(records)
    }

    async fn append(&self, record: &RunRecord) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Write {
                path: self.dir.display().to_string(),
                source,
            })?;

        let encoded = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Encode {
            path: self.dir.display().to_string(),
            source,
        })?;
        let path = self.record_path(record);
        tokio::fs::write(&path, encoded)
            .await
            .map_err(|source| StoreError::Write {
                path: path.display().to_string(),
                source,
            })
    }

    async fn prune_older_than(&self, ttl_days: i64) -> Result<usize, StoreError> {
        let cutoff = Utc::now() - Duration::days(ttl_days);
        let records = self.load_records().await?;
        let mut removed = 0usize;

        for record in records {
            let stale = record
                .effective_timestamp()
                .is_none_or(|t| t < cutoff);
            if stale {
                let path = self.record_path(&record);
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(days_ago: i64) -> RunRecord {
        RunRecord {
            run_id: Uuid::new_v4(),
            mode: "batch".to_string(),
            status: "completed".to_string(),
            completed_at: Some(Utc::now() - Duration::days(days_ago)),
            updated_at: None,
            success_rate_percent: 100.0,
            completion_rate_percent: 100.0,
            failed_goals: 0,
            total_sub_artifacts: 1,
            estimated_created: 1,
            gate_passed: true,
            rate_limit_signals: 0,
            rate_limit_backoff_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_missing_dir_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let archive = RunArchive::new(dir.path().join("absent"));
        assert!(archive.load_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let archive = RunArchive::new(dir.path());

        archive.append(&record(0)).await.unwrap();
        archive.append(&record(1)).await.unwrap();

        let records = archive.load_records().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_summary_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let archive = RunArchive::new(dir.path());
        archive.append(&record(0)).await.unwrap();
        std::fs::write(dir.path().join("junk.json"), "not a record").unwrap();

        let records = archive.load_records().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_prune_removes_stale_runs() {
        let dir = tempfile::tempdir().unwrap();
        let archive = RunArchive::new(dir.path());
        archive.append(&record(0)).await.unwrap();
        archive.append(&record(90)).await.unwrap();

        let removed = archive.prune_older_than(30).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(archive.load_records().await.unwrap().len(), 1);
    }
}
