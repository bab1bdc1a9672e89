//! JSON file store for the recovery memory document.
//!
//! Whole-document contract: read the file, write the file. Writes replace
//! the document atomically (write to a sibling temp file, then rename) so a
//! crashed writer never leaves a torn document behind. No in-process
//! caching: every load re-reads truth from disk. Concurrent writers are
//! last-writer-wins by design.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::domain::error::StoreError;
use crate::domain::models::RecoveryMemory;
use crate::domain::ports::RecoveryStore;

/// File-backed recovery memory store.
pub struct FileRecoveryStore {
    path: PathBuf,
}

impl FileRecoveryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecoveryStore for FileRecoveryStore {
    /// Read the whole document.
    ///
    /// A missing, unreadable-as-JSON, or wrong-shaped file loads as the
    /// empty document: recovery memory is advisory and must never make the
    /// scheduler unavailable.
    async fn load(&self) -> Result<RecoveryMemory, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RecoveryMemory::default());
            }
            Err(err) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    source: err,
                })
            }
        };

        match serde_json::from_str(&raw) {
            Ok(memory) => Ok(memory),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "recovery memory document is corrupt, treating as empty"
                );
                Ok(RecoveryMemory::default())
            }
        }
    }

    /// Replace the whole document atomically.
    async fn save(&self, memory: &RecoveryMemory) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_vec_pretty(memory).map_err(|source| StoreError::Encode {
                path: self.path.display().to_string(),
                source,
            })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::Write {
                        path: parent.display().to_string(),
                        source,
                    })?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &encoded)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp_path.display().to_string(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.display().to_string(),
                source,
            })
    }
}
