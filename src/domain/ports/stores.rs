//! Whole-document store ports.
//!
//! The core's only contract with storage: read the whole document, write the
//! whole document back. No partial updates, no row-level locking. Callers
//! must serialize recovery/governance runs against the same scope to avoid
//! lost updates.

use async_trait::async_trait;

use crate::domain::error::StoreError;
use crate::domain::models::{RecoveryMemory, RunRecord};

/// Persistence seam for the recovery memory document.
///
/// A corrupt or unreadable document loads as the empty document; only write
/// failures propagate.
#[async_trait]
pub trait RecoveryStore: Send + Sync {
    /// Read the whole document.
    async fn load(&self) -> Result<RecoveryMemory, StoreError>;

    /// Replace the whole document.
    async fn save(&self, memory: &RecoveryMemory) -> Result<(), StoreError>;
}

/// Enumerable source of historical run summaries for the KPI engine and
/// governance health assessment.
#[async_trait]
pub trait RunHistory: Send + Sync {
    /// Load all parseable run records. Individually unparseable records are
    /// skipped, not fatal.
    async fn load_records(&self) -> Result<Vec<RunRecord>, StoreError>;

    /// Append one run summary.
    async fn append(&self, record: &RunRecord) -> Result<(), StoreError>;

    /// Drop records older than `ttl_days`. Returns how many were removed.
    async fn prune_older_than(&self, ttl_days: i64) -> Result<usize, StoreError>;
}

/// In-memory recovery store for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryRecoveryStore {
    inner: std::sync::Mutex<RecoveryMemory>,
}

impl InMemoryRecoveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing document.
    pub fn with_memory(memory: RecoveryMemory) -> Self {
        Self {
            inner: std::sync::Mutex::new(memory),
        }
    }
}

#[async_trait]
impl RecoveryStore for InMemoryRecoveryStore {
    async fn load(&self) -> Result<RecoveryMemory, StoreError> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, memory: &RecoveryMemory) -> Result<(), StoreError> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = memory.clone();
        Ok(())
    }
}
