//! Analysis record store
//!
//! In-memory only: records live as long as the process.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::models::{AnalysisPatch, AnalysisRecord, NewAnalysis};

/// Ownership point for analysis records
pub trait AnalysisStore: Send + Sync {
    /// Assign the next id and creation time, then store the record
    fn create(&self, draft: NewAnalysis) -> AnalysisRecord;

    fn get(&self, id: u64) -> Option<AnalysisRecord>;

    /// Unordered; callers sort for display
    fn get_all(&self) -> Vec<AnalysisRecord>;

    /// Shallow-merge `patch` into record `id`. Never creates a record.
    fn update(&self, id: u64, patch: AnalysisPatch) -> Result<AnalysisRecord, StoreError>;

    /// Number of stored records, without copying them
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct StoreInner {
    next_id: u64,
    records: HashMap<u64, AnalysisRecord>,
}

pub struct MemStore {
    inner: RwLock<StoreInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                next_id: 1,
                records: HashMap::new(),
            }),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStore for MemStore {
    fn create(&self, draft: NewAnalysis) -> AnalysisRecord {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;

        let record = AnalysisRecord {
            id,
            filename: draft.filename,
            file_hash: draft.file_hash,
            status: draft.status,
            permissions: draft.permissions,
            threat_score: draft.threat_score.min(100),
            ml_analysis: draft.ml_analysis,
            blockchain_verified: draft.blockchain_verified,
            created_at: Utc::now(),
        };
        inner.records.insert(id, record.clone());
        record
    }

    fn get(&self, id: u64) -> Option<AnalysisRecord> {
        self.inner.read().records.get(&id).cloned()
    }

    fn get_all(&self) -> Vec<AnalysisRecord> {
        self.inner.read().records.values().cloned().collect()
    }

    fn update(&self, id: u64, patch: AnalysisPatch) -> Result<AnalysisRecord, StoreError> {
        let mut inner = self.inner.write();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(next) = patch.status {
            if !record.status.can_transition_to(next) {
                return Err(StoreError::InvalidTransition {
                    id,
                    from: record.status,
                    to: next,
                });
            }
        }

        patch.apply(record);
        Ok(record.clone())
    }

    fn len(&self) -> usize {
        self.inner.read().records.len()
    }
}
