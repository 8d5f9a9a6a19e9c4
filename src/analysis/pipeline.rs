//! Analysis Orchestrator
//!
//! One detached task per upload, owning exactly one record:
//!
//! ```text
//! upload -> create(analyzing) -> permissions -> scanning
//!        -> score + ledger verify -> safe | dangerous
//!   any stage error ---------------------------------> failed
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use chrono::Utc;

use super::hasher::content_digest_blocking;
use super::oracle::{VerificationOracle, VerificationStatus};
use super::permissions::derive_permissions;
use super::scorer::assess;
use crate::error::{AppError, PipelineError};
use crate::models::{
    AnalysisPatch, AnalysisRecord, AnalysisStatus, MlAnalysis, NewAnalysis, UploadRequest,
};
use crate::store::AnalysisStore;

pub struct Orchestrator<O> {
    store: Arc<dyn AnalysisStore>,
    oracle: Arc<O>,
}

impl<O> Clone for Orchestrator<O> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            oracle: Arc::clone(&self.oracle),
        }
    }
}

impl<O: VerificationOracle> Orchestrator<O> {
    pub fn new(store: Arc<dyn AnalysisStore>, oracle: Arc<O>) -> Self {
        Self { store, oracle }
    }

    /// Create the placeholder record and start the pipeline in the
    /// background. Returns as soon as the record exists.
    pub async fn submit(&self, upload: UploadRequest) -> Result<AnalysisRecord, AppError> {
        let digest = content_digest_blocking(upload.bytes.clone())
            .await
            .map_err(|e| AppError::InternalError(format!("hashing task failed: {}", e)))?;

        tracing::info!(
            "APK received: filename={} size={} hash={}",
            upload.filename,
            upload.size(),
            digest
        );

        let record = self
            .store
            .create(NewAnalysis::pending(upload.filename, digest.clone()));

        let this = self.clone();
        let id = record.id;
        tokio::spawn(async move {
            this.run(id, upload.bytes, digest).await;
        });

        Ok(record)
    }

    /// Drive record `id` to a terminal status. Errors end in `failed` and
    /// are never propagated.
    pub async fn run(&self, id: u64, bytes: Bytes, digest: String) -> AnalysisStatus {
        match self.process(id, bytes, &digest).await {
            Ok(record) => {
                tracing::info!(
                    "Analysis {} finished: status={} score={} verified={}",
                    id, record.status, record.threat_score, record.blockchain_verified
                );
                self.record_on_ledger(&record).await;
                record.status
            }
            Err(e) => {
                tracing::error!("Analysis {} failed: {}", id, e);
                match self.store.update(id, AnalysisPatch::status(AnalysisStatus::Failed)) {
                    Ok(record) => record.status,
                    Err(store_err) => {
                        tracing::error!("Could not mark analysis {} as failed: {}", id, store_err);
                        self.store
                            .get(id)
                            .map(|r| r.status)
                            .unwrap_or(AnalysisStatus::Failed)
                    }
                }
            }
        }
    }

    async fn process(
        &self,
        id: u64,
        bytes: Bytes,
        digest: &str,
    ) -> Result<AnalysisRecord, PipelineError> {
        // Stage 1: permissions
        let permissions = tokio::task::spawn_blocking(move || derive_permissions(&bytes))
            .await
            .map_err(|e| PipelineError::Stage(format!("permission derivation: {}", e)))?;

        self.store.update(id, AnalysisPatch {
            status: Some(AnalysisStatus::Scanning),
            permissions: Some(permissions.clone()),
            ..Default::default()
        })?;
        tracing::debug!("Analysis {} scanning ({} permissions)", id, permissions.len());

        // Stage 2: score + ledger
        let assessment = assess(&permissions, digest);
        tracing::debug!("{}", assessment.summary(digest));

        let ledger = self.oracle.verify(digest).await?;

        let status = if assessment.is_safe {
            AnalysisStatus::Safe
        } else {
            AnalysisStatus::Dangerous
        };

        let record = self.store.update(id, AnalysisPatch {
            status: Some(status),
            threat_score: Some(assessment.threat_score),
            ml_analysis: Some(MlAnalysis {
                malware_prob: assessment.malware_prob(),
                suspicious_apis: assessment.suspicious_apis,
            }),
            blockchain_verified: Some(ledger.verified),
            ..Default::default()
        })?;

        Ok(record)
    }

    /// Fire-and-forget for verified packages; a failure here is only logged
    async fn record_on_ledger(&self, record: &AnalysisRecord) {
        if !record.blockchain_verified {
            return;
        }

        let status = VerificationStatus {
            verified: record.blockchain_verified,
            threat_score: record.threat_score,
            timestamp: Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.oracle.record_verification(&record.file_hash, status).await {
            tracing::warn!("Ledger record for analysis {} skipped: {}", record.id, e);
        }
    }
}
