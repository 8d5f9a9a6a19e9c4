//! Verification Oracle
//!
//! Stand-in for a ledger lookup. Verification is a set-membership test on
//! the first 13 hex characters of the digest; every network step is a fixed
//! sleep. Nothing leaves the process.

use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::config::LedgerTimings;
use crate::error::PipelineError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Digest characters compared against the trusted set
pub const LEDGER_PREFIX_LEN: usize = 13;

/// Prefixes of packages known to the ledger
pub const TRUSTED_HASH_PREFIXES: [&str; 2] = ["6377f61d9c808", "46e932984cc12"];

pub const VERIFIED_CONFIDENCE: f64 = 0.95;
pub const UNVERIFIED_CONFIDENCE: f64 = 0.2;
pub const LEDGER_NODES: u32 = 25;

const TX_HASH_LEN: usize = 40;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerVerification {
    pub verified: bool,
    /// Cosmetic
    pub confidence: f64,
    /// Cosmetic
    pub network_nodes: u32,
}

/// What gets written to the ledger after an analysis finishes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    pub verified: bool,
    pub threat_score: u8,
    /// Unix millis
    pub timestamp: i64,
}

/// External ledger collaborator used by the analysis pipeline
pub trait VerificationOracle: Send + Sync + 'static {
    fn verify(
        &self,
        digest: &str,
    ) -> impl Future<Output = Result<LedgerVerification, PipelineError>> + Send;

    /// Returns a transaction id. Has no effect on stored records.
    fn record_verification(
        &self,
        digest: &str,
        status: VerificationStatus,
    ) -> impl Future<Output = Result<String, PipelineError>> + Send;
}

// ============================================================================
// MOCK LEDGER
// ============================================================================

pub struct LedgerOracle {
    timings: LedgerTimings,
    trusted: HashSet<String>,
    connected: OnceCell<()>,
}

impl LedgerOracle {
    pub fn new(timings: LedgerTimings) -> Self {
        Self::with_trusted(timings, TRUSTED_HASH_PREFIXES)
    }

    /// Custom trusted prefixes; entries longer than the compared prefix are
    /// truncated so they can match
    pub fn with_trusted<I, S>(timings: LedgerTimings, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            timings,
            trusted: prefixes
                .into_iter()
                .map(|p| ledger_prefix(p.as_ref()).to_string())
                .collect(),
            connected: OnceCell::new(),
        }
    }

    pub fn is_trusted(&self, digest: &str) -> bool {
        self.trusted.contains(ledger_prefix(digest))
    }

    /// One-time synthetic connection
    async fn connect(&self) {
        self.connected
            .get_or_init(|| async {
                tokio::time::sleep(self.timings.init_delay).await;
                tracing::debug!("Ledger connection established ({} nodes)", LEDGER_NODES);
            })
            .await;
    }
}

impl VerificationOracle for LedgerOracle {
    async fn verify(&self, digest: &str) -> Result<LedgerVerification, PipelineError> {
        self.connect().await;
        tokio::time::sleep(self.timings.verify_delay).await;

        let verified = self.is_trusted(digest);
        Ok(LedgerVerification {
            verified,
            confidence: if verified { VERIFIED_CONFIDENCE } else { UNVERIFIED_CONFIDENCE },
            network_nodes: LEDGER_NODES,
        })
    }

    async fn record_verification(
        &self,
        digest: &str,
        status: VerificationStatus,
    ) -> Result<String, PipelineError> {
        self.connect().await;
        tokio::time::sleep(self.timings.record_delay).await;

        let tx_hash = transaction_id(digest)
            .ok_or_else(|| PipelineError::Upstream("cannot record an empty digest".to_string()))?;

        tracing::info!(
            "Recorded verification for {}: verified={} score={} at {} (tx {})",
            digest, status.verified, status.threat_score, status.timestamp, tx_hash
        );
        Ok(tx_hash)
    }
}

/// First [`LEDGER_PREFIX_LEN`] characters (fewer for short input)
fn ledger_prefix(digest: &str) -> &str {
    match digest.char_indices().nth(LEDGER_PREFIX_LEN) {
        Some((idx, _)) => &digest[..idx],
        None => digest,
    }
}

/// `0x` + 40 hex chars, char `i` = `(digest[i % len] + i) % 16`.
/// Deterministic, not a hash.
pub fn transaction_id(digest: &str) -> Option<String> {
    let bytes = digest.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    let body: String = (0..TX_HASH_LEN)
        .map(|i| {
            let nibble = (usize::from(bytes[i % bytes.len()]) + i) % 16;
            char::from_digit(nibble as u32, 16).unwrap_or('0')
        })
        .collect();
    Some(format!("0x{}", body))
}
