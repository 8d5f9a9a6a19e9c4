//! Analysis record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// STATUS STATE MACHINE
// ============================================================================

/// Lifecycle of an analysis.
///
/// ```text
/// analyzing -> scanning -> safe | dangerous
///     \___________\______-> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Analyzing,
    Scanning,
    Safe,
    Dangerous,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Scanning => "scanning",
            AnalysisStatus::Safe => "safe",
            AnalysisStatus::Dangerous => "dangerous",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// Safe, dangerous and failed never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisStatus::Safe | AnalysisStatus::Dangerous | AnalysisStatus::Failed
        )
    }

    /// Whether `self -> next` is a legal move. Re-asserting the current
    /// non-terminal status is allowed so that field-only patches can repeat it.
    pub fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        use AnalysisStatus::*;
        match (*self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Failed) => true,
            (Analyzing, Analyzing | Scanning) => true,
            (Scanning, Scanning | Safe | Dangerous) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Output of the scoring stage, shaped like a model verdict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlAnalysis {
    /// 0.0 - 1.0
    pub malware_prob: f64,
    #[serde(rename = "suspiciousAPIs")]
    pub suspicious_apis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: u64,
    pub filename: String,
    pub file_hash: String,
    pub status: AnalysisStatus,
    pub permissions: Vec<String>,
    /// 0 - 100
    pub threat_score: u8,
    pub ml_analysis: MlAnalysis,
    pub blockchain_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Draft handed to the store; id and creation time are assigned there
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub filename: String,
    pub file_hash: String,
    pub status: AnalysisStatus,
    pub permissions: Vec<String>,
    pub threat_score: u8,
    pub ml_analysis: MlAnalysis,
    pub blockchain_verified: bool,
}

impl NewAnalysis {
    /// Placeholder record written at upload time
    pub fn pending(filename: impl Into<String>, file_hash: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_hash: file_hash.into(),
            status: AnalysisStatus::Analyzing,
            permissions: Vec::new(),
            threat_score: 0,
            ml_analysis: MlAnalysis::default(),
            blockchain_verified: false,
        }
    }
}

/// Shallow patch: every `Some` replaces the stored field wholesale
#[derive(Debug, Clone, Default)]
pub struct AnalysisPatch {
    pub status: Option<AnalysisStatus>,
    pub permissions: Option<Vec<String>>,
    pub threat_score: Option<u8>,
    pub ml_analysis: Option<MlAnalysis>,
    pub blockchain_verified: Option<bool>,
}

impl AnalysisPatch {
    pub fn status(status: AnalysisStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub(crate) fn apply(self, record: &mut AnalysisRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(permissions) = self.permissions {
            record.permissions = permissions;
        }
        if let Some(score) = self.threat_score {
            record.threat_score = score.min(100);
        }
        if let Some(ml) = self.ml_analysis {
            record.ml_analysis = ml;
        }
        if let Some(verified) = self.blockchain_verified {
            record.blockchain_verified = verified;
        }
    }
}

// ============================================================================
// PRESENTATION HELPERS
// ============================================================================

/// Scores above this block installation regardless of status
pub const INSTALL_MAX_THREAT_SCORE: u8 = 70;

#[derive(Debug, Clone, Serialize)]
pub struct InstallDecision {
    pub id: u64,
    pub allowed: bool,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub threat_score: u8,
}

impl AnalysisRecord {
    /// Install gate shown on the dashboard card
    pub fn install_decision(&self) -> InstallDecision {
        let reason = match self.status {
            AnalysisStatus::Analyzing | AnalysisStatus::Scanning => "analysis still in progress",
            AnalysisStatus::Failed => "analysis failed",
            _ if self.threat_score > INSTALL_MAX_THREAT_SCORE => "threat score above 70",
            AnalysisStatus::Dangerous => "flagged dangerous",
            _ if !self.blockchain_verified => "not verified on ledger",
            _ => "verified safe package",
        };

        InstallDecision {
            id: self.id,
            allowed: self.blockchain_verified
                && self.status == AnalysisStatus::Safe
                && self.threat_score <= INSTALL_MAX_THREAT_SCORE,
            reason,
        }
    }

    pub fn trend_point(&self) -> TrendPoint {
        TrendPoint {
            id: self.id,
            created_at: self.created_at,
            threat_score: self.threat_score,
        }
    }
}
