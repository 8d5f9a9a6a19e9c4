//! Threat Scorer
//!
//! Ratio of dangerous permissions, scaled to 0-100.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::Serialize;

use super::permissions::FLAGGED_DIGEST_PREFIX;

// ============================================================================
// REFERENCE SET
// ============================================================================

/// String-matching reference only; not derived from platform policy
pub const DANGEROUS_PERMISSIONS: [&str; 10] = [
    "android.permission.ACCESS_FINE_LOCATION",
    "android.permission.READ_CONTACTS",
    "android.permission.WRITE_CONTACTS",
    "android.permission.RECORD_AUDIO",
    "android.permission.CAMERA",
    "android.permission.READ_SMS",
    "android.permission.SEND_SMS",
    "android.permission.RECEIVE_SMS",
    "android.permission.DANGEROUS_PERMISSION",
    "android.permission.SYSTEM_ALERT_WINDOW",
];

/// Scores at or above this are never safe
pub const SAFE_SCORE_LIMIT: u8 = 50;

fn dangerous_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| DANGEROUS_PERMISSIONS.into_iter().collect())
}

pub fn is_dangerous(permission: &str) -> bool {
    dangerous_set().contains(permission)
}

// ============================================================================
// ASSESSMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatAssessment {
    pub total_permissions: usize,
    pub dangerous_count: usize,
    /// 0 - 100
    pub threat_score: u8,
    /// Dangerous permissions in input order
    pub suspicious_apis: Vec<String>,
    pub is_safe: bool,
}

impl ThreatAssessment {
    /// `threat_score` as a probability
    pub fn malware_prob(&self) -> f64 {
        f64::from(self.threat_score) / 100.0
    }

    /// Human readable report, logged by the pipeline
    pub fn summary(&self, digest: &str) -> String {
        let prefix: String = digest.chars().take(16).collect();
        format!(
            "APK security analysis:\n  - {} total permissions required\n  - {} dangerous permissions detected\n  - Content hash: {}...\n  - Safety status: {}",
            self.total_permissions,
            self.dangerous_count,
            prefix,
            if self.is_safe { "Safe" } else { "Potentially dangerous" },
        )
    }
}

/// Score `permissions` for the package with content digest `digest`.
///
/// A digest starting with `4` is never safe, matching the deriver's trigger.
pub fn assess(permissions: &[String], digest: &str) -> ThreatAssessment {
    let suspicious_apis: Vec<String> = permissions
        .iter()
        .filter(|p| is_dangerous(p))
        .cloned()
        .collect();
    let dangerous_count = suspicious_apis.len();

    let threat_score = threat_score(dangerous_count, permissions.len());
    let is_safe = threat_score < SAFE_SCORE_LIMIT && !digest.starts_with(FLAGGED_DIGEST_PREFIX);

    ThreatAssessment {
        total_permissions: permissions.len(),
        dangerous_count,
        threat_score,
        suspicious_apis,
        is_safe,
    }
}

/// `round(dangerous / total * 100)` clamped to 0-100, 0 for an empty list
pub fn threat_score(dangerous: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = dangerous as f64 / total as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::permissions::{permissions_for_digest, BASELINE_PERMISSIONS};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reference_set_has_ten_entries() {
        assert_eq!(dangerous_set().len(), 10);
        assert!(is_dangerous("android.permission.CAMERA"));
        assert!(!is_dangerous("android.permission.INTERNET"));
    }

    #[test]
    fn test_empty_list_scores_zero() {
        let result = assess(&[], &"0".repeat(64));
        assert_eq!(result.threat_score, 0);
        assert!(result.suspicious_apis.is_empty());
        assert!(result.is_safe);
    }

    #[test]
    fn test_score_bounds() {
        for total in 0..20 {
            for dangerous in 0..=total {
                assert!(threat_score(dangerous, total) <= 100);
            }
        }
        assert_eq!(threat_score(1, 3), 33);
        assert_eq!(threat_score(2, 3), 67);
        assert_eq!(threat_score(5, 5), 100);
    }

    #[test]
    fn test_baseline_is_safe() {
        let perms = strings(&BASELINE_PERMISSIONS);
        let result = assess(&perms, &"a".repeat(64));
        assert_eq!(result.dangerous_count, 0);
        assert_eq!(result.threat_score, 0);
        assert!(result.is_safe);
        assert_eq!(result.malware_prob(), 0.0);
    }

    #[test]
    fn test_flagged_digest_is_dangerous() {
        let digest = format!("4{}", "0".repeat(63));
        let perms = permissions_for_digest(&digest);
        let result = assess(&perms, &digest);
        assert_eq!(result.total_permissions, 7);
        assert_eq!(result.dangerous_count, 4);
        assert_eq!(result.threat_score, 57);
        assert!(!result.is_safe);
    }

    #[test]
    fn test_prefix_four_overrides_low_score() {
        let digest = format!("4{}", "0".repeat(63));
        let result = assess(&strings(&BASELINE_PERMISSIONS), &digest);
        assert_eq!(result.threat_score, 0);
        assert!(!result.is_safe);
    }

    #[test]
    fn test_suspicious_apis_subset_in_order() {
        let perms = strings(&[
            "android.permission.SEND_SMS",
            "android.permission.INTERNET",
            "android.permission.CAMERA",
            "com.example.CUSTOM",
        ]);
        let result = assess(&perms, &"c".repeat(64));
        assert_eq!(
            result.suspicious_apis,
            strings(&["android.permission.SEND_SMS", "android.permission.CAMERA"])
        );
        assert!(result.suspicious_apis.iter().all(|p| perms.contains(p) && is_dangerous(p)));
        assert_eq!(result.threat_score, 50);
        assert!(!result.is_safe);
    }

    #[test]
    fn test_summary_mentions_counts_and_prefix() {
        let digest = "0123456789abcdef0123";
        let result = assess(&strings(&BASELINE_PERMISSIONS), digest);
        let summary = result.summary(digest);
        assert!(summary.contains("2 total permissions"));
        assert!(summary.contains("0 dangerous permissions"));
        assert!(summary.contains("0123456789abcdef..."));
        assert!(summary.contains("Safe"));
    }
}
