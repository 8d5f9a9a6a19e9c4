//! Configuration module

use std::env;
use std::time::Duration;

/// 100 MiB, the largest APK accepted by `/api/analyze`
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Room left on top of the file limit for multipart boundaries, part
/// headers and other form fields
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Maximum accepted APK size in bytes
    pub max_upload_bytes: usize,

    /// Synthetic delays of the ledger oracle
    pub ledger: LedgerTimings,

    /// Environment (development, production)
    pub environment: String,
}

/// Synthetic latencies of the mock ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTimings {
    /// One-time connection warm-up
    pub init_delay: Duration,
    /// Per verification lookup
    pub verify_delay: Duration,
    /// Per recorded verification
    pub record_delay: Duration,
}

impl Default for LedgerTimings {
    fn default() -> Self {
        Self {
            init_delay: Duration::from_millis(500),
            verify_delay: Duration::from_millis(1000),
            record_delay: Duration::from_millis(800),
        }
    }
}

impl LedgerTimings {
    /// No delays at all (tests)
    pub fn instant() -> Self {
        Self {
            init_delay: Duration::ZERO,
            verify_delay: Duration::ZERO,
            record_delay: Duration::ZERO,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ledger: LedgerTimings::default(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let ledger_defaults = defaults.ledger;

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),

            ledger: LedgerTimings {
                init_delay: millis_from_env("LEDGER_INIT_DELAY_MS")
                    .unwrap_or(ledger_defaults.init_delay),
                verify_delay: millis_from_env("LEDGER_VERIFY_DELAY_MS")
                    .unwrap_or(ledger_defaults.verify_delay),
                record_delay: millis_from_env("LEDGER_RECORD_DELAY_MS")
                    .unwrap_or(ledger_defaults.record_delay),
            },

            environment: env::var("ENVIRONMENT")
                .unwrap_or(defaults.environment),
        }
    }

    /// Whole-request limit for `/api/analyze`. The file itself is checked
    /// against `max_upload_bytes` while the body is read.
    pub fn upload_body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn millis_from_env(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_upload_limit_and_delays() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_upload_bytes, 104_857_600);
        assert_eq!(config.ledger.verify_delay, Duration::from_secs(1));
        assert!(!config.is_production());
    }

    #[test]
    fn test_body_limit_leaves_room_for_multipart_framing() {
        let config = Config {
            max_upload_bytes: 1024,
            ..Config::default()
        };
        assert_eq!(config.upload_body_limit(), 1024 + MULTIPART_OVERHEAD_BYTES);

        let unbounded = Config {
            max_upload_bytes: usize::MAX,
            ..Config::default()
        };
        assert_eq!(unbounded.upload_body_limit(), usize::MAX);
    }

    #[test]
    fn test_instant_timings_are_zero() {
        let timings = LedgerTimings::instant();
        assert!(timings.init_delay.is_zero());
        assert!(timings.verify_delay.is_zero());
        assert!(timings.record_delay.is_zero());
    }
}
