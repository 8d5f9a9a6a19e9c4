//! APK analysis pipeline
//!
//! # Components
//! - `hasher.rs`: content digest (SHA-256)
//! - `permissions.rs`: digest-keyed permission list
//! - `scorer.rs`: dangerous-permission ratio and safety verdict
//! - `oracle.rs`: mock ledger verification
//! - `pipeline.rs`: per-upload orchestration and status transitions

pub mod hasher;
pub mod permissions;
pub mod scorer;
pub mod oracle;
pub mod pipeline;

pub use hasher::{content_digest, content_digest_blocking};
pub use permissions::derive_permissions;
pub use scorer::{assess, ThreatAssessment, DANGEROUS_PERMISSIONS};
pub use oracle::{LedgerOracle, LedgerVerification, VerificationOracle, VerificationStatus};
pub use pipeline::Orchestrator;
