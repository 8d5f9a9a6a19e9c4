//! Content Hasher
//!
//! SHA-256 of the uploaded bytes, hex encoded. The digest is both the record's
//! `fileHash` and the seed for every later decision.

use axum::body::Bytes;
use sha2::{Digest, Sha256};
use tokio::task::JoinError;

/// Length of a hex SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Hex SHA-256 of `bytes`
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hash on the blocking pool; uploads can be up to 100 MiB
pub async fn content_digest_blocking(bytes: Bytes) -> Result<String, JoinError> {
    tokio::task::spawn_blocking(move || content_digest(&bytes)).await
}
