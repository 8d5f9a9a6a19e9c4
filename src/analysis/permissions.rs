//! Permission Deriver
//!
//! Placeholder for manifest parsing: the permission list is chosen from the
//! content digest alone. The trigger predicate (prefix `4` OR substring `bad`)
//! is kept exactly as is and should not be grown into real heuristics here.

use super::hasher::content_digest;

/// Requested by every package
pub const BASELINE_PERMISSIONS: [&str; 2] = [
    "android.permission.INTERNET",
    "android.permission.ACCESS_NETWORK_STATE",
];

/// Appended when the digest trips the trigger
pub const FLAGGED_PERMISSIONS: [&str; 5] = [
    "android.permission.DANGEROUS_PERMISSION",
    "android.permission.READ_SMS",
    "android.permission.SEND_SMS",
    "android.permission.ACCESS_FINE_LOCATION",
    "android.permission.READ_PHONE_STATE",
];

/// Digest prefix shared by the deriver trigger and the safety verdict
pub const FLAGGED_DIGEST_PREFIX: char = '4';
const FLAGGED_DIGEST_MARKER: &str = "bad";

/// Derive the permission list of an uploaded package
pub fn derive_permissions(bytes: &[u8]) -> Vec<String> {
    permissions_for_digest(&content_digest(bytes))
}

/// Same as [`derive_permissions`] for an already computed digest
pub fn permissions_for_digest(digest: &str) -> Vec<String> {
    let mut permissions: Vec<String> = BASELINE_PERMISSIONS.iter().map(|p| p.to_string()).collect();

    if is_flagged_digest(digest) {
        permissions.extend(FLAGGED_PERMISSIONS.iter().map(|p| p.to_string()));
    }

    permissions
}

pub fn is_flagged_digest(digest: &str) -> bool {
    digest.starts_with(FLAGGED_DIGEST_PREFIX) || digest.contains(FLAGGED_DIGEST_MARKER)
}
