//! Hashing utilities for stable path keys.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Short (16 hex char) stable digest of a path.
///
/// Used to key output subdirectories for external sources; must be stable
/// across processes, so this is a content hash rather than `std::hash`.
pub fn short_path_hash(path: &Path) -> String {
    sha256_bytes(path.to_string_lossy().as_bytes())[..16].to_string()
}
