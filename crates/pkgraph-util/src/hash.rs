use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of a byte slice, returning a lowercase hex string.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// A 16-character digest of `text`, stable across runs and platforms.
///
/// Used to give every dependency location its own directory in the shared
/// checkout cache without leaking URL characters into file names.
pub fn short_digest(text: &str) -> String {
    let mut digest = sha256_bytes(text.as_bytes());
    digest.truncate(16);
    digest
}
