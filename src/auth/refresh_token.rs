/// Refresh Token Fingerprints
///
/// The store never sees a refresh token in plaintext. It keeps the SHA-256
/// fingerprint of the most recently issued token, and presented tokens are
/// compared by fingerprint.

use sha2::{Digest, Sha256};

/// Hex SHA-256 digest of a refresh token
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether `token` is the one whose fingerprint is stored
pub fn matches_stored(stored: Option<&str>, token: &str) -> bool {
    stored.map_or(false, |stored| stored == fingerprint(token))
}
