//! Single-use password-reset tokens.
//!
//! The plaintext token goes to the user; only its SHA-256 hex digest is
//! stored, so a database leak does not expose usable tokens.

use chrono::{Duration, Utc};
use eventhub_core::types::Timestamp;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Reset tokens expire this many minutes after issue.
pub const RESET_TOKEN_TTL_MINS: i64 = 10;

/// Generate a random reset token.
///
/// Returns `(plaintext_token, sha256_hex_hash)`.
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    let plaintext: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    let hash = hash_reset_token(&plaintext);
    (plaintext, hash)
}

/// Compute the SHA-256 hex digest of a reset token.
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Expiry for a token issued now.
pub fn reset_token_expiry() -> Timestamp {
    Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINS)
}
