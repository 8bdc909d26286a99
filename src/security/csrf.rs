//! CSRF tokens bound to a session.
//!
//! A token is the hex SHA-256 of the server secret followed by the session
//! id. Without the secret a token cannot be derived from the session id.

use sha2::{Digest, Sha256};

/// Derive the token for `session_id`.
pub fn generate_token(secret: &str, session_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update([0u8]);
    hasher.update(session_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check `token` against the token derived for `session_id`.
pub fn validate_token(secret: &str, session_id: &str, token: &str) -> bool {
    constant_time_eq(token, &generate_token(secret, session_id))
}

/// Compare without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}
