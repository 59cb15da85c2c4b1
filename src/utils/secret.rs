//! One-time secrets: email verification tokens and password reset PINs.
//!
//! Secrets are handed to the user once and persisted only as an
//! HMAC-SHA256 digest keyed by the server secret, so a database dump alone
//! cannot be used to confirm an account or reset a password.

use hmac::{Hmac, Mac};
use rand::Rng;
use serde_json::json;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a verification token (hex-encoded to 64 chars).
const TOKEN_BYTES: usize = 32;

/// Hex-encoded HMAC-SHA256 of `value` keyed by `key`.
pub fn hash_secret(key: &str, value: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(value.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of a candidate secret against a stored digest.
pub fn secret_matches(key: &str, candidate: &str, stored_hash: &str) -> bool {
    let Ok(expected) = hex::decode(stored_hash) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(candidate.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Generates a 64-character hex verification token from the OS RNG.
pub fn generate_verification_token() -> Result<String, AppError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "OS random source unavailable");
        AppError::internal("Failed to generate token", json!({}))
    })?;
    Ok(hex::encode(bytes))
}

/// Generates a six-digit numeric PIN (no leading zero).
pub fn generate_pin() -> String {
    rand::rng().random_range(100_000..1_000_000u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_keyed() {
        let a = hash_secret("key-a", "token");
        let b = hash_secret("key-b", "token");
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, hash_secret("key-a", "token"));
    }

    #[test]
    fn test_secret_matches() {
        let stored = hash_secret("k", "123456");
        assert!(secret_matches("k", "123456", &stored));
        assert!(!secret_matches("k", "654321", &stored));
        assert!(!secret_matches("other", "123456", &stored));
        assert!(!secret_matches("k", "123456", "not-hex"));
    }

    #[test]
    fn test_verification_token_shape() {
        let token = generate_verification_token().unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_verification_token().unwrap());
    }

    #[test]
    fn test_pin_is_six_digits() {
        for _ in 0..50 {
            let pin = generate_pin();
            assert_eq!(pin.len(), 6);
            assert!(pin.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
