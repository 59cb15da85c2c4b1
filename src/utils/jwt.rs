//! Signed session tokens carried in the `token` cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims of a session token. `sub` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub first_name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer and verifier for session tokens.
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Token lifetime, also used as the cookie max-age.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(
        &self,
        user_id: i64,
        first_name: &str,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            first_name: first_name.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verifies signature and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let tokens = SessionTokens::new("secret", 48);
        let token = tokens.issue(42, "Ada", "ada@example.com").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 48 * 3600);
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = SessionTokens::new("secret-a", 48)
            .issue(1, "Ada", "ada@example.com")
            .unwrap();
        assert!(SessionTokens::new("secret-b", 48).verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let token = SessionTokens::new("secret", -1)
            .issue(1, "Ada", "ada@example.com")
            .unwrap();
        assert!(SessionTokens::new("secret", 48).verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(SessionTokens::new("secret", 48).verify("not.a.jwt").is_err());
    }
}
