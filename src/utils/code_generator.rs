//! Short code generation and custom alias validation.
//!
//! Generated codes are the first 8 hex characters of
//! `sha256(url + timestamp + nonce)`. The timestamp salt makes repeated
//! submissions of the same URL produce different codes; the store's unique
//! constraint is the collision backstop, there is no retry loop.
//!
//! Aliases are validated by [`parse_alias`], the single rule shared by link
//! creation, alias updates and the public availability check.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Number of hex characters kept from the digest.
pub const CODE_LENGTH: usize = 8;

/// Message shown whenever an alias fails the format rule.
pub const ALIAS_FORMAT_MESSAGE: &str = "Invalid format (3-20 a-z, 0-9, _, -)";

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,20}$").expect("valid alias regex"));

/// Derives a short code for `url`.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code("https://example.com");
/// assert_eq!(code.len(), 8);
/// assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
pub fn generate_code(url: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let nonce: u64 = rand::random();

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(nanos.to_string().as_bytes());
    hasher.update(nonce.to_be_bytes());

    let mut code = hex::encode(hasher.finalize());
    code.truncate(CODE_LENGTH);
    code
}

/// Validates a user-supplied alias and returns its stored (lowercase) form.
///
/// Accepts 3-20 characters from `a-z`, `0-9`, `_` and `-`, case-insensitively.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the alias does not match the rule.
pub fn parse_alias(alias: &str) -> Result<String, AppError> {
    if !ALIAS_RE.is_match(alias) {
        return Err(AppError::bad_request(
            ALIAS_FORMAT_MESSAGE,
            json!({ "alias": alias }),
        ));
    }

    Ok(alias.to_ascii_lowercase())
}
