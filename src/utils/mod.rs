//! Utility functions shared by services and handlers.
//!
//! - [`code_generator`] - Short code generation and alias validation
//! - [`jwt`] - Signed session tokens
//! - [`password`] - Argon2 password hashing
//! - [`secret`] - One-time tokens, PINs and their keyed hashes
//! - [`url_validator`] - Destination URL checks
//! - [`user_agent`] - Device classification and visitor fingerprints

pub mod code_generator;
pub mod jwt;
pub mod password;
pub mod secret;
pub mod url_validator;
pub mod user_agent;
