//! In-memory repository implementations.
//!
//! Used by `STORAGE_BACKEND=memory` for local development and by the HTTP
//! test suite. State lives for the lifetime of the process.

mod link_repository;
mod qr_repository;
mod user_repository;

pub use link_repository::InMemoryLinkRepository;
pub use qr_repository::InMemoryQrRepository;
pub use user_repository::InMemoryUserRepository;

use std::sync::{Mutex, MutexGuard};

use serde_json::json;

use crate::error::AppError;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::internal("In-memory store is poisoned", json!({})))
}
