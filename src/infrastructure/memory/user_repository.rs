//! Process-local user repository.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use super::lock;
use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

#[derive(Default)]
struct UserStore {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    store: Mutex<UserStore>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("User not found", json!({ "id": id }))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut store = lock(&self.store)?;

        if store.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_email_key" }),
            ));
        }

        store.next_id += 1;
        let user = User {
            id: store.next_id,
            first_name: new_user.first_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_verified: false,
            verification_token_hash: Some(new_user.verification_token_hash),
            reset_pin_hash: None,
            reset_pin_expires_at: None,
            created_at: Utc::now(),
        };
        store.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(lock(&self.store)?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(lock(&self.store)?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn mark_verified(&self, id: i64) -> Result<(), AppError> {
        let mut store = lock(&self.store)?;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        user.is_verified = true;
        user.verification_token_hash = None;
        Ok(())
    }

    async fn set_reset_pin(
        &self,
        id: i64,
        pin_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut store = lock(&self.store)?;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        user.reset_pin_hash = Some(pin_hash.to_string());
        user.reset_pin_expires_at = Some(expires_at);
        Ok(())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut store = lock(&self.store)?;
        let user = store.users.get_mut(&id).ok_or_else(|| not_found(id))?;
        user.password_hash = password_hash.to_string();
        user.reset_pin_hash = None;
        user.reset_pin_expires_at = None;
        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(lock(&self.store)?.users.len() as i64)
    }
}
