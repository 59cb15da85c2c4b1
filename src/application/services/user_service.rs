//! Account registration, email verification, sessions and password reset.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use url::Url;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::infrastructure::mail::Mailer;
use crate::utils::jwt::SessionTokens;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::secret::{
    generate_pin, generate_verification_token, hash_secret, secret_matches,
};
use crate::web::emails::{reset_pin_mail, verification_mail};

/// How long an emailed reset PIN stays valid.
pub const RESET_PIN_VALID_MINUTES: i64 = 60;

#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub email: String,
    pub password: String,
}

/// A signed session issued on login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials", json!({}))
}

/// Service for user accounts.
///
/// One-time secrets (verification token, reset PIN) are generated here,
/// emailed once and persisted only as HMAC digests keyed by the session
/// secret.
pub struct UserService<R: UserRepository + ?Sized> {
    repository: Arc<R>,
    mailer: Arc<dyn Mailer>,
    tokens: SessionTokens,
    secret: String,
    base_url: String,
}

impl<R: UserRepository + ?Sized> UserService<R> {
    pub fn new(
        repository: Arc<R>,
        mailer: Arc<dyn Mailer>,
        secret: impl Into<String>,
        session_ttl_hours: i64,
        base_url: impl Into<String>,
    ) -> Self {
        let secret = secret.into();
        Self {
            repository,
            mailer,
            tokens: SessionTokens::new(&secret, session_ttl_hours),
            secret,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Lifetime of issued session tokens.
    pub fn session_ttl(&self) -> Duration {
        self.tokens.ttl()
    }

    /// Registers an unverified account and emails its verification link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    /// Returns [`AppError::Internal`] if the verification email cannot be
    /// sent; the account is kept and can be verified by an operator.
    pub async fn register(&self, registration: Registration) -> Result<User, AppError> {
        let email = normalize_email(&registration.email);
        let email_taken = || AppError::conflict("Email already exists", json!({ "email": email }));

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let token = generate_verification_token()?;
        let new_user = NewUser {
            first_name: registration.first_name.trim().to_string(),
            email: email.clone(),
            password_hash: hash_password(&registration.password)?,
            verification_token_hash: hash_secret(&self.secret, &token),
        };

        let user = self
            .repository
            .create(new_user)
            .await
            .map_err(|e| match e {
                AppError::Conflict { .. } => email_taken(),
                other => other,
            })?;

        let verify_url = Url::parse_with_params(
            &format!("{}/api/user/verify", self.base_url),
            &[("token", token.as_str()), ("email", user.email.as_str())],
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Invalid base URL for verification link");
            AppError::internal("Server error", json!({}))
        })?;

        let mail = verification_mail(&user.email, &user.first_name, verify_url.as_str())?;
        if let Err(e) = self.mailer.send(mail).await {
            tracing::error!(user_id = user.id, error = %e, "Verification email failed");
            return Err(AppError::internal(
                "Failed to send verification email",
                json!({}),
            ));
        }

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Confirms an email address with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown email.
    /// Returns [`AppError::Validation`] if the token does not match.
    pub async fn verify_email(&self, email: &str, token: &str) -> Result<User, AppError> {
        let mut user = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({})))?;

        let valid = user
            .verification_token_hash
            .as_deref()
            .is_some_and(|stored| secret_matches(&self.secret, token, stored));
        if !valid {
            return Err(AppError::bad_request("Invalid token", json!({})));
        }

        self.repository.mark_verified(user.id).await?;
        user.is_verified = true;
        user.verification_token_hash = None;

        tracing::info!(user_id = user.id, "Email verified");
        Ok(user)
    }

    /// Checks credentials and issues a signed session token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an unknown email or wrong password.
    /// Returns [`AppError::Forbidden`] if the account is not verified yet.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AppError> {
        let user = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(invalid_credentials());
        }

        if !user.is_verified {
            return Err(AppError::forbidden("Account not verified", json!({})));
        }

        let token = self
            .tokens
            .issue(user.id, &user.first_name, &user.email)
            .map_err(|e| {
                tracing::error!(error = %e, "Session token signing failed");
                AppError::internal("Server error", json!({}))
            })?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginSession { user, token })
    }

    /// Resolves a session token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is invalid, expired or
    /// belongs to a user that no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let unauthorized = || AppError::unauthorized("Invalid session", json!({}));

        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            unauthorized()
        })?;
        let user_id: i64 = claims.sub.parse().map_err(|_| unauthorized())?;

        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(unauthorized)
    }

    /// Emails a fresh six-digit reset PIN, replacing any earlier one.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({})))?;

        let pin = generate_pin();
        let expires_at = Utc::now() + Duration::minutes(RESET_PIN_VALID_MINUTES);
        self.repository
            .set_reset_pin(user.id, &hash_secret(&self.secret, &pin), expires_at)
            .await?;

        let mail = reset_pin_mail(&user.email, &user.first_name, &pin, RESET_PIN_VALID_MINUTES)?;
        if let Err(e) = self.mailer.send(mail).await {
            tracing::error!(user_id = user.id, error = %e, "Reset PIN email failed");
            return Err(AppError::internal("Failed to send reset code", json!({})));
        }

        tracing::info!(user_id = user.id, "Password reset requested");
        Ok(())
    }

    /// Returns the user if `pin` is their current, unexpired reset PIN.
    async fn user_with_live_pin(&self, email: &str, pin: &str) -> Result<Option<User>, AppError> {
        let Some(user) = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
        else {
            return Ok(None);
        };

        let valid = user.has_live_reset_pin(Utc::now())
            && user
                .reset_pin_hash
                .as_deref()
                .is_some_and(|stored| secret_matches(&self.secret, pin, stored));

        Ok(valid.then_some(user))
    }

    /// Checks a reset PIN without consuming it.
    pub async fn verify_reset_pin(&self, email: &str, pin: &str) -> Result<(), AppError> {
        self.user_with_live_pin(email, pin)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::bad_request("Invalid or expired code", json!({})))
    }

    /// Sets a new password and consumes the reset PIN.
    pub async fn reset_password(
        &self,
        email: &str,
        pin: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .user_with_live_pin(email, pin)
            .await?
            .ok_or_else(|| AppError::bad_request("Invalid or expired code", json!({})))?;

        self.repository
            .update_password(user.id, &hash_password(new_password)?)
            .await?;

        tracing::info!(user_id = user.id, "Password reset");
        Ok(())
    }

    /// Marks an account verified without a token. Used by operators.
    pub async fn force_verify(&self, email: &str) -> Result<User, AppError> {
        let mut user = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))?;

        self.repository.mark_verified(user.id).await?;
        user.is_verified = true;
        user.verification_token_hash = None;
        Ok(user)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        self.repository.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUserRepository;
    use crate::infrastructure::mail::{MailError, MockMailer, OutgoingMail};
    use std::sync::Mutex;

    const SECRET: &str = "test-secret";

    fn user(verified: bool) -> User {
        User {
            id: 7,
            first_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: hash_password("correct horse").unwrap(),
            is_verified: verified,
            verification_token_hash: None,
            reset_pin_hash: None,
            reset_pin_expires_at: None,
            created_at: Utc::now(),
        }
    }

    fn service(repo: MockUserRepository, mailer: MockMailer) -> UserService<MockUserRepository> {
        UserService::new(
            Arc::new(repo),
            Arc::new(mailer),
            SECRET,
            48,
            "http://localhost:3000/",
        )
    }

    /// Extracts a query parameter from the verification link in a mail body.
    fn link_param(body: &str, name: &str) -> String {
        let start = body.find("http://").unwrap();
        let end = body[start..]
            .find(char::is_whitespace)
            .map_or(body.len(), |i| start + i);
        let url = Url::parse(&body[start..end]).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_stores_hashes_and_mails_token() {
        let sent: Arc<Mutex<Vec<OutgoingMail>>> = Arc::default();
        let stored_hash: Arc<Mutex<String>> = Arc::default();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let hash_slot = stored_hash.clone();
        repo.expect_create()
            .withf(|u| u.email == "ada@example.com" && u.password_hash.starts_with("$argon2"))
            .times(1)
            .returning(move |u| {
                *hash_slot.lock().unwrap() = u.verification_token_hash.clone();
                let mut created = user(false);
                created.verification_token_hash = Some(u.verification_token_hash);
                Ok(created)
            });

        let mut mailer = MockMailer::new();
        let outbox = sent.clone();
        mailer.expect_send().times(1).returning(move |mail| {
            outbox.lock().unwrap().push(mail);
            Ok(())
        });

        let user = service(repo, mailer)
            .register(Registration {
                first_name: "Ada".to_string(),
                email: " Ada@Example.com ".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert!(!user.is_verified);

        let mail = sent.lock().unwrap().pop().unwrap();
        let token = link_param(&mail.text_body, "token");
        assert_eq!(link_param(&mail.text_body, "email"), "ada@example.com");
        assert_eq!(token.len(), 64);
        assert!(secret_matches(SECRET, &token, &stored_hash.lock().unwrap()));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(user(true))));
        repo.expect_create().never();

        let err = service(repo, MockMailer::new())
            .register(Registration {
                first_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "whatever1".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_register_mail_failure_is_internal() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_create().returning(|_| Ok(user(false)));

        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_| {
            Err(MailError::Address(
                "bad".parse::<lettre::Address>().unwrap_err(),
            ))
        });

        let err = service(repo, mailer)
            .register(Registration {
                first_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "whatever1".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_verify_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| {
            let mut u = user(false);
            u.verification_token_hash = Some(hash_secret(SECRET, "tok"));
            Ok(Some(u))
        });
        repo.expect_mark_verified()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|_| Ok(()));
        let service = service(repo, MockMailer::new());

        let err = service.verify_email("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let verified = service.verify_email("ada@example.com", "tok").await.unwrap();
        assert!(verified.is_verified);
    }

    #[tokio::test]
    async fn test_login_paths() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .withf(|e| e == "ada@example.com")
            .returning(|_| Ok(Some(user(true))));
        repo.expect_find_by_email()
            .withf(|e| e == "new@example.com")
            .returning(|_| {
                let mut u = user(false);
                u.email = "new@example.com".to_string();
                Ok(Some(u))
            });
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_find_by_id()
            .withf(|id| *id == 7)
            .returning(|_| Ok(Some(user(true))));
        let service = service(repo, MockMailer::new());

        let session = service.login("ADA@example.com", "correct horse").await.unwrap();
        let me = service.authenticate(&session.token).await.unwrap();
        assert_eq!(me.email, "ada@example.com");

        assert!(matches!(
            service.login("ada@example.com", "wrong").await,
            Err(AppError::Unauthorized { .. })
        ));
        assert!(matches!(
            service.login("ghost@example.com", "correct horse").await,
            Err(AppError::Unauthorized { .. })
        ));
        assert!(matches!(
            service.login("new@example.com", "correct horse").await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            service.authenticate("garbage").await,
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_flow() {
        let pin_hash: Arc<Mutex<Option<String>>> = Arc::default();
        let sent: Arc<Mutex<Vec<OutgoingMail>>> = Arc::default();

        let mut repo = MockUserRepository::new();
        let slot = pin_hash.clone();
        repo.expect_find_by_email().returning(move |_| {
            let mut u = user(true);
            if let Some(hash) = slot.lock().unwrap().clone() {
                u.reset_pin_hash = Some(hash);
                u.reset_pin_expires_at = Some(Utc::now() + Duration::minutes(30));
            }
            Ok(Some(u))
        });
        let slot = pin_hash.clone();
        repo.expect_set_reset_pin().returning(move |_, hash, _| {
            *slot.lock().unwrap() = Some(hash.to_string());
            Ok(())
        });
        repo.expect_update_password()
            .withf(|id, hash| *id == 7 && hash.starts_with("$argon2"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut mailer = MockMailer::new();
        let outbox = sent.clone();
        mailer.expect_send().returning(move |mail| {
            outbox.lock().unwrap().push(mail);
            Ok(())
        });
        let service = service(repo, mailer);

        service.request_password_reset("ada@example.com").await.unwrap();
        let body = sent.lock().unwrap()[0].text_body.clone();
        let pin: String = body
            .split_whitespace()
            .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
            .unwrap()
            .to_string();

        assert!(service.verify_reset_pin("ada@example.com", "000000").await.is_err());
        service.verify_reset_pin("ada@example.com", &pin).await.unwrap();
        service
            .reset_password("ada@example.com", &pin, "new password")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expired_pin_rejected() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| {
            let mut u = user(true);
            u.reset_pin_hash = Some(hash_secret(SECRET, "123456"));
            u.reset_pin_expires_at = Some(Utc::now() - Duration::minutes(1));
            Ok(Some(u))
        });
        repo.expect_update_password().never();
        let service = service(repo, MockMailer::new());

        assert!(matches!(
            service.reset_password("ada@example.com", "123456", "x").await,
            Err(AppError::Validation { .. })
        ));
    }
}
