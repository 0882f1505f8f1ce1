//! Accounts and bearer sessions.
//!
//! [`SessionProvider`] lives in the application state and is the only thing
//! that creates or resolves sessions. Handlers reach it through the
//! extractors in [`extract`].

pub mod extract;
pub mod password;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Account, NewProfile, Profile, Session, UserRole};
use crate::store::SharedStore;
use crate::utils::error::AppError;

pub use extract::{AdminUser, CurrentUser, MaybeUser};
pub use password::{hash_password, verify_password, PasswordError};

pub const MIN_PASSWORD_LEN: usize = 8;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const BANNED: &str = "This account has been banned";

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Public part of the signed-in account.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<&Account> for SessionUser {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            role: account.role,
        }
    }
}

/// Returned by sign-up and sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
    pub user: SessionUser,
    pub profile: Profile,
}

#[derive(Clone)]
pub struct SessionProvider {
    store: SharedStore,
    ttl: Duration,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

impl SessionProvider {
    pub fn new(store: SharedStore, ttl_hours: i64) -> Self {
        Self {
            store,
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    pub async fn sign_up(&self, credentials: Credentials) -> Result<AuthSession, AppError> {
        let email = normalize_email(&credentials.email);
        if !is_plausible_email(&email) {
            return Err(AppError::ValidationError(
                "Please enter a valid email address".to_string(),
            ));
        }
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = hash_password(&credentials.password)?;
        let account = self.store.insert_account(&email, &hash).await?;
        tracing::info!(user_id = %account.id, "account created");
        self.open_session(&account).await
    }

    pub async fn sign_in(&self, credentials: Credentials) -> Result<AuthSession, AppError> {
        let email = normalize_email(&credentials.email);
        let account = self
            .store
            .find_account_by_email(&email)
            .await?
            .ok_or_else(|| AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&credentials.password, &account.password_hash)? {
            tracing::debug!(user_id = %account.id, "password mismatch");
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        }
        if account.is_banned {
            return Err(AppError::Forbidden(BANNED.to_string()));
        }

        self.open_session(&account).await
    }

    pub async fn sign_out(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.store.delete_session(token).await?)
    }

    /// Maps a bearer token to its live session and account. Expired sessions
    /// are deleted on sight.
    pub async fn resolve(&self, token: &str) -> Result<Option<(Session, Account)>, AppError> {
        let Some(session) = self.store.find_session(token).await? else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            self.store.delete_session(token).await?;
            return Ok(None);
        }
        let Some(account) = self.store.get_account(session.user_id).await? else {
            return Ok(None);
        };
        if account.is_banned {
            return Err(AppError::Forbidden(BANNED.to_string()));
        }
        Ok(Some((session, account)))
    }

    /// The account's profile, creating it from the email handle when missing.
    pub async fn ensure_profile(&self, account: &Account) -> Result<Profile, AppError> {
        if let Some(profile) = self.store.get_profile(account.id).await? {
            return Ok(profile);
        }
        let handle = account.email_handle().to_string();
        let profile = self
            .store
            .insert_profile(NewProfile {
                id: account.id,
                username: handle.clone(),
                display_name: handle,
            })
            .await?;
        tracing::info!(user_id = %account.id, username = ?profile.username, "profile created");
        Ok(profile)
    }

    async fn open_session(&self, account: &Account) -> Result<AuthSession, AppError> {
        let now = Utc::now();
        let session = Session {
            token: new_token(),
            user_id: account.id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.store.insert_session(&session).await?;
        self.store.record_sign_in(account.id, now).await?;
        let profile = self.ensure_profile(account).await?;

        Ok(AuthSession {
            token: session.token,
            expires_at: session.expires_at,
            user: SessionUser::from(account),
            profile,
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{AdminRepository, MemoryStore};

    fn provider() -> (Arc<MemoryStore>, SessionProvider) {
        let store = Arc::new(MemoryStore::new());
        let provider = SessionProvider::new(store.clone(), 24);
        (store, provider)
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn sign_up_creates_profile_from_email_handle() {
        let (_, provider) = provider();
        let session = provider
            .sign_up(creds("Jordan@Example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(session.user.email, "jordan@example.com");
        assert_eq!(session.profile.username.as_deref(), Some("jordan"));
        assert_eq!(session.profile.level, 1);
        assert_eq!(session.profile.xp, 0);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (_, provider) = provider();
        provider
            .sign_up(creds("sam@example.com", "password123"))
            .await
            .unwrap();
        let result = provider.sign_in(creds("sam@example.com", "nope-nope")).await;
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }

    #[tokio::test]
    async fn banned_account_cannot_sign_in() {
        let (store, provider) = provider();
        let session = provider
            .sign_up(creds("sam@example.com", "password123"))
            .await
            .unwrap();
        store.set_user_ban(session.user.id, true).await.unwrap();

        let result = provider.sign_in(creds("sam@example.com", "password123")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(provider.resolve(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_invalidates_token() {
        let (_, provider) = provider();
        let session = provider
            .sign_up(creds("sam@example.com", "password123"))
            .await
            .unwrap();
        assert!(provider.resolve(&session.token).await.unwrap().is_some());
        assert!(provider.sign_out(&session.token).await.unwrap());
        assert!(provider.resolve(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn short_password_and_bad_email_are_validation_errors() {
        let (_, provider) = provider();
        assert!(matches!(
            provider.sign_up(creds("sam@example.com", "short")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            provider.sign_up(creds("not-an-email", "password123")).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
