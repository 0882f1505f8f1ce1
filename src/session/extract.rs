use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::models::Account;
use crate::state::AppState;
use crate::utils::error::AppError;

/// A request with a live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account: Account,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.account.id
    }

    pub fn is_admin(&self) -> bool {
        self.account.is_admin()
    }

    /// Creator or admin.
    pub fn can_manage(&self, owner: Option<Uuid>) -> bool {
        self.is_admin() || owner == Some(self.id())
    }
}

/// Session if one was presented; anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

/// A session whose account has the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };
    Ok(state
        .sessions
        .resolve(&token)
        .await?
        .map(|(_, account)| CurrentUser { account, token }))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        current_user(parts, state)
            .await?
            .ok_or_else(|| AppError::AuthError("Please sign in to continue".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A banned account browses public pages as a visitor.
        match current_user(parts, state).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(AppError::Forbidden(_)) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id(), "non-admin tried an admin route");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
