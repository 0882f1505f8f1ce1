use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::models::{NewActivityLog, Profile};
use crate::session::{Credentials, CurrentUser, SessionUser};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Serialize)]
struct SessionInfo {
    user: SessionUser,
    profile: Profile,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let session = state.sessions.sign_up(credentials).await?;
    state
        .audit(NewActivityLog::new("sign_up", "accounts").by(session.user.id))
        .await?;
    Ok(created(session, "Account created"))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let session = state.sessions.sign_in(credentials).await?;
    state
        .audit(NewActivityLog::new("sign_in", "accounts").by(session.user.id))
        .await?;
    Ok(success(session, "Signed in"))
}

pub async fn sign_out(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    state.sessions.sign_out(&user.token).await?;
    Ok(empty_success("Signed out"))
}

pub async fn current_session(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let profile = state.sessions.ensure_profile(&user.account).await?;
    let info = SessionInfo {
        user: SessionUser::from(&user.account),
        profile,
    };
    Ok(success(info, "Session retrieved"))
}
