use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::events::visible_event;
use crate::models::{InteractionKind, NewActivityLog};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
struct FavoriteState {
    event_id: Uuid,
    favorited: bool,
}

pub async fn favorite_status(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    visible_event(&state, event_id, Some(&user)).await?;
    let favorited = state
        .store
        .find_interaction(user.id(), event_id, InteractionKind::Favorite)
        .await?
        .is_some();
    Ok(success(FavoriteState { event_id, favorited }, "Favorite status retrieved"))
}

/// Adds the favorite when absent, removes it when present.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    visible_event(&state, event_id, Some(&user)).await?;

    let existing = state
        .store
        .find_interaction(user.id(), event_id, InteractionKind::Favorite)
        .await?;
    let favorited = match existing {
        Some(_) => {
            state
                .store
                .delete_interaction(user.id(), event_id, InteractionKind::Favorite)
                .await?;
            false
        }
        None => {
            state
                .store
                .insert_interaction(user.id(), event_id, InteractionKind::Favorite)
                .await?;
            true
        }
    };

    let action = if favorited { "favorite" } else { "unfavorite" };
    state
        .audit(NewActivityLog::new(action, "event_interactions").by(user.id()).on(event_id))
        .await?;

    let message = if favorited { "Added to favorites" } else { "Removed from favorites" };
    Ok(success(FavoriteState { event_id, favorited }, message))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let events = state
        .store
        .interacted_events(user.id(), InteractionKind::Favorite)
        .await?;
    Ok(success(events, "Favorites retrieved"))
}
