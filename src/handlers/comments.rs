use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::events::visible_event;
use crate::models::{EventStatus, NewActivityLog, NewComment};
use crate::session::{CurrentUser, MaybeUser};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

fn comment_body(form: &CommentForm) -> Result<String, AppError> {
    let content = form.content.trim();
    if content.is_empty() {
        return Err(AppError::ValidationError("Comment cannot be empty".to_string()));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::ValidationError(format!(
            "Comments are limited to {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(content.to_string())
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    viewer: MaybeUser,
) -> Result<Response, AppError> {
    visible_event(&state, event_id, viewer.0.as_ref()).await?;
    let comments = state.store.list_comments(event_id).await?;
    Ok(success(comments, "Comments retrieved"))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    user: CurrentUser,
    Json(form): Json<CommentForm>,
) -> Result<Response, AppError> {
    let content = comment_body(&form)?;
    let event = visible_event(&state, event_id, Some(&user)).await?;
    if event.status == EventStatus::Deleted {
        return Err(AppError::NotFound(format!(
            "Event with id '{}' was not found",
            event_id
        )));
    }
    if let Some(parent_id) = form.parent_id {
        let parent_ok = state
            .store
            .get_comment(parent_id)
            .await?
            .is_some_and(|parent| parent.event_id == event_id && !parent.is_deleted);
        if !parent_ok {
            return Err(AppError::ValidationError(
                "The comment you are replying to does not exist".to_string(),
            ));
        }
    }

    let comment = state
        .store
        .insert_comment(NewComment {
            event_id,
            user_id: user.id(),
            content,
            parent_id: form.parent_id,
        })
        .await?;
    state
        .audit(NewActivityLog::new("create", "comments").by(user.id()).on(comment.id))
        .await?;
    Ok(created(comment, "Comment posted"))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let comment = state
        .store
        .get_comment(comment_id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| AppError::NotFound(format!("Comment with id '{}' was not found", comment_id)))?;
    if !user.can_manage(Some(comment.user_id)) {
        return Err(AppError::Forbidden(
            "Only the author or an admin can delete this comment".to_string(),
        ));
    }

    state.store.soft_delete_comment(comment_id).await?;
    state
        .audit(NewActivityLog::new("delete", "comments").by(user.id()).on(comment_id))
        .await?;
    Ok(empty_success("Comment deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(content: &str) -> CommentForm {
        CommentForm {
            content: content.to_string(),
            parent_id: None,
        }
    }

    #[test]
    fn content_is_trimmed_and_bounded() {
        assert_eq!(comment_body(&form("  nice!  ")).unwrap(), "nice!");
        assert!(comment_body(&form("   ")).is_err());
        assert!(comment_body(&form(&"a".repeat(MAX_COMMENT_CHARS))).is_ok());
        assert!(comment_body(&form(&"a".repeat(MAX_COMMENT_CHARS + 1))).is_err());
    }
}
