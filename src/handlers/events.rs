use axum::extract::{Multipart, Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::filter::query::{creator_query, related_query, search_query, upcoming_query};
use crate::filter::{compose, EventFilters, EventListing};
use crate::forms::{EventForm, TagInput, ValidEvent};
use crate::models::{AlertSeverity, Event, EventStatus, NewActivityLog, NewAlert};
use crate::realtime::ChangeKind;
use crate::session::{AdminUser, CurrentUser, MaybeUser};
use crate::state::AppState;
use crate::taxonomy::town_slug;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

async fn listing(state: &AppState, filters: &EventFilters) -> Result<EventListing, AppError> {
    let composed = compose(filters);
    if !composed.unapplied.is_empty() {
        tracing::debug!(unapplied = ?composed.unapplied, "some filters produced no predicate");
    }
    let page = state.store.fetch_events(&composed.query).await?;
    Ok(EventListing::new(&composed, page.rows, page.total, filters.seq))
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(filters): Query<EventFilters>,
) -> Result<Response, AppError> {
    let listing = listing(&state, &filters).await?;
    Ok(success(listing, "Events retrieved"))
}

pub async fn town_events(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(filters): Query<EventFilters>,
) -> Result<Response, AppError> {
    let town = state
        .store
        .get_town(&town_slug(&slug))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Town '{}' was not found", slug)))?;
    let filters = EventFilters {
        near: Some(town.slug),
        ..filters
    };
    let listing = listing(&state, &filters).await?;
    Ok(success(listing, "Events retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn search_events(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    if params.q.trim().is_empty() {
        return Ok(success(Vec::<Event>::new(), "Events retrieved"));
    }
    let page = state.store.fetch_events(&search_query(&params.q)).await?;
    Ok(success(page.rows, "Events retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    pub town: Option<String>,
}

pub async fn upcoming_events(
    State(state): State<AppState>,
    Query(params): Query<UpcomingParams>,
) -> Result<Response, AppError> {
    let town = params
        .town
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != crate::filter::NEAR_SENTINEL)
        .map(town_slug);
    let page = state
        .store
        .fetch_events(&upcoming_query(town.as_deref(), Utc::now()))
        .await?;
    Ok(success(page.rows, "Events retrieved"))
}

pub async fn my_events(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let page = state.store.fetch_events(&creator_query(user.id())).await?;
    Ok(success(page.rows, "Events retrieved"))
}

/// Loads an event the viewer may see. Non-active events are visible only to
/// their creator and to admins; anyone else gets the same 404 as for a
/// missing id.
pub(crate) async fn visible_event(
    state: &AppState,
    id: Uuid,
    viewer: Option<&CurrentUser>,
) -> Result<Event, AppError> {
    let not_found = || AppError::NotFound(format!("Event with id '{}' was not found", id));
    let event = state.store.get_event(id).await?.ok_or_else(not_found)?;
    let visible = event.status == EventStatus::Active
        || viewer.is_some_and(|user| user.can_manage(event.creator_id));
    if visible {
        Ok(event)
    } else {
        Err(not_found())
    }
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    viewer: MaybeUser,
) -> Result<Response, AppError> {
    let event = visible_event(&state, id, viewer.0.as_ref()).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn related_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    viewer: MaybeUser,
) -> Result<Response, AppError> {
    let event = visible_event(&state, id, viewer.0.as_ref()).await?;
    let page = state
        .store
        .fetch_events(&related_query(event.id, event.town.as_deref()))
        .await?;
    Ok(success(page.rows, "Related events retrieved"))
}

/// Inserts a submission as a draft and tells the moderators about it.
async fn submit(state: &AppState, user: &CurrentUser, mut valid: ValidEvent) -> Result<Event, AppError> {
    if !user.is_admin() {
        valid.is_featured = false;
    }

    let event = state
        .store
        .insert_event(valid.into_new_event(user.id(), EventStatus::Draft))
        .await?;
    tracing::info!(event_id = %event.id, creator = %user.id(), "event submitted");

    state
        .audit(
            NewActivityLog::new("create", "events")
                .by(user.id())
                .on(event.id)
                .with_details(json!({ "title": event.title })),
        )
        .await?;
    state
        .raise_alert(NewAlert {
            alert_type: AlertSeverity::Info,
            title: "New event submitted".to_string(),
            message: format!("'{}' is waiting for review", event.title),
            entity_type: Some("event"),
            entity_id: Some(event.id),
        })
        .await?;
    Ok(event)
}

pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(form): Json<EventForm>,
) -> Result<Response, AppError> {
    let event = submit(&state, &user, form.validate()?).await?;
    Ok(created(event, "Event submitted for review"))
}

fn flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "on" | "1")
}

/// Same as [`create_event`], from a multipart form with an optional `image`.
/// The text fields are validated before the image is stored.
pub async fn submit_event(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = EventForm::default();
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::ValidationError(format!("Could not read image: {}", e)))?;
            if !bytes.is_empty() {
                image = Some((content_type, bytes.to_vec()));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::ValidationError(format!("Could not read field '{}': {}", name, e)))?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "date" => form.date = Some(value),
            "time" => form.time = Some(value),
            "end_date" => form.end_date = Some(value),
            "end_time" => form.end_time = Some(value),
            "location" => form.location = Some(value),
            "description" => form.description = Some(value),
            "tags" => form.tags = TagInput::Text(value),
            "category" => form.category = Some(value),
            "town" => form.town = Some(value),
            "image_url" => form.image_url = Some(value),
            "is_featured" => form.is_featured = flag(&value),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    let mut valid = form.validate()?;
    if let Some((content_type, bytes)) = image {
        let stored = state.media.store_image(&content_type, &bytes).await?;
        valid.image_url = Some(stored.url);
    }

    let event = submit(&state, &user, valid).await?;
    Ok(created(event, "Event submitted for review"))
}

async fn managed_event(state: &AppState, user: &CurrentUser, id: Uuid) -> Result<Event, AppError> {
    let event = state
        .store
        .get_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", id)))?;
    if !user.can_manage(event.creator_id) {
        return Err(AppError::Forbidden(
            "Only the creator or an admin can change this event".to_string(),
        ));
    }
    Ok(event)
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(form): Json<EventForm>,
) -> Result<Response, AppError> {
    let existing = managed_event(&state, &user, id).await?;
    // An absent image keeps the stored one; an empty string clears it.
    let keep_image = form.image_url.is_none();
    let mut valid = form.validate()?;
    if !user.is_admin() {
        valid.is_featured = existing.is_featured;
    }
    if keep_image {
        valid.image_url = existing.image_url;
    }

    let event = state
        .store
        .update_event(id, valid.into_changes())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", id)))?;
    state
        .audit(NewActivityLog::new("update", "events").by(user.id()).on(id))
        .await?;
    Ok(success(event, "Event updated"))
}

async fn change_status(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    status: EventStatus,
    action: &'static str,
) -> Result<Event, AppError> {
    let event = state
        .store
        .set_event_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", id)))?;
    state.announce("events", ChangeKind::Update, &event);
    state
        .audit(NewActivityLog::new(action, "events").by(user.id()).on(id))
        .await?;
    Ok(event)
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    managed_event(&state, &user, id).await?;
    let event = change_status(&state, &user, id, EventStatus::Deleted, "delete").await?;
    Ok(success(event, "Event deleted"))
}

pub async fn restore_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AdminUser(user): AdminUser,
) -> Result<Response, AppError> {
    let event = change_status(&state, &user, id, EventStatus::Active, "restore").await?;
    Ok(success(event, "Event restored"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_values() {
        assert!(flag("on"));
        assert!(flag("true"));
        assert!(!flag("false"));
        assert!(!flag(""));
    }
}
