//! Internal diagnostics. Failures are a plain 500 with no further classification.

use axum::extract::State;
use axum::response::Response;
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::filter::query::{recent_query, RECENT_LIMIT};
use crate::filter::EventQuery;
use crate::models::{Event, EventStatus, NewEvent};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

fn internal(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(e.to_string())
}

pub async fn recent_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let page = state
        .store
        .fetch_events(&recent_query(RECENT_LIMIT))
        .await
        .map_err(internal)?;
    Ok(success(page.rows, "Recent events retrieved"))
}

/// A fixed event one week out. Nothing is written.
pub fn mock_event() -> Event {
    let now = Utc::now();
    let start = now + Duration::days(7);
    NewEvent {
        title: "Downtown Farmers Market".to_string(),
        description: Some(
            "Fresh local produce, artisanal goods, and live music in the heart of downtown."
                .to_string(),
        ),
        date_time: start,
        end_time: Some(start + Duration::hours(4)),
        location: Some("Main Street Plaza, Downtown Timmins".to_string()),
        coordinates: None,
        town: Some("timmins".to_string()),
        category: Some("community".to_string()),
        tags: vec![
            "farmers-market".to_string(),
            "local-vendors".to_string(),
            "fresh-produce".to_string(),
            "family-friendly".to_string(),
        ],
        image_url: None,
        creator_id: None,
        is_featured: true,
        status: EventStatus::Published,
    }
    .into_event(uuid::Uuid::nil(), now)
}

pub async fn create_mock_event() -> Response {
    success(mock_event(), "Mock event for testing")
}

#[derive(Serialize)]
struct SchemaCheck {
    columns_ok: bool,
    sample: Vec<Event>,
}

/// Reads one row so any column mismatch surfaces as an error.
pub async fn debug_schema(State(state): State<AppState>) -> Result<Response, AppError> {
    let page = state
        .store
        .fetch_events(&EventQuery::new().limit(1))
        .await
        .map_err(internal)?;
    Ok(success(
        SchemaCheck {
            columns_ok: true,
            sample: page.rows,
        },
        "Successfully queried events table",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_event_is_a_week_ahead() {
        let event = mock_event();
        let ahead = event.date_time - Utc::now();
        assert!(ahead > Duration::days(6) && ahead <= Duration::days(7));
        assert_eq!(event.status, EventStatus::Published);
        assert_eq!(event.end_time, Some(event.date_time + Duration::hours(4)));
    }
}
