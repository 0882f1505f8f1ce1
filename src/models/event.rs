use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Moderation state of an event row. Rows are never removed; deletion is a
/// status flip to `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Deleted,
    Draft,
    Published,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "active",
            EventStatus::Deleted => "deleted",
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
        }
    }

    /// Statuses that still wait for an admin decision.
    pub fn pending() -> &'static [EventStatus] {
        &[EventStatus::Draft, EventStatus::Published]
    }

    pub fn is_pending(&self) -> bool {
        Self::pending().contains(self)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub coordinates: Option<Json<Coordinates>>,
    pub town: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub creator_id: Option<Uuid>,
    pub is_featured: bool,
    pub view_count: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.creator_id == Some(user_id)
    }
}

/// Insert payload; every field maps to the column of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub town: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub creator_id: Option<Uuid>,
    pub is_featured: bool,
    pub status: EventStatus,
}

impl NewEvent {
    pub fn into_event(self, id: Uuid, now: DateTime<Utc>) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            date_time: self.date_time,
            end_time: self.end_time,
            location: self.location,
            coordinates: self.coordinates.map(Json),
            town: self.town,
            category: self.category,
            tags: self.tags,
            image_url: self.image_url,
            creator_id: self.creator_id,
            is_featured: self.is_featured,
            view_count: 0,
            status: self.status,
            created_at: now,
            updated_at: None,
        }
    }
}

/// Update payload for an edit form. Status is changed only through the
/// moderation paths, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventChanges {
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub town: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
}

impl EventChanges {
    pub fn apply_to(self, event: &mut Event, now: DateTime<Utc>) {
        event.title = self.title;
        event.description = self.description;
        event.date_time = self.date_time;
        event.end_time = self.end_time;
        event.location = self.location;
        event.town = self.town;
        event.category = self.category;
        event.tags = self.tags;
        event.image_url = self.image_url;
        event.is_featured = self.is_featured;
        event.updated_at = Some(now);
    }
}
