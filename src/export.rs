//! CSV downloads for the admin settings page.

use csv::Writer;

use crate::models::{AdminUser, Event};
use crate::utils::error::AppError;

pub const USERS_HEADER: [&str; 6] = ["Email", "Username", "Role", "Town", "Created At", "Event Count"];

pub const EVENTS_HEADER: [&str; 16] = [
    "id",
    "title",
    "description",
    "date_time",
    "end_time",
    "location",
    "town",
    "category",
    "tags",
    "image_url",
    "creator_id",
    "is_featured",
    "view_count",
    "status",
    "created_at",
    "updated_at",
];

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalServerError(format!("csv export failed: {}", e))
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

pub fn users_csv(users: &[AdminUser]) -> Result<String, AppError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(USERS_HEADER).map_err(csv_error)?;
    for user in users {
        writer
            .write_record([
                user.email.clone(),
                user.username.clone().unwrap_or_default(),
                user.role.to_string(),
                user.town.clone().unwrap_or_default(),
                user.created_at.to_rfc3339(),
                user.event_count.to_string(),
            ])
            .map_err(csv_error)?;
    }
    finish(writer)
}

pub fn events_csv(events: &[Event]) -> Result<String, AppError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(EVENTS_HEADER).map_err(csv_error)?;
    for event in events {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();
        writer
            .write_record([
                event.id.to_string(),
                event.title.clone(),
                optional(&event.description),
                event.date_time.to_rfc3339(),
                event.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
                optional(&event.location),
                optional(&event.town),
                optional(&event.category),
                event.tags.join(";"),
                optional(&event.image_url),
                event.creator_id.map(|id| id.to_string()).unwrap_or_default(),
                event.is_featured.to_string(),
                event.view_count.to_string(),
                event.status.to_string(),
                event.created_at.to_rfc3339(),
                event.updated_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ])
            .map_err(csv_error)?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn users_export_has_fixed_header_and_quotes_commas() {
        let user = AdminUser {
            id: Uuid::new_v4(),
            email: "sam@example.com".into(),
            username: None,
            display_name: Some("Sam".into()),
            role: UserRole::Moderator,
            town: Some("timmins, on".into()),
            created_at: Utc::now(),
            last_sign_in_at: None,
            event_count: 3,
            is_banned: false,
        };
        let csv = users_csv(&[user]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Email,Username,Role,Town,Created At,Event Count"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("sam@example.com,,moderator,\"timmins, on\","));
        assert!(row.ends_with(",3"));
    }

    #[test]
    fn empty_events_export_is_just_the_header() {
        let csv = events_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("id,title,description"));
    }
}
