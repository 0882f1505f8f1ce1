//! Event form input and its validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{EventChanges, EventStatus, NewEvent};
use crate::taxonomy::{parse_tag_input, resolve_category, town_slug, TOWN_NAMES};
use crate::utils::error::{AppError, FieldErrors};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tags arrive either as a JSON array or as the comma separated text field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    List(Vec<String>),
    Text(String),
}

impl Default for TagInput {
    fn default() -> Self {
        TagInput::List(Vec::new())
    }
}

impl TagInput {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagInput::Text(text) => parse_tag_input(&text),
            TagInput::List(list) => parse_tag_input(&list.join(",")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventForm {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub tags: TagInput,
    pub category: Option<String>,
    pub town: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
}

/// A form that passed validation, with the start instant resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEvent {
    pub title: String,
    pub description: String,
    pub date_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: String,
    pub town: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
}

impl ValidEvent {
    pub fn into_new_event(self, creator_id: Uuid, status: EventStatus) -> NewEvent {
        NewEvent {
            title: self.title,
            description: Some(self.description),
            date_time: self.date_time,
            end_time: self.end_time,
            location: Some(self.location),
            coordinates: None,
            town: self.town,
            category: self.category,
            tags: self.tags,
            image_url: self.image_url,
            creator_id: Some(creator_id),
            is_featured: self.is_featured,
            status,
        }
    }

    pub fn into_changes(self) -> EventChanges {
        EventChanges {
            title: self.title,
            description: Some(self.description),
            date_time: self.date_time,
            end_time: self.end_time,
            location: Some(self.location),
            town: self.town,
            category: self.category,
            tags: self.tags,
            image_url: self.image_url,
            is_featured: self.is_featured,
        }
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &'a Option<String>,
    message: &str,
) -> Option<&'a str> {
    let value = filled(value);
    if value.is_none() {
        errors.insert(field, message.to_string());
    }
    value
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

fn known_town(value: &str) -> Option<String> {
    let slug = town_slug(value);
    TOWN_NAMES
        .iter()
        .any(|name| town_slug(name) == slug)
        .then_some(slug)
}

impl EventForm {
    /// Checks every field at once so the response can flag all of them.
    pub fn validate(self) -> Result<ValidEvent, AppError> {
        let mut errors = FieldErrors::new();

        let title = required(&mut errors, "title", &self.title, "Event Title is required");
        let date = required(&mut errors, "date", &self.date, "Date is required");
        let time = required(&mut errors, "time", &self.time, "Time is required");
        let location = required(&mut errors, "location", &self.location, "Location is required");
        let description = required(
            &mut errors,
            "description",
            &self.description,
            "Description is required",
        );

        let start_date = date.and_then(|d| {
            let parsed = NaiveDate::parse_from_str(d, DATE_FORMAT).ok();
            if parsed.is_none() {
                errors.insert("date", "Date must be in YYYY-MM-DD format".to_string());
            }
            parsed
        });
        let start_time = time.and_then(|t| {
            let parsed = parse_time(t);
            if parsed.is_none() {
                errors.insert("time", "Time must be in HH:MM format".to_string());
            }
            parsed
        });
        let date_time = start_date
            .zip(start_time)
            .map(|(d, t)| NaiveDateTime::new(d, t).and_utc());

        let end_time = match filled(&self.end_time) {
            None => None,
            Some(raw) => {
                let end_date = match filled(&self.end_date) {
                    Some(d) => NaiveDate::parse_from_str(d, DATE_FORMAT).ok(),
                    None => start_date,
                };
                match end_date.zip(parse_time(raw)) {
                    Some((d, t)) => Some(NaiveDateTime::new(d, t).and_utc()),
                    None => {
                        errors.insert("end_time", "End time is not a valid date and time".to_string());
                        None
                    }
                }
            }
        };
        if let (Some(start), Some(end)) = (date_time, end_time) {
            if end <= start {
                errors.insert("end_time", "End time must be after the start time".to_string());
            }
        }

        let category = filled(&self.category).and_then(|c| {
            let resolved = resolve_category(c).map(|category| category.id.to_string());
            if resolved.is_none() {
                errors.insert("category", format!("Unknown category '{}'", c));
            }
            resolved
        });
        let town = filled(&self.town).and_then(|t| {
            let resolved = known_town(t);
            if resolved.is_none() {
                errors.insert("town", format!("Unknown town '{}'", t));
            }
            resolved
        });

        if !errors.is_empty() {
            return Err(AppError::InvalidForm(errors));
        }

        match (title, description, location, date_time) {
            (Some(title), Some(description), Some(location), Some(date_time)) => Ok(ValidEvent {
                title: title.to_string(),
                description: description.to_string(),
                date_time,
                end_time,
                location: location.to_string(),
                town,
                category,
                tags: self.tags.into_tags(),
                image_url: filled(&self.image_url).map(str::to_string),
                is_featured: self.is_featured,
            }),
            _ => Err(AppError::ValidationError("Event form is incomplete".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn complete() -> EventForm {
        EventForm {
            title: Some("Winter Carnival".into()),
            date: Some("2025-02-14".into()),
            time: Some("18:30".into()),
            location: Some("Hollinger Park".into()),
            description: Some("Skating and bonfires".into()),
            tags: TagInput::Text("family-friendly, free, free".into()),
            category: Some("Community".into()),
            town: Some("Iroquois Falls".into()),
            ..EventForm::default()
        }
    }

    fn field_errors(result: Result<ValidEvent, AppError>) -> FieldErrors {
        match result {
            Err(AppError::InvalidForm(fields)) => fields,
            other => panic!("expected form errors, got {:?}", other),
        }
    }

    #[test]
    fn complete_form_maps_fields() {
        let valid = complete().validate().unwrap();
        assert_eq!(valid.title, "Winter Carnival");
        assert_eq!(valid.date_time.month(), 2);
        assert_eq!(valid.date_time.hour(), 18);
        assert_eq!(valid.date_time.minute(), 30);
        assert_eq!(valid.category.as_deref(), Some("community"));
        assert_eq!(valid.town.as_deref(), Some("iroquois-falls"));
        assert_eq!(valid.tags, vec!["family-friendly", "free"]);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let fields = field_errors(EventForm::default().validate());
        assert_eq!(fields["title"], "Event Title is required");
        assert_eq!(fields["date"], "Date is required");
        assert_eq!(fields["time"], "Time is required");
        assert_eq!(fields["location"], "Location is required");
        assert_eq!(fields["description"], "Description is required");
    }

    #[test]
    fn whitespace_counts_as_missing() {
        let fields = field_errors(
            EventForm {
                title: Some("   ".into()),
                ..complete()
            }
            .validate(),
        );
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("title"));
    }

    #[test]
    fn malformed_date_and_unknown_category() {
        let fields = field_errors(
            EventForm {
                date: Some("14/02/2025".into()),
                category: Some("nightlife".into()),
                ..complete()
            }
            .validate(),
        );
        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("category"));
    }

    #[test]
    fn end_must_follow_start() {
        let fields = field_errors(
            EventForm {
                end_time: Some("17:00".into()),
                ..complete()
            }
            .validate(),
        );
        assert!(fields.contains_key("end_time"));

        let valid = EventForm {
            end_time: Some("21:00".into()),
            ..complete()
        }
        .validate()
        .unwrap();
        assert_eq!(valid.end_time.unwrap().hour(), 21);
    }

    #[test]
    fn tags_accept_json_list() {
        let form: EventForm = serde_json::from_value(serde_json::json!({
            "title": "Market",
            "date": "2025-06-01",
            "time": "09:00",
            "location": "Main St",
            "description": "Produce",
            "tags": ["outdoors", " free "]
        }))
        .unwrap();
        assert_eq!(form.validate().unwrap().tags, vec!["outdoors", "free"]);
    }

    #[test]
    fn new_event_carries_creator_and_status() {
        let creator = Uuid::new_v4();
        let event = complete()
            .validate()
            .unwrap()
            .into_new_event(creator, EventStatus::Draft);
        assert_eq!(event.creator_id, Some(creator));
        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.location.as_deref(), Some("Hollinger Park"));
    }
}
