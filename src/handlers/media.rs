use axum::extract::{Multipart, State};
use axum::response::Response;
use chrono::NaiveDate;
use serde::Serialize;

use crate::session::CurrentUser;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

/// What a flyer scan would produce. The scan itself is not implemented; every
/// accepted upload yields this fixed sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedEvent {
    pub title: &'static str,
    pub date: NaiveDate,
    pub time: &'static str,
    pub location: &'static str,
    pub description: &'static str,
    pub tags: [&'static str; 3],
}

pub fn sample_extraction() -> ExtractedEvent {
    ExtractedEvent {
        title: "AI Extracted Event: Local Art Fair",
        date: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap_or_default(),
        time: "18:00",
        location: "Community Art Gallery, Timmins",
        description: "This is a description extracted by AI. Come and see local art!",
        tags: ["Art", "Community", "Free"],
    }
}

/// Drains the form and returns the first non-empty file field named `name`.
async fn file_field(
    multipart: &mut Multipart,
    name: &str,
) -> Result<Option<(String, Vec<u8>)>, AppError> {
    let mut found = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("Malformed form data: {}", e)))?
    {
        if found.is_some() || field.name() != Some(name) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("Could not read upload: {}", e)))?;
        if !bytes.is_empty() {
            found = Some((content_type, bytes.to_vec()));
        }
    }
    Ok(found)
}

pub async fn upload_image(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let (content_type, bytes) = file_field(&mut multipart, "image")
        .await?
        .ok_or_else(|| AppError::ValidationError("No file uploaded.".to_string()))?;
    let stored = state.media.store_image(&content_type, &bytes).await?;
    tracing::info!(user_id = %user.id(), url = %stored.url, "image uploaded");
    Ok(created(
        serde_json::json!({ "url": stored.url, "size": stored.size, "content_type": stored.content_type }),
        "Image uploaded",
    ))
}

pub async fn extract_flyer(mut multipart: Multipart) -> Result<Response, AppError> {
    let (content_type, bytes) = file_field(&mut multipart, "flyer")
        .await?
        .ok_or_else(|| AppError::ValidationError("No file uploaded.".to_string()))?;
    tracing::info!(content_type = %content_type, size = bytes.len(), "flyer received");
    Ok(success(sample_extraction(), "Flyer processed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_the_art_fair() {
        let sample = sample_extraction();
        assert_eq!(sample.date.to_string(), "2025-08-15");
        assert_eq!(sample.tags, ["Art", "Community", "Free"]);
    }
}
