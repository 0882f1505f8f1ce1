use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::filter::{EventQuery, Predicate, SortOrder};
use crate::models::{Event, EventStatus, NewActivityLog, Profile, ProfileUpdate};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::taxonomy::{town_slug, TOWN_NAMES};
use crate::utils::error::{AppError, FieldErrors};
use crate::utils::response::success;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;

#[derive(Serialize)]
struct PublicProfile {
    profile: Profile,
    upcoming_events: Vec<Event>,
}

fn valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (USERNAME_MIN..=USERNAME_MAX).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Applies the settings form. Absent fields are left alone; an empty town or
/// avatar clears it.
fn apply_update(mut profile: Profile, update: ProfileUpdate) -> Result<Profile, AppError> {
    let mut errors = FieldErrors::new();

    if let Some(display_name) = update.display_name {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            errors.insert("display_name", "Display name cannot be empty".to_string());
        } else {
            profile.display_name = Some(display_name.to_string());
        }
    }

    if let Some(username) = update.username {
        let username = username.trim().to_lowercase();
        if valid_username(&username) {
            profile.username = Some(username);
        } else {
            errors.insert(
                "username",
                format!(
                    "Username must be {}-{} characters of a-z, 0-9, '-' or '_'",
                    USERNAME_MIN, USERNAME_MAX
                ),
            );
        }
    }

    if let Some(town) = update.town {
        let town = town.trim();
        if town.is_empty() {
            profile.town = None;
        } else {
            let slug = town_slug(town);
            if TOWN_NAMES.iter().any(|name| town_slug(name) == slug) {
                profile.town = Some(slug);
            } else {
                errors.insert("town", format!("Unknown town '{}'", town));
            }
        }
    }

    if let Some(avatar_url) = update.avatar_url {
        let avatar_url = avatar_url.trim();
        profile.avatar_url = (!avatar_url.is_empty()).then(|| avatar_url.to_string());
    }

    if !errors.is_empty() {
        return Err(AppError::InvalidForm(errors));
    }
    profile.updated_at = Some(Utc::now());
    Ok(profile)
}

pub async fn my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let profile = state.sessions.ensure_profile(&user.account).await?;
    Ok(success(profile, "Profile retrieved"))
}

pub async fn update_my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, AppError> {
    let current = state.sessions.ensure_profile(&user.account).await?;
    let updated = apply_update(current, update)?;
    let saved = state
        .store
        .save_profile(&updated)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile was not found".to_string()))?;
    state
        .audit(NewActivityLog::new("update", "profiles").by(user.id()).on(user.id()))
        .await?;
    Ok(success(saved, "Profile updated"))
}

pub async fn public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    let profile = state
        .store
        .get_profile_by_username(&username.to_lowercase())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' was not found", username)))?;

    let query = EventQuery::new()
        .filter(Predicate::Creator(profile.id))
        .filter(Predicate::Status(EventStatus::Active))
        .filter(Predicate::StartsAfter(Utc::now()))
        .order_by(SortOrder::DateTimeAsc);
    let upcoming_events = state.store.fetch_events(&query).await?.rows;

    Ok(success(
        PublicProfile {
            profile,
            upcoming_events,
        },
        "Profile retrieved",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProfile;
    use uuid::Uuid;

    fn profile() -> Profile {
        NewProfile {
            id: Uuid::new_v4(),
            username: "sam".into(),
            display_name: "sam".into(),
        }
        .into_profile(Utc::now())
    }

    #[test]
    fn update_touches_only_given_fields() {
        let updated = apply_update(
            profile(),
            ProfileUpdate {
                display_name: Some(" Sam T ".into()),
                town: Some("Cochrane".into()),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Sam T"));
        assert_eq!(updated.username.as_deref(), Some("sam"));
        assert_eq!(updated.town.as_deref(), Some("cochrane"));
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn rejects_bad_username_and_unknown_town() {
        let result = apply_update(
            profile(),
            ProfileUpdate {
                username: Some("no spaces allowed".into()),
                town: Some("Toronto".into()),
                ..ProfileUpdate::default()
            },
        );
        match result {
            Err(AppError::InvalidForm(fields)) => {
                assert!(fields.contains_key("username"));
                assert!(fields.contains_key("town"));
            }
            other => panic!("expected form errors, got {:?}", other.map(|p| p.id)),
        }
    }

    #[test]
    fn empty_town_clears_it() {
        let mut start = profile();
        start.town = Some("timmins".into());
        let updated = apply_update(
            start,
            ProfileUpdate {
                town: Some("".into()),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.town, None);
    }
}
