use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub town: Option<String>,
    pub level: i32,
    pub xp: i32,
    /// Loosely typed; the community layer never settled on a shape.
    pub badges: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}

impl NewProfile {
    pub fn into_profile(self, now: DateTime<Utc>) -> Profile {
        Profile {
            id: self.id,
            username: Some(self.username),
            display_name: Some(self.display_name),
            avatar_url: None,
            town: None,
            level: 1,
            xp: 0,
            badges: None,
            created_at: now,
            updated_at: None,
        }
    }
}

/// Settings form payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub town: Option<String>,
    pub avatar_url: Option<String>,
}
