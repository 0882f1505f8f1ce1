use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Town {
    pub slug: String,
    pub name: String,
    pub region: Option<String>,
    pub population: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Town selector entry.
#[derive(Debug, Clone, Serialize)]
pub struct TownSummary {
    pub slug: String,
    pub name: String,
    pub event_count: i64,
    pub is_popular: bool,
}
