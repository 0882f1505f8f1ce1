use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum InteractionKind {
    Favorite,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventInteraction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub interaction_type: InteractionKind,
    pub created_at: DateTime<Utc>,
}
