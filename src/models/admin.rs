use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::{EventStatus, UserRole};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AdminStats {
    pub total_events: i64,
    pub total_users: i64,
    pub active_events: i64,
    pub pending_events: i64,
    /// Accounts created in the last seven days.
    pub recent_signups: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub creator_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub role: UserRole,
    pub town: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub event_count: i64,
    pub is_banned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action_type: String,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub user_id: Option<Uuid>,
    pub action_type: &'static str,
    pub table_name: &'static str,
    pub record_id: Option<Uuid>,
    pub details: Option<Value>,
    pub user_agent: Option<String>,
}

impl NewActivityLog {
    pub fn new(action_type: &'static str, table_name: &'static str) -> Self {
        Self {
            user_id: None,
            action_type,
            table_name,
            record_id: None,
            details: None,
            user_agent: None,
        }
    }

    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn on(mut self, record_id: Uuid) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn into_log(self, id: Uuid, now: DateTime<Utc>) -> ActivityLog {
        ActivityLog {
            id,
            user_id: self.user_id,
            action_type: self.action_type.to_string(),
            table_name: self.table_name.to_string(),
            record_id: self.record_id,
            details: self.details,
            ip_address: None,
            user_agent: self.user_agent,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminAlert {
    pub id: Uuid,
    pub alert_type: AlertSeverity,
    pub title: String,
    pub message: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub alert_type: AlertSeverity,
    pub title: String,
    pub message: String,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<Uuid>,
}

impl NewAlert {
    pub fn into_alert(self, id: Uuid, now: DateTime<Utc>) -> AdminAlert {
        AdminAlert {
            id,
            alert_type: self.alert_type,
            title: self.title,
            message: self.message,
            entity_type: self.entity_type.map(str::to_string),
            entity_id: self.entity_id,
            is_read: false,
            created_at: now,
            expires_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SystemMetric {
    pub id: Uuid,
    pub metric_name: String,
    pub metric_value: f64,
    pub metric_unit: Option<String>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMetric {
    pub metric_name: &'static str,
    pub metric_value: f64,
    pub metric_unit: &'static str,
}

impl NewMetric {
    pub fn into_metric(self, id: Uuid, now: DateTime<Utc>) -> SystemMetric {
        SystemMetric {
            id,
            metric_name: self.metric_name.to_string(),
            metric_value: self.metric_value,
            metric_unit: Some(self.metric_unit.to_string()),
            details: None,
            created_at: now,
        }
    }
}

/// One day of the analytics chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AnalyticsPoint {
    pub date: NaiveDate,
    pub new_users: i64,
    pub new_events: i64,
    pub active_users: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlatformSettings {
    pub total_events: i64,
    pub total_users: i64,
    pub database_size_mb: f64,
    pub last_backup: Option<DateTime<Utc>>,
}
