//! Data boundary. Handlers only see these traits; `PgStore` backs them with
//! PostgreSQL and `MemoryStore` keeps everything in process.
//!
//! Admin-only aggregate reads and bulk writes live on [`AdminRepository`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::filter::EventQuery;
use crate::models::{
    Account, ActivityLog, AdminAlert, AdminStats, AdminUser, AnalyticsPoint, Comment,
    CommentWithAuthor, Event, EventChanges, EventInteraction, EventStatus, InteractionKind,
    NewActivityLog, NewAlert, NewComment, NewEvent, NewMetric, NewProfile, PendingEvent,
    PlatformSettings, Profile, Session, SystemMetric, Town, UserRole,
};

pub use memory::{MemoryStore, Mutation};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rows of an event read plus the unwindowed total when it was requested.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub rows: Vec<Event>,
    pub total: i64,
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn fetch_events(&self, query: &EventQuery) -> StoreResult<EventPage>;

    async fn count_events(&self, query: &EventQuery) -> StoreResult<i64>;

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>>;

    async fn insert_event(&self, new_event: NewEvent) -> StoreResult<Event>;

    async fn update_event(&self, id: Uuid, changes: EventChanges) -> StoreResult<Option<Event>>;

    async fn set_event_status(&self, id: Uuid, status: EventStatus)
        -> StoreResult<Option<Event>>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;

    async fn get_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>>;

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile>;

    /// Writes every editable column of `profile`. Fails with
    /// [`StoreError::Conflict`] when the username is taken.
    async fn save_profile(&self, profile: &Profile) -> StoreResult<Option<Profile>>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn insert_account(&self, email: &str, password_hash: &str) -> StoreResult<Account>;

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn get_account(&self, id: Uuid) -> StoreResult<Option<Account>>;

    async fn record_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;

    async fn insert_session(&self, session: &Session) -> StoreResult<()>;

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>>;

    async fn delete_session(&self, token: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn find_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<Option<EventInteraction>>;

    async fn insert_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<EventInteraction>;

    async fn delete_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<u64>;

    async fn count_interactions(&self, user_id: Uuid, kind: InteractionKind) -> StoreResult<i64>;

    /// Non-deleted events the user marked with `kind`, soonest first.
    async fn interacted_events(
        &self,
        user_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<Vec<Event>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Visible comments of an event, oldest first, with author fields.
    async fn list_comments(&self, event_id: Uuid) -> StoreResult<Vec<CommentWithAuthor>>;

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment>;

    async fn soft_delete_comment(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait TownRepository: Send + Sync {
    async fn list_towns(&self) -> StoreResult<Vec<Town>>;

    async fn get_town(&self, slug: &str) -> StoreResult<Option<Town>>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn admin_stats(&self) -> StoreResult<AdminStats>;

    async fn pending_events(&self) -> StoreResult<Vec<PendingEvent>>;

    /// Sets `status` on every listed event in one call. Returns rows changed.
    async fn bulk_update_events(&self, ids: &[Uuid], status: EventStatus) -> StoreResult<u64>;

    async fn list_users(&self, limit: i64) -> StoreResult<Vec<AdminUser>>;

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> StoreResult<bool>;

    async fn set_user_ban(&self, user_id: Uuid, banned: bool) -> StoreResult<bool>;

    async fn insert_activity(&self, log: NewActivityLog) -> StoreResult<ActivityLog>;

    async fn recent_activity(&self, limit: i64) -> StoreResult<Vec<ActivityLog>>;

    async fn insert_alert(&self, alert: NewAlert) -> StoreResult<AdminAlert>;

    async fn alerts(&self, unread_only: bool) -> StoreResult<Vec<AdminAlert>>;

    async fn mark_alert_read(&self, id: Uuid) -> StoreResult<Option<AdminAlert>>;

    async fn insert_metrics(&self, metrics: Vec<NewMetric>) -> StoreResult<Vec<SystemMetric>>;

    /// Latest metric samples, newest first.
    async fn system_health(&self, limit: i64) -> StoreResult<Vec<SystemMetric>>;

    /// One point per day from `today - (days_back - 1)` through `today`.
    async fn analytics(&self, today: NaiveDate, days_back: i32) -> StoreResult<Vec<AnalyticsPoint>>;

    async fn platform_settings(&self) -> StoreResult<PlatformSettings>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store:
    EventRepository
    + ProfileRepository
    + AccountRepository
    + InteractionRepository
    + CommentRepository
    + TownRepository
    + AdminRepository
    + 'static
{
}

impl<T> Store for T where
    T: EventRepository
        + ProfileRepository
        + AccountRepository
        + InteractionRepository
        + CommentRepository
        + TownRepository
        + AdminRepository
        + 'static
{
}

pub type SharedStore = Arc<dyn Store>;
