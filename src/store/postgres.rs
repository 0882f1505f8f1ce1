use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    AccountRepository, AdminRepository, CommentRepository, EventPage, EventRepository,
    InteractionRepository, ProfileRepository, StoreError, StoreResult, TownRepository,
};
use crate::config::DatabaseConfig;
use crate::filter::{EventQuery, Predicate, SortOrder};
use crate::models::{
    Account, ActivityLog, AdminAlert, AdminStats, AdminUser, AnalyticsPoint, Comment,
    CommentWithAuthor, Event, EventChanges, EventInteraction, EventStatus, InteractionKind,
    NewActivityLog, NewAlert, NewComment, NewEvent, NewMetric, NewProfile, PendingEvent,
    PlatformSettings, Profile, Session, SystemMetric, Town, UserRole,
};

const EVENT_COLUMNS: &str = "id, title, description, date_time, end_time, location, \
    coordinates, town, category, tags, image_url, creator_id, is_featured, view_count, \
    status, created_at, updated_at";

const PROFILE_COLUMNS: &str =
    "id, username, display_name, avatar_url, town, level, xp, badges, created_at, updated_at";

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, role, is_banned, created_at, last_sign_in_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn pending_statuses() -> Vec<String> {
    EventStatus::pending()
        .iter()
        .map(|status| status.as_str().to_string())
        .collect()
}

fn conflict_on_unique(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// `%` and `_` in user input are matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Status(status) => {
                builder.push("status = ").push_bind(*status);
            }
            Predicate::StatusIn(statuses) => {
                let values: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
                builder.push("status = ANY(").push_bind(values).push(")");
            }
            Predicate::Town(town) => {
                builder.push("town = ").push_bind(town.clone());
            }
            Predicate::Category(category) => {
                builder.push("category = ").push_bind(category.clone());
            }
            Predicate::TagsContain(tags) => {
                builder.push("tags @> ").push_bind(tags.clone());
            }
            Predicate::Creator(id) => {
                builder.push("creator_id = ").push_bind(*id);
            }
            Predicate::NotId(id) => {
                builder.push("id <> ").push_bind(*id);
            }
            Predicate::StartsAfter(at) => {
                builder.push("date_time >= ").push_bind(*at);
            }
            Predicate::TextMatch(term) => {
                let pattern = like_pattern(term);
                builder
                    .push("(title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR location ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn fetch_events(&self, query: &EventQuery) -> StoreResult<EventPage> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM events", EVENT_COLUMNS));
        push_predicates(&mut builder, &query.predicates);
        builder.push(match query.order {
            SortOrder::DateTimeAsc => " ORDER BY date_time ASC, id ASC",
            SortOrder::CreatedAtDesc => " ORDER BY created_at DESC, id ASC",
        });
        if let Some(window) = query.window {
            builder
                .push(" OFFSET ")
                .push_bind(window.offset)
                .push(" LIMIT ")
                .push_bind(window.limit);
        }

        let rows = builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;

        let total = if query.with_total {
            self.count_events(query).await?
        } else {
            rows.len() as i64
        };

        Ok(EventPage { rows, total })
    }

    async fn count_events(&self, query: &EventQuery) -> StoreResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_predicates(&mut builder, &query.predicates);
        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn insert_event(&self, new_event: NewEvent) -> StoreResult<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (id, title, description, date_time, end_time, location, \
             coordinates, town, category, tags, image_url, creator_id, is_featured, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new_event.title)
        .bind(new_event.description)
        .bind(new_event.date_time)
        .bind(new_event.end_time)
        .bind(new_event.location)
        .bind(new_event.coordinates.map(Json))
        .bind(new_event.town)
        .bind(new_event.category)
        .bind(new_event.tags)
        .bind(new_event.image_url)
        .bind(new_event.creator_id)
        .bind(new_event.is_featured)
        .bind(new_event.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, changes: EventChanges) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET title = $2, description = $3, date_time = $4, end_time = $5, \
             location = $6, town = $7, category = $8, tags = $9, image_url = $10, \
             is_featured = $11, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.date_time)
        .bind(changes.end_time)
        .bind(changes.location)
        .bind(changes.town)
        .bind(changes.category)
        .bind(changes.tags)
        .bind(changes.image_url)
        .bind(changes.is_featured)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn set_event_status(
        &self,
        id: Uuid,
        status: EventStatus,
    ) -> StoreResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET status = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn get_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE username = $1",
            PROFILE_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        // A taken handle falls back to an id-suffixed one.
        let fallback = format!("{}-{}", profile.username, &profile.id.simple().to_string()[..6]);
        let inserted = sqlx::query_as::<_, Profile>(&format!(
            "INSERT INTO profiles (id, username, display_name, level, xp) \
             VALUES ($1, CASE WHEN EXISTS (SELECT 1 FROM profiles WHERE username = $2) \
                         THEN $4 ELSE $2 END, $3, 1, 0) \
             RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(fallback)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn save_profile(&self, profile: &Profile) -> StoreResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET username = $2, display_name = $3, avatar_url = $4, \
             town = $5, updated_at = $6 WHERE id = $1 RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(&profile.town)
        .bind(profile.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username is already taken"))
    }
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn insert_account(&self, email: &str, password_hash: &str) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "an account with this email already exists"))
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE lower(email) = lower($1)",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn record_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE accounts SET last_sign_in_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InteractionRepository for PgStore {
    async fn find_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<Option<EventInteraction>> {
        let interaction = sqlx::query_as::<_, EventInteraction>(
            "SELECT id, user_id, event_id, interaction_type, created_at FROM event_interactions \
             WHERE user_id = $1 AND event_id = $2 AND interaction_type = $3",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(interaction)
    }

    async fn insert_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<EventInteraction> {
        sqlx::query_as::<_, EventInteraction>(
            "INSERT INTO event_interactions (id, user_id, event_id, interaction_type) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, event_id, interaction_type, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(event_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "interaction already recorded"))
    }

    async fn delete_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM event_interactions \
             WHERE user_id = $1 AND event_id = $2 AND interaction_type = $3",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(kind)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_interactions(&self, user_id: Uuid, kind: InteractionKind) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_interactions WHERE user_id = $1 AND interaction_type = $2",
        )
        .bind(user_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn interacted_events(
        &self,
        user_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<Vec<Event>> {
        let columns = EVENT_COLUMNS
            .split(", ")
            .map(|column| format!("e.{}", column.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events e \
             JOIN event_interactions i ON i.event_id = e.id \
             WHERE i.user_id = $1 AND i.interaction_type = $2 AND e.status = 'active' \
             ORDER BY e.date_time ASC",
            columns
        ))
        .bind(user_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn list_comments(&self, event_id: Uuid) -> StoreResult<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.id, c.event_id, c.user_id, c.content, c.parent_id, c.is_deleted, \
             c.created_at, c.updated_at, p.display_name, p.username, p.avatar_url \
             FROM comments c LEFT JOIN profiles p ON p.id = c.user_id \
             WHERE c.event_id = $1 AND c.is_deleted = FALSE \
             ORDER BY c.created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, event_id, user_id, content, parent_id, is_deleted, created_at, updated_at \
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let inserted = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, event_id, user_id, content, parent_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, event_id, user_id, content, parent_id, is_deleted, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(comment.event_id)
        .bind(comment.user_id)
        .bind(comment.content)
        .bind(comment.parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn soft_delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE comments SET is_deleted = TRUE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TownRepository for PgStore {
    async fn list_towns(&self) -> StoreResult<Vec<Town>> {
        let towns = sqlx::query_as::<_, Town>(
            "SELECT slug, name, region, population, created_at FROM towns ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(towns)
    }

    async fn get_town(&self, slug: &str) -> StoreResult<Option<Town>> {
        let town = sqlx::query_as::<_, Town>(
            "SELECT slug, name, region, population, created_at FROM towns WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(town)
    }
}

#[async_trait]
impl AdminRepository for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn admin_stats(&self) -> StoreResult<AdminStats> {
        let stats = sqlx::query_as::<_, AdminStats>(
            "SELECT \
               (SELECT COUNT(*) FROM events) AS total_events, \
               (SELECT COUNT(*) FROM accounts) AS total_users, \
               (SELECT COUNT(*) FROM events WHERE status = 'active') AS active_events, \
               (SELECT COUNT(*) FROM events WHERE status = ANY($1)) AS pending_events, \
               (SELECT COUNT(*) FROM accounts WHERE created_at >= now() - interval '7 days') \
                 AS recent_signups",
        )
        .bind(pending_statuses())
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn pending_events(&self) -> StoreResult<Vec<PendingEvent>> {
        let events = sqlx::query_as::<_, PendingEvent>(
            "SELECT e.id, e.title, e.description, \
               COALESCE(p.display_name, p.username) AS creator_name, e.created_at, e.status \
             FROM events e LEFT JOIN profiles p ON p.id = e.creator_id \
             WHERE e.status = ANY($1) \
             ORDER BY e.created_at ASC",
        )
        .bind(pending_statuses())
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn bulk_update_events(&self, ids: &[Uuid], status: EventStatus) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE events SET status = $2, updated_at = now() WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_users(&self, limit: i64) -> StoreResult<Vec<AdminUser>> {
        let users = sqlx::query_as::<_, AdminUser>(
            "SELECT a.id, a.email, p.username, p.display_name, a.role, p.town, a.created_at, \
               a.last_sign_in_at, \
               (SELECT COUNT(*) FROM events e WHERE e.creator_id = a.id) AS event_count, \
               a.is_banned \
             FROM accounts a LEFT JOIN profiles p ON p.id = a.id \
             ORDER BY a.created_at DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE accounts SET role = $2 WHERE id = $1")
            .bind(user_id)
            .bind(role)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_user_ban(&self, user_id: Uuid, banned: bool) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE accounts SET is_banned = $2 WHERE id = $1")
            .bind(user_id)
            .bind(banned)
            .execute(&mut *tx)
            .await?;
        if banned {
            sqlx::query("DELETE FROM sessions WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_activity(&self, log: NewActivityLog) -> StoreResult<ActivityLog> {
        let inserted = sqlx::query_as::<_, ActivityLog>(
            "INSERT INTO activity_logs \
               (id, user_id, action_type, table_name, record_id, details, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, action_type, table_name, record_id, details, ip_address, \
               user_agent, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(log.user_id)
        .bind(log.action_type)
        .bind(log.table_name)
        .bind(log.record_id)
        .bind(log.details)
        .bind(log.user_agent)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn recent_activity(&self, limit: i64) -> StoreResult<Vec<ActivityLog>> {
        let logs = sqlx::query_as::<_, ActivityLog>(
            "SELECT id, user_id, action_type, table_name, record_id, details, ip_address, \
               user_agent, created_at \
             FROM activity_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    async fn insert_alert(&self, alert: NewAlert) -> StoreResult<AdminAlert> {
        let inserted = sqlx::query_as::<_, AdminAlert>(
            "INSERT INTO admin_alerts (id, alert_type, title, message, entity_type, entity_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, alert_type, title, message, entity_type, entity_id, is_read, \
               created_at, expires_at",
        )
        .bind(Uuid::new_v4())
        .bind(alert.alert_type)
        .bind(alert.title)
        .bind(alert.message)
        .bind(alert.entity_type)
        .bind(alert.entity_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn alerts(&self, unread_only: bool) -> StoreResult<Vec<AdminAlert>> {
        let alerts = sqlx::query_as::<_, AdminAlert>(
            "SELECT id, alert_type, title, message, entity_type, entity_id, is_read, created_at, \
               expires_at \
             FROM admin_alerts \
             WHERE (NOT $1 OR is_read = FALSE) AND (expires_at IS NULL OR expires_at > now()) \
             ORDER BY created_at DESC",
        )
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(alerts)
    }

    async fn mark_alert_read(&self, id: Uuid) -> StoreResult<Option<AdminAlert>> {
        let alert = sqlx::query_as::<_, AdminAlert>(
            "UPDATE admin_alerts SET is_read = TRUE WHERE id = $1 \
             RETURNING id, alert_type, title, message, entity_type, entity_id, is_read, \
               created_at, expires_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(alert)
    }

    async fn insert_metrics(&self, metrics: Vec<NewMetric>) -> StoreResult<Vec<SystemMetric>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(metrics.len());
        for metric in metrics {
            let row = sqlx::query_as::<_, SystemMetric>(
                "INSERT INTO system_metrics (id, metric_name, metric_value, metric_unit) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, metric_name, metric_value, metric_unit, details, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(metric.metric_name)
            .bind(metric.metric_value)
            .bind(metric.metric_unit)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn system_health(&self, limit: i64) -> StoreResult<Vec<SystemMetric>> {
        let metrics = sqlx::query_as::<_, SystemMetric>(
            "SELECT id, metric_name, metric_value, metric_unit, details, created_at \
             FROM system_metrics ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(metrics)
    }

    async fn analytics(&self, today: NaiveDate, days_back: i32) -> StoreResult<Vec<AnalyticsPoint>> {
        let points = sqlx::query_as::<_, AnalyticsPoint>(
            "SELECT d::date AS date, \
               (SELECT COUNT(*) FROM accounts a WHERE a.created_at::date = d::date) AS new_users, \
               (SELECT COUNT(*) FROM events e WHERE e.created_at::date = d::date) AS new_events, \
               (SELECT COUNT(DISTINCT l.user_id) FROM activity_logs l \
                  WHERE l.created_at::date = d::date) AS active_users \
             FROM generate_series($1::date - ($2::int - 1), $1::date, interval '1 day') AS d \
             ORDER BY d",
        )
        .bind(today)
        .bind(days_back)
        .fetch_all(&self.pool)
        .await?;
        Ok(points)
    }

    async fn platform_settings(&self) -> StoreResult<PlatformSettings> {
        let settings = sqlx::query_as::<_, PlatformSettings>(
            "SELECT \
               (SELECT COUNT(*) FROM events) AS total_events, \
               (SELECT COUNT(*) FROM accounts) AS total_users, \
               pg_database_size(current_database())::float8 / 1048576.0 AS database_size_mb, \
               NULL::timestamptz AS last_backup",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jazz"), "%jazz%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }

    #[test]
    fn predicates_render_in_order() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_predicates(
            &mut builder,
            &[
                Predicate::Status(EventStatus::Active),
                Predicate::Town("timmins".into()),
                Predicate::TagsContain(vec!["free".into()]),
            ],
        );
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM events WHERE status = $1 AND town = $2 AND tags @> $3"
        );
    }

    #[test]
    fn text_match_binds_three_patterns() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_predicates(&mut builder, &[Predicate::TextMatch("market".into())]);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM events WHERE (title ILIKE $1 OR description ILIKE $2 OR location ILIKE $3)"
        );
    }
}
