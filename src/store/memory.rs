use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use super::{
    AccountRepository, AdminRepository, CommentRepository, EventPage, EventRepository,
    InteractionRepository, ProfileRepository, StoreError, StoreResult, TownRepository,
};
use crate::filter::{EventQuery, Predicate, SortOrder};
use crate::models::{
    Account, ActivityLog, AdminAlert, AdminStats, AdminUser, AnalyticsPoint, Comment,
    CommentAuthor, CommentWithAuthor, Event, EventChanges, EventInteraction, EventStatus,
    InteractionKind, NewActivityLog, NewAlert, NewComment, NewEvent, NewMetric, NewProfile,
    PendingEvent, PlatformSettings, Profile, Session, SystemMetric, Town, UserRole,
};
use crate::taxonomy::{town_slug, TOWN_NAMES};

/// A mutating call that [`MemoryStore`] completed without error, in arrival
/// order. Rejected writes (conflicts) are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    InsertEvent(NewEvent),
    UpdateEvent { id: Uuid, changes: EventChanges },
    SetEventStatus { id: Uuid, status: EventStatus },
    BulkUpdateEvents { ids: Vec<Uuid>, status: EventStatus },
    InsertInteraction { user_id: Uuid, event_id: Uuid },
    DeleteInteraction { user_id: Uuid, event_id: Uuid },
    InsertComment { event_id: Uuid, content: String },
    DeleteComment(Uuid),
    SaveProfile(Uuid),
    UpdateUserRole { user_id: Uuid, role: UserRole },
    SetUserBan { user_id: Uuid, banned: bool },
}

#[derive(Default)]
struct Tables {
    events: Vec<Event>,
    profiles: HashMap<Uuid, Profile>,
    accounts: HashMap<Uuid, Account>,
    sessions: HashMap<String, Session>,
    interactions: Vec<EventInteraction>,
    comments: Vec<Comment>,
    towns: Vec<Town>,
    activity: Vec<ActivityLog>,
    alerts: Vec<AdminAlert>,
    metrics: Vec<SystemMetric>,
}

/// In-process store for tests and local runs without PostgreSQL.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    journal: Mutex<Vec<Mutation>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store holding only the district's towns.
    pub fn new() -> Self {
        let now = Utc::now();
        let towns = TOWN_NAMES
            .iter()
            .map(|name| Town {
                slug: town_slug(name),
                name: name.to_string(),
                region: Some("Cochrane District".to_string()),
                population: None,
                created_at: now,
            })
            .collect();
        Self {
            tables: Mutex::new(Tables {
                towns,
                ..Tables::default()
            }),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Places a fully formed row, bypassing the journal.
    pub fn seed_event(&self, event: Event) {
        self.tables().events.push(event);
    }

    pub fn journal(&self) -> Vec<Mutation> {
        self.lock_journal().clone()
    }

    pub fn clear_journal(&self) {
        self.lock_journal().clear();
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_journal(&self) -> MutexGuard<'_, Vec<Mutation>> {
        self.journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, mutation: Mutation) {
        self.lock_journal().push(mutation);
    }
}

fn matches(event: &Event, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Status(status) => event.status == *status,
        Predicate::StatusIn(statuses) => statuses.contains(&event.status),
        Predicate::Town(town) => event.town.as_deref() == Some(town.as_str()),
        Predicate::Category(category) => event.category.as_deref() == Some(category.as_str()),
        Predicate::TagsContain(tags) => tags.iter().all(|tag| event.tags.contains(tag)),
        Predicate::Creator(id) => event.is_owned_by(*id),
        Predicate::NotId(id) => event.id != *id,
        Predicate::StartsAfter(at) => event.date_time >= *at,
        Predicate::TextMatch(term) => {
            let needle = term.to_lowercase();
            [
                Some(event.title.as_str()),
                event.description.as_deref(),
                event.location.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
        }
    }
}

fn select(events: &[Event], query: &EventQuery) -> Vec<Event> {
    let mut rows: Vec<Event> = events
        .iter()
        .filter(|event| query.predicates.iter().all(|p| matches(event, p)))
        .cloned()
        .collect();
    match query.order {
        SortOrder::DateTimeAsc => rows.sort_by(|a, b| a.date_time.cmp(&b.date_time).then(a.id.cmp(&b.id))),
        SortOrder::CreatedAtDesc => {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)))
        }
    }
    rows
}

fn author_of(tables: &Tables, user_id: Uuid) -> CommentAuthor {
    tables
        .profiles
        .get(&user_id)
        .map(|profile| CommentAuthor {
            display_name: profile.display_name.clone(),
            username: profile.username.clone(),
            avatar_url: profile.avatar_url.clone(),
        })
        .unwrap_or_default()
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn fetch_events(&self, query: &EventQuery) -> StoreResult<EventPage> {
        let tables = self.tables();
        let matched = select(&tables.events, query);
        let total = matched.len() as i64;
        let rows = match query.window {
            Some(window) => matched
                .into_iter()
                .skip(window.offset.max(0) as usize)
                .take(window.limit.max(0) as usize)
                .collect(),
            None => matched,
        };
        let total = if query.with_total { total } else { rows.len() as i64 };
        Ok(EventPage { rows, total })
    }

    async fn count_events(&self, query: &EventQuery) -> StoreResult<i64> {
        let tables = self.tables();
        Ok(tables
            .events
            .iter()
            .filter(|event| query.predicates.iter().all(|p| matches(event, p)))
            .count() as i64)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.tables().events.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_event(&self, new_event: NewEvent) -> StoreResult<Event> {
        let event = new_event.clone().into_event(Uuid::new_v4(), Utc::now());
        self.tables().events.push(event.clone());
        self.record(Mutation::InsertEvent(new_event));
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, changes: EventChanges) -> StoreResult<Option<Event>> {
        let updated = self.tables().events.iter_mut().find(|e| e.id == id).map(|event| {
            changes.clone().apply_to(event, Utc::now());
            event.clone()
        });
        self.record(Mutation::UpdateEvent { id, changes });
        Ok(updated)
    }

    async fn set_event_status(
        &self,
        id: Uuid,
        status: EventStatus,
    ) -> StoreResult<Option<Event>> {
        let updated = self.tables().events.iter_mut().find(|e| e.id == id).map(|event| {
            event.status = status;
            event.updated_at = Some(Utc::now());
            event.clone()
        });
        self.record(Mutation::SetEventStatus { id, status });
        Ok(updated)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.tables().profiles.get(&id).cloned())
    }

    async fn get_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .tables()
            .profiles
            .values()
            .find(|p| p.username.as_deref() == Some(username))
            .cloned())
    }

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        let mut tables = self.tables();
        if let Some(existing) = tables.profiles.get(&profile.id) {
            return Ok(existing.clone());
        }
        let taken = tables
            .profiles
            .values()
            .any(|p| p.username.as_deref() == Some(profile.username.as_str()));
        let mut profile = profile;
        if taken {
            profile.username = format!("{}-{}", profile.username, &profile.id.simple().to_string()[..6]);
        }
        let row = profile.into_profile(Utc::now());
        tables.profiles.insert(row.id, row.clone());
        Ok(row)
    }

    async fn save_profile(&self, profile: &Profile) -> StoreResult<Option<Profile>> {
        let mut tables = self.tables();
        if let Some(username) = profile.username.as_deref() {
            let taken = tables
                .profiles
                .values()
                .any(|p| p.id != profile.id && p.username.as_deref() == Some(username));
            if taken {
                return Err(StoreError::Conflict("username is already taken".into()));
            }
        }
        let saved = tables.profiles.get_mut(&profile.id).map(|row| {
            row.username = profile.username.clone();
            row.display_name = profile.display_name.clone();
            row.avatar_url = profile.avatar_url.clone();
            row.town = profile.town.clone();
            row.updated_at = profile.updated_at;
            row.clone()
        });
        drop(tables);
        if saved.is_some() {
            self.record(Mutation::SaveProfile(profile.id));
        }
        Ok(saved)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert_account(&self, email: &str, password_hash: &str) -> StoreResult<Account> {
        let mut tables = self.tables();
        if tables
            .accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(email))
        {
            return Err(StoreError::Conflict(
                "an account with this email already exists".into(),
            ));
        }
        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: UserRole::User,
            is_banned: false,
            created_at: Utc::now(),
            last_sign_in_at: None,
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .tables()
            .accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.tables().accounts.get(&id).cloned())
    }

    async fn record_sign_in(&self, id: Uuid, at: chrono::DateTime<Utc>) -> StoreResult<()> {
        if let Some(account) = self.tables().accounts.get_mut(&id) {
            account.last_sign_in_at = Some(at);
        }
        Ok(())
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.tables()
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        Ok(self.tables().sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        Ok(self.tables().sessions.remove(token).is_some())
    }
}

#[async_trait]
impl InteractionRepository for MemoryStore {
    async fn find_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<Option<EventInteraction>> {
        Ok(self
            .tables()
            .interactions
            .iter()
            .find(|i| i.user_id == user_id && i.event_id == event_id && i.interaction_type == kind)
            .cloned())
    }

    async fn insert_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<EventInteraction> {
        let mut tables = self.tables();
        if tables
            .interactions
            .iter()
            .any(|i| i.user_id == user_id && i.event_id == event_id && i.interaction_type == kind)
        {
            return Err(StoreError::Conflict("interaction already recorded".into()));
        }
        let interaction = EventInteraction {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            interaction_type: kind,
            created_at: Utc::now(),
        };
        tables.interactions.push(interaction.clone());
        drop(tables);
        self.record(Mutation::InsertInteraction { user_id, event_id });
        Ok(interaction)
    }

    async fn delete_interaction(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<u64> {
        let removed = {
            let mut tables = self.tables();
            let before = tables.interactions.len();
            tables.interactions.retain(|i| {
                !(i.user_id == user_id && i.event_id == event_id && i.interaction_type == kind)
            });
            (before - tables.interactions.len()) as u64
        };
        self.record(Mutation::DeleteInteraction { user_id, event_id });
        Ok(removed)
    }

    async fn count_interactions(&self, user_id: Uuid, kind: InteractionKind) -> StoreResult<i64> {
        Ok(self
            .tables()
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id && i.interaction_type == kind)
            .count() as i64)
    }

    async fn interacted_events(
        &self,
        user_id: Uuid,
        kind: InteractionKind,
    ) -> StoreResult<Vec<Event>> {
        let tables = self.tables();
        let mut events: Vec<Event> = tables
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id && i.interaction_type == kind)
            .filter_map(|i| tables.events.iter().find(|e| e.id == i.event_id))
            .filter(|e| e.status == EventStatus::Active)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.date_time);
        Ok(events)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn list_comments(&self, event_id: Uuid) -> StoreResult<Vec<CommentWithAuthor>> {
        let tables = self.tables();
        let mut comments: Vec<CommentWithAuthor> = tables
            .comments
            .iter()
            .filter(|c| c.event_id == event_id && !c.is_deleted)
            .map(|c| CommentWithAuthor {
                comment: c.clone(),
                author: author_of(&tables, c.user_id),
            })
            .collect();
        comments.sort_by_key(|c| c.comment.created_at);
        Ok(comments)
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.tables().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let row = Comment {
            id: Uuid::new_v4(),
            event_id: comment.event_id,
            user_id: comment.user_id,
            content: comment.content,
            parent_id: comment.parent_id,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.tables().comments.push(row.clone());
        self.record(Mutation::InsertComment {
            event_id: row.event_id,
            content: row.content.clone(),
        });
        Ok(row)
    }

    async fn soft_delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let found = match self.tables().comments.iter_mut().find(|c| c.id == id) {
            Some(comment) => {
                comment.is_deleted = true;
                comment.updated_at = Some(Utc::now());
                true
            }
            None => false,
        };
        self.record(Mutation::DeleteComment(id));
        Ok(found)
    }
}

#[async_trait]
impl TownRepository for MemoryStore {
    async fn list_towns(&self) -> StoreResult<Vec<Town>> {
        let mut towns = self.tables().towns.clone();
        towns.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(towns)
    }

    async fn get_town(&self, slug: &str) -> StoreResult<Option<Town>> {
        Ok(self.tables().towns.iter().find(|t| t.slug == slug).cloned())
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn admin_stats(&self) -> StoreResult<AdminStats> {
        let tables = self.tables();
        let week_ago = Utc::now() - Duration::days(7);
        Ok(AdminStats {
            total_events: tables.events.len() as i64,
            total_users: tables.accounts.len() as i64,
            active_events: tables
                .events
                .iter()
                .filter(|e| e.status == EventStatus::Active)
                .count() as i64,
            pending_events: tables.events.iter().filter(|e| e.status.is_pending()).count() as i64,
            recent_signups: tables
                .accounts
                .values()
                .filter(|a| a.created_at >= week_ago)
                .count() as i64,
        })
    }

    async fn pending_events(&self) -> StoreResult<Vec<PendingEvent>> {
        let tables = self.tables();
        let mut pending: Vec<PendingEvent> = tables
            .events
            .iter()
            .filter(|e| e.status.is_pending())
            .map(|e| PendingEvent {
                id: e.id,
                title: e.title.clone(),
                description: e.description.clone(),
                creator_name: e
                    .creator_id
                    .and_then(|id| tables.profiles.get(&id))
                    .and_then(|p| p.display_name.clone().or_else(|| p.username.clone())),
                created_at: e.created_at,
                status: e.status,
            })
            .collect();
        pending.sort_by_key(|p| p.created_at);
        Ok(pending)
    }

    async fn bulk_update_events(&self, ids: &[Uuid], status: EventStatus) -> StoreResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for event in self.tables().events.iter_mut().filter(|e| ids.contains(&e.id)) {
            event.status = status;
            event.updated_at = Some(now);
            changed += 1;
        }
        self.record(Mutation::BulkUpdateEvents {
            ids: ids.to_vec(),
            status,
        });
        Ok(changed)
    }

    async fn list_users(&self, limit: i64) -> StoreResult<Vec<AdminUser>> {
        let tables = self.tables();
        let mut users: Vec<AdminUser> = tables
            .accounts
            .values()
            .map(|account| {
                let profile = tables.profiles.get(&account.id);
                AdminUser {
                    id: account.id,
                    email: account.email.clone(),
                    username: profile.and_then(|p| p.username.clone()),
                    display_name: profile.and_then(|p| p.display_name.clone()),
                    role: account.role,
                    town: profile.and_then(|p| p.town.clone()),
                    created_at: account.created_at,
                    last_sign_in_at: account.last_sign_in_at,
                    event_count: tables
                        .events
                        .iter()
                        .filter(|e| e.is_owned_by(account.id))
                        .count() as i64,
                    is_banned: account.is_banned,
                }
            })
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn update_user_role(&self, user_id: Uuid, role: UserRole) -> StoreResult<bool> {
        let found = match self.tables().accounts.get_mut(&user_id) {
            Some(account) => {
                account.role = role;
                true
            }
            None => false,
        };
        self.record(Mutation::UpdateUserRole { user_id, role });
        Ok(found)
    }

    async fn set_user_ban(&self, user_id: Uuid, banned: bool) -> StoreResult<bool> {
        let mut tables = self.tables();
        let found = match tables.accounts.get_mut(&user_id) {
            Some(account) => {
                account.is_banned = banned;
                true
            }
            None => false,
        };
        if banned {
            tables.sessions.retain(|_, session| session.user_id != user_id);
        }
        drop(tables);
        self.record(Mutation::SetUserBan { user_id, banned });
        Ok(found)
    }

    async fn insert_activity(&self, log: NewActivityLog) -> StoreResult<ActivityLog> {
        let row = log.into_log(Uuid::new_v4(), Utc::now());
        self.tables().activity.push(row.clone());
        Ok(row)
    }

    async fn recent_activity(&self, limit: i64) -> StoreResult<Vec<ActivityLog>> {
        let tables = self.tables();
        Ok(tables
            .activity
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn insert_alert(&self, alert: NewAlert) -> StoreResult<AdminAlert> {
        let row = alert.into_alert(Uuid::new_v4(), Utc::now());
        self.tables().alerts.push(row.clone());
        Ok(row)
    }

    async fn alerts(&self, unread_only: bool) -> StoreResult<Vec<AdminAlert>> {
        let now = Utc::now();
        let tables = self.tables();
        Ok(tables
            .alerts
            .iter()
            .rev()
            .filter(|a| !unread_only || !a.is_read)
            .filter(|a| a.expires_at.map_or(true, |at| at > now))
            .cloned()
            .collect())
    }

    async fn mark_alert_read(&self, id: Uuid) -> StoreResult<Option<AdminAlert>> {
        let mut tables = self.tables();
        Ok(tables.alerts.iter_mut().find(|a| a.id == id).map(|alert| {
            alert.is_read = true;
            alert.clone()
        }))
    }

    async fn insert_metrics(&self, metrics: Vec<NewMetric>) -> StoreResult<Vec<SystemMetric>> {
        let now = Utc::now();
        let rows: Vec<SystemMetric> = metrics
            .into_iter()
            .map(|metric| metric.into_metric(Uuid::new_v4(), now))
            .collect();
        self.tables().metrics.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn system_health(&self, limit: i64) -> StoreResult<Vec<SystemMetric>> {
        let tables = self.tables();
        Ok(tables
            .metrics
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn analytics(&self, today: NaiveDate, days_back: i32) -> StoreResult<Vec<AnalyticsPoint>> {
        let tables = self.tables();
        let days = days_back.max(1) as i64;
        Ok((0..days)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                let mut active: Vec<Uuid> = tables
                    .activity
                    .iter()
                    .filter(|l| l.created_at.date_naive() == date)
                    .filter_map(|l| l.user_id)
                    .collect();
                active.sort();
                active.dedup();
                AnalyticsPoint {
                    date,
                    new_users: tables
                        .accounts
                        .values()
                        .filter(|a| a.created_at.date_naive() == date)
                        .count() as i64,
                    new_events: tables
                        .events
                        .iter()
                        .filter(|e| e.created_at.date_naive() == date)
                        .count() as i64,
                    active_users: active.len() as i64,
                }
            })
            .collect())
    }

    async fn platform_settings(&self) -> StoreResult<PlatformSettings> {
        let tables = self.tables();
        Ok(PlatformSettings {
            total_events: tables.events.len() as i64,
            total_users: tables.accounts.len() as i64,
            database_size_mb: 0.0,
            last_backup: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{compose, EventFilters};

    fn event(title: &str, town: &str, status: EventStatus, days_ahead: i64) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: Some(format!("{} description", title)),
            date_time: now + Duration::days(days_ahead),
            end_time: None,
            location: Some("Hollinger Park".to_string()),
            coordinates: None,
            town: Some(town.to_string()),
            category: Some("community".to_string()),
            tags: vec!["free".to_string()],
            image_url: None,
            creator_id: None,
            is_featured: false,
            view_count: 0,
            status,
            created_at: now,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn browse_query_filters_and_windows() {
        let store = MemoryStore::new();
        for day in 0..15 {
            store.seed_event(event(&format!("Timmins {}", day), "timmins", EventStatus::Active, day + 1));
        }
        store.seed_event(event("Cochrane", "cochrane", EventStatus::Active, 1));
        store.seed_event(event("Hidden", "timmins", EventStatus::Deleted, 1));

        let composed = compose(&EventFilters {
            near: Some("Timmins".into()),
            page: Some(2),
            ..EventFilters::default()
        });
        let page = store.fetch_events(&composed.query).await.unwrap();
        assert_eq!(page.total, 15);
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.rows[0].title, "Timmins 12");
    }

    #[tokio::test]
    async fn favorite_then_unfavorite_leaves_no_rows() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let target = event("Market", "cochrane", EventStatus::Active, 2);
        let event_id = target.id;
        store.seed_event(target);

        store
            .insert_interaction(user, event_id, InteractionKind::Favorite)
            .await
            .unwrap();
        assert_eq!(store.count_interactions(user, InteractionKind::Favorite).await.unwrap(), 1);
        let removed = store
            .delete_interaction(user, event_id, InteractionKind::Favorite)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count_interactions(user, InteractionKind::Favorite).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_favorite_is_a_conflict() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        store
            .insert_interaction(user, event_id, InteractionKind::Favorite)
            .await
            .unwrap();
        let second = store
            .insert_interaction(user, event_id, InteractionKind::Favorite)
            .await;
        assert!(matches!(second, Err(StoreError::Conflict(_))));
        assert_eq!(
            store.journal(),
            vec![Mutation::InsertInteraction { user_id: user, event_id }]
        );
    }

    #[tokio::test]
    async fn favorites_list_only_active_events() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let live = event("Live", "timmins", EventStatus::Active, 1);
        let hidden = event("Hidden", "timmins", EventStatus::Draft, 1);
        let ids = [live.id, hidden.id];
        store.seed_event(live);
        store.seed_event(hidden);
        for id in ids {
            store
                .insert_interaction(user, id, InteractionKind::Favorite)
                .await
                .unwrap();
        }

        let listed = store
            .interacted_events(user, InteractionKind::Favorite)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Live");
    }

    #[tokio::test]
    async fn creator_query_returns_only_own_live_events() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let mut mine = event("Mine", "timmins", EventStatus::Draft, 1);
        mine.creator_id = Some(owner);
        let mut gone = event("Gone", "timmins", EventStatus::Deleted, 1);
        gone.creator_id = Some(owner);
        let mut theirs = event("Theirs", "timmins", EventStatus::Active, 1);
        theirs.creator_id = Some(Uuid::new_v4());
        store.seed_event(mine);
        store.seed_event(gone);
        store.seed_event(theirs);
        store.seed_event(event("Orphan", "timmins", EventStatus::Active, 1));

        let page = store
            .fetch_events(&crate::filter::query::creator_query(owner))
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].title, "Mine");
    }

    #[tokio::test]
    async fn bulk_update_touches_only_listed_rows() {
        let store = MemoryStore::new();
        let a = event("A", "timmins", EventStatus::Draft, 1);
        let b = event("B", "timmins", EventStatus::Draft, 1);
        let c = event("C", "timmins", EventStatus::Draft, 1);
        let ids = vec![a.id, b.id];
        let untouched = c.id;
        for e in [a, b, c] {
            store.seed_event(e);
        }

        let changed = store
            .bulk_update_events(&ids, EventStatus::Active)
            .await
            .unwrap();
        assert_eq!(changed, 2);
        let c = store.get_event(untouched).await.unwrap().unwrap();
        assert_eq!(c.status, EventStatus::Draft);
        assert_eq!(store.pending_events().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn analytics_covers_every_requested_day() {
        let store = MemoryStore::new();
        store.insert_account("a@example.com", "hash").await.unwrap();
        let today = Utc::now().date_naive();
        let points = store.analytics(today, 7).await.unwrap();
        assert_eq!(points.len(), 7);
        assert_eq!(points.last().unwrap().date, today);
        assert_eq!(points.last().unwrap().new_users, 1);
    }

    #[tokio::test]
    async fn second_profile_with_same_handle_gets_suffix() {
        let store = MemoryStore::new();
        let first = store
            .insert_profile(NewProfile {
                id: Uuid::new_v4(),
                username: "sam".into(),
                display_name: "sam".into(),
            })
            .await
            .unwrap();
        let second = store
            .insert_profile(NewProfile {
                id: Uuid::new_v4(),
                username: "sam".into(),
                display_name: "sam".into(),
            })
            .await
            .unwrap();
        assert_eq!(first.username.as_deref(), Some("sam"));
        assert_ne!(second.username, first.username);
        assert!(second.username.unwrap().starts_with("sam-"));
    }
}
