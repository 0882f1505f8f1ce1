use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::EventStatus;

/// A single condition on the `events` table.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Status(EventStatus),
    StatusIn(Vec<EventStatus>),
    Town(String),
    Category(String),
    /// Row tags must be a superset of these.
    TagsContain(Vec<String>),
    Creator(Uuid),
    NotId(Uuid),
    StartsAfter(DateTime<Utc>),
    /// Case-insensitive substring over title, description and location.
    TextMatch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    DateTimeAsc,
    CreatedAtDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl Window {
    pub fn end(&self) -> i64 {
        self.offset + self.limit
    }
}

/// Store-independent description of an `events` read. Built by the composer
/// functions below and translated by each store.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub predicates: Vec<Predicate>,
    pub order: SortOrder,
    pub window: Option<Window>,
    pub with_total: bool,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            order: SortOrder::DateTimeAsc,
            window: None,
            with_total: false,
        }
    }
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        let offset = self.window.map(|w| w.offset).unwrap_or(0);
        self.window = Some(Window { offset, limit });
        self
    }

    pub fn window(mut self, offset: i64, limit: i64) -> Self {
        self.window = Some(Window { offset, limit });
        self
    }

    pub fn counted(mut self) -> Self {
        self.with_total = true;
        self
    }

    pub fn has(&self, predicate: &Predicate) -> bool {
        self.predicates.contains(predicate)
    }

    /// The town equality predicate, if any.
    pub fn town(&self) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Town(town) => Some(town.as_str()),
            _ => None,
        })
    }
}

pub const SEARCH_LIMIT: i64 = 20;
pub const RELATED_LIMIT: i64 = 4;
pub const UPCOMING_LIMIT: i64 = 5;
pub const RECENT_LIMIT: i64 = 10;

/// Active events whose text fields contain `term`.
pub fn search_query(term: &str) -> EventQuery {
    EventQuery::new()
        .filter(Predicate::Status(EventStatus::Active))
        .filter(Predicate::TextMatch(term.trim().to_string()))
        .order_by(SortOrder::DateTimeAsc)
        .limit(SEARCH_LIMIT)
}

/// Other events in the same town, soonest first.
pub fn related_query(event_id: Uuid, town: Option<&str>) -> EventQuery {
    let mut query = EventQuery::new()
        .filter(Predicate::Status(EventStatus::Active))
        .filter(Predicate::NotId(event_id));
    if let Some(town) = town {
        query = query.filter(Predicate::Town(town.to_string()));
    }
    query.order_by(SortOrder::DateTimeAsc).limit(RELATED_LIMIT)
}

pub fn upcoming_query(town: Option<&str>, now: DateTime<Utc>) -> EventQuery {
    let mut query = EventQuery::new()
        .filter(Predicate::Status(EventStatus::Active))
        .filter(Predicate::StartsAfter(now));
    if let Some(town) = town {
        query = query.filter(Predicate::Town(town.to_string()));
    }
    query.order_by(SortOrder::DateTimeAsc).limit(UPCOMING_LIMIT)
}

/// Everything a creator submitted that has not been deleted, newest first.
pub fn creator_query(creator_id: Uuid) -> EventQuery {
    EventQuery::new()
        .filter(Predicate::Creator(creator_id))
        .filter(Predicate::StatusIn(vec![
            EventStatus::Active,
            EventStatus::Draft,
            EventStatus::Published,
        ]))
        .order_by(SortOrder::CreatedAtDesc)
}

pub fn recent_query(limit: i64) -> EventQuery {
    EventQuery::new()
        .order_by(SortOrder::CreatedAtDesc)
        .limit(limit)
}

/// Active events in `town` that have not started yet.
pub fn town_count_query(town: &str, now: DateTime<Utc>) -> EventQuery {
    EventQuery::new()
        .filter(Predicate::Town(town.to_string()))
        .filter(Predicate::Status(EventStatus::Active))
        .filter(Predicate::StartsAfter(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_excludes_current_event() {
        let id = Uuid::new_v4();
        let query = related_query(id, Some("timmins"));
        assert!(query.has(&Predicate::NotId(id)));
        assert_eq!(query.town(), Some("timmins"));
        assert_eq!(query.window, Some(Window { offset: 0, limit: 4 }));
    }

    #[test]
    fn related_without_town_has_no_town_predicate() {
        let query = related_query(Uuid::new_v4(), None);
        assert_eq!(query.town(), None);
    }

    #[test]
    fn search_hides_unmoderated_rows() {
        let query = search_query("  market ");
        assert!(query.has(&Predicate::Status(EventStatus::Active)));
        assert!(query.has(&Predicate::TextMatch("market".into())));
        assert_eq!(query.window, Some(Window { offset: 0, limit: 20 }));
    }

    #[test]
    fn creator_listing_is_newest_first() {
        let query = creator_query(Uuid::new_v4());
        assert_eq!(query.order, SortOrder::CreatedAtDesc);
        assert!(query.window.is_none());
    }
}
