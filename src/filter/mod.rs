//! Event list filtering: turns the browse page's filter selections into an
//! [`EventQuery`].
//!
//! Five dimensions are accepted: `find` (free-text category), `near` (town),
//! `on` (date bucket), `tags` and `category`. Sentinel options ("an event",
//! "All", "Today") and empty strings mean "no constraint". The `on` bucket is
//! parsed but never becomes a predicate; callers are told through
//! [`ComposedQuery::unapplied`] so the gap stays visible.

pub mod query;

use serde::{Deserialize, Serialize};

use crate::models::{Event, EventStatus};
use crate::taxonomy::{parse_tag_input, resolve_category, town_slug};

pub use query::{EventQuery, Predicate, SortOrder, Window};

pub const PAGE_SIZE: i64 = 12;

pub const FIND_SENTINEL: &str = "an event";
pub const NEAR_SENTINEL: &str = "All";
pub const ON_SENTINEL: &str = "Today";

/// Raw filter state as it arrives in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilters {
    pub find: Option<String>,
    pub near: Option<String>,
    pub on: Option<String>,
    /// Comma separated.
    pub tags: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    /// Client request sequence number, echoed back untouched.
    pub seq: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Today,
    ThisWeekend,
    NextWeek,
    Other,
}

impl DateBucket {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Today" => DateBucket::Today,
            "This Weekend" => DateBucket::ThisWeekend,
            "Next Week" => DateBucket::NextWeek,
            _ => DateBucket::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub query: EventQuery,
    pub page: u32,
    /// Filter dimensions the caller set that produced no predicate.
    pub unapplied: Vec<&'static str>,
}

fn selected(value: &Option<String>, sentinel: &str) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != sentinel)
        .map(str::to_string)
}

/// Maps filter state and a 1-based page to the browse query. Page 0 is
/// treated as page 1.
pub fn compose(filters: &EventFilters) -> ComposedQuery {
    let page = filters.page.unwrap_or(1).max(1);
    let mut query = EventQuery::new().filter(Predicate::Status(EventStatus::Active));
    let mut unapplied = Vec::new();

    if let Some(near) = selected(&filters.near, NEAR_SENTINEL) {
        query = query.filter(Predicate::Town(town_slug(&near)));
    }

    let category = filters
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    match (category, selected(&filters.find, FIND_SENTINEL)) {
        (Some(category), _) => query = query.filter(Predicate::Category(category)),
        (None, Some(find)) => match resolve_category(&find) {
            Some(resolved) => query = query.filter(Predicate::Category(resolved.id.to_string())),
            None => unapplied.push("find"),
        },
        (None, None) => {}
    }

    let tags = filters
        .tags
        .as_deref()
        .map(parse_tag_input)
        .unwrap_or_default();
    if !tags.is_empty() {
        query = query.filter(Predicate::TagsContain(tags));
    }

    if let Some(on) = selected(&filters.on, ON_SENTINEL) {
        // No date-range predicate exists for any bucket yet.
        tracing::debug!(bucket = ?DateBucket::parse(&on), value = %on, "date filter not applied");
        unapplied.push("on");
    }

    let offset = (i64::from(page) - 1) * PAGE_SIZE;
    let query = query
        .order_by(SortOrder::DateTimeAsc)
        .window(offset, PAGE_SIZE)
        .counted();

    ComposedQuery {
        query,
        page,
        unapplied,
    }
}

/// One page of the browse list.
#[derive(Debug, Clone, Serialize)]
pub struct EventListing {
    pub events: Vec<Event>,
    pub page: u32,
    pub page_size: i64,
    pub total: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub unapplied_filters: Vec<&'static str>,
    pub seq: Option<u64>,
}

impl EventListing {
    pub fn new(composed: &ComposedQuery, events: Vec<Event>, total: i64, seq: Option<u64>) -> Self {
        let window = composed.query.window.unwrap_or(Window {
            offset: 0,
            limit: PAGE_SIZE,
        });
        Self {
            events,
            page: composed.page,
            page_size: window.limit,
            total,
            has_next_page: total > window.end(),
            has_previous_page: composed.page > 1,
            unapplied_filters: composed.unapplied.clone(),
            seq,
        }
    }
}
