//! Change notifications for the admin dashboard.
//!
//! Every write to the admin tables, and every event status flip, is published
//! on a broadcast channel. Receivers that fall behind lose the skipped
//! changes; there is no replay.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

#[derive(Debug, Clone, Serialize)]
pub struct Change {
    pub seq: u64,
    pub table: &'static str,
    pub kind: ChangeKind,
    pub record: Value,
    pub at: DateTime<Utc>,
}

pub struct ChangeFeed {
    tx: broadcast::Sender<Change>,
    seq: AtomicU64,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            tx,
            seq: AtomicU64::new(1),
        }
    }

    /// Serializes `record` and publishes it. Nobody listening is not an error.
    pub fn publish<T: Serialize>(&self, table: &'static str, kind: ChangeKind, record: &T) -> Change {
        let record = serde_json::to_value(record).unwrap_or(Value::Null);
        let change = Change {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            table,
            kind,
            record,
            at: Utc::now(),
        };
        if self.tx.send(change.clone()).is_err() {
            tracing::trace!(table, seq = change.seq, "change dropped, no subscribers");
        }
        change
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscribers_see_changes_in_order() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        feed.publish("admin_alerts", ChangeKind::Insert, &json!({ "title": "a" }));
        feed.publish("events", ChangeKind::Update, &json!({ "status": "active" }));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.table, "admin_alerts");
        assert_eq!(second.table, "events");
        assert!(second.seq > first.seq);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let feed = ChangeFeed::new();
        let change = feed.publish("system_metrics", ChangeKind::Insert, &json!({}));
        assert_eq!(change.seq, 1);
    }
}
