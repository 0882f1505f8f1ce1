use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::media::{LocalMediaStore, SharedMedia};
use crate::models::{AdminAlert, NewActivityLog, NewAlert};
use crate::realtime::{ChangeFeed, ChangeKind};
use crate::session::SessionProvider;
use crate::store::SharedStore;
use crate::utils::error::AppError;

/// Everything a handler can reach. Cloned per request; all fields are shared.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub sessions: SessionProvider,
    pub media: SharedMedia,
    pub feed: Arc<ChangeFeed>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: SharedStore, config: Config) -> Self {
        let media: SharedMedia = Arc::new(LocalMediaStore::new(&config.media));
        Self::with_media(store, media, config)
    }

    pub fn with_media(store: SharedStore, media: SharedMedia, config: Config) -> Self {
        Self {
            sessions: SessionProvider::new(store.clone(), config.session_ttl_hours),
            store,
            media,
            feed: Arc::new(ChangeFeed::new()),
            config: Arc::new(config),
        }
    }

    /// Writes an activity log row and announces it on the feed.
    pub async fn audit(&self, log: NewActivityLog) -> Result<(), AppError> {
        let row = self.store.insert_activity(log).await?;
        self.feed.publish("activity_logs", ChangeKind::Insert, &row);
        Ok(())
    }

    pub async fn raise_alert(&self, alert: NewAlert) -> Result<AdminAlert, AppError> {
        let row = self.store.insert_alert(alert).await?;
        self.feed.publish("admin_alerts", ChangeKind::Insert, &row);
        Ok(row)
    }

    pub fn announce<T: Serialize>(&self, table: &'static str, kind: ChangeKind, record: &T) {
        self.feed.publish(table, kind, record);
    }
}
