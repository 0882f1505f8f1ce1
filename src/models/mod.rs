pub mod account;
pub mod admin;
pub mod comment;
pub mod event;
pub mod interaction;
pub mod profile;
pub mod town;

pub use account::{Account, Session, UserRole};
pub use admin::{
    ActivityLog, AdminAlert, AdminStats, AdminUser, AlertSeverity, AnalyticsPoint, NewActivityLog,
    NewAlert, NewMetric, PendingEvent, PlatformSettings, SystemMetric,
};
pub use comment::{Comment, CommentAuthor, CommentWithAuthor, NewComment};
pub use event::{Coordinates, Event, EventChanges, EventStatus, NewEvent};
pub use interaction::{EventInteraction, InteractionKind};
pub use profile::{NewProfile, Profile, ProfileUpdate};
pub use town::{Town, TownSummary};
