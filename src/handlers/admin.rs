//! Admin dashboard endpoints. Everything here requires [`AdminUser`] except
//! the `is-admin` check.

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::export::{events_csv, users_csv};
use crate::filter::{EventQuery, Predicate, SortOrder};
use crate::models::{
    AlertSeverity, EventStatus, NewActivityLog, NewAlert, NewMetric, UserRole,
};
use crate::realtime::ChangeKind;
use crate::session::{AdminUser, CurrentUser};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{csv_attachment, success};

const DEFAULT_LIST_LIMIT: i64 = 100;
const EXPORT_USER_LIMIT: i64 = 1000;
const HEALTH_SAMPLE_LIMIT: i64 = 100;
const DEFAULT_DAYS_BACK: i32 = 30;
const MAX_DAYS_BACK: i32 = 365;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, EXPORT_USER_LIMIT)
    }
}

#[derive(Serialize)]
struct AdminCheck {
    is_admin: bool,
}

pub async fn is_admin(user: CurrentUser) -> Response {
    success(
        AdminCheck {
            is_admin: user.is_admin(),
        },
        "Role checked",
    )
}

pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let stats = state.store.admin_stats().await?;
    Ok(success(stats, "Stats retrieved"))
}

pub async fn pending_events(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let pending = state.store.pending_events().await?;
    Ok(success(pending, "Pending events retrieved"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
}

impl ModerationAction {
    pub fn target_status(self) -> EventStatus {
        match self {
            ModerationAction::Approve => EventStatus::Active,
            ModerationAction::Reject => EventStatus::Deleted,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
        }
    }

    fn done_message(self) -> &'static str {
        match self {
            ModerationAction::Approve => "Event approved",
            ModerationAction::Reject => "Event rejected",
        }
    }
}

async fn moderate_one(
    state: &AppState,
    admin: &CurrentUser,
    id: Uuid,
    action: ModerationAction,
) -> Result<Response, AppError> {
    let event = state
        .store
        .set_event_status(id, action.target_status())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", id)))?;
    state.announce("events", ChangeKind::Update, &event);
    state
        .audit(NewActivityLog::new(action.verb(), "events").by(admin.id()).on(id))
        .await?;
    Ok(success(event, action.done_message()))
}

pub async fn approve_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AdminUser(admin): AdminUser,
) -> Result<Response, AppError> {
    moderate_one(&state, &admin, id, ModerationAction::Approve).await
}

pub async fn reject_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AdminUser(admin): AdminUser,
) -> Result<Response, AppError> {
    moderate_one(&state, &admin, id, ModerationAction::Reject).await
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub event_ids: Vec<Uuid>,
    pub action: ModerationAction,
}

#[derive(Serialize)]
struct BulkResult {
    updated: u64,
    status: EventStatus,
}

/// One store call for the whole selection. No per-row outcome is reported.
pub async fn bulk_moderate(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<BulkRequest>,
) -> Result<Response, AppError> {
    if request.event_ids.is_empty() {
        return Err(AppError::ValidationError(
            "Please select events first".to_string(),
        ));
    }

    let status = request.action.target_status();
    let updated = state
        .store
        .bulk_update_events(&request.event_ids, status)
        .await?;
    tracing::info!(
        admin = %admin.id(),
        requested = request.event_ids.len(),
        updated,
        status = %status,
        "bulk moderation"
    );

    state.announce(
        "events",
        ChangeKind::Update,
        &json!({ "ids": request.event_ids, "status": status }),
    );
    state
        .audit(
            NewActivityLog::new("bulk_update", "events")
                .by(admin.id())
                .with_details(json!({ "ids": request.event_ids, "action": request.action.verb() })),
        )
        .await?;

    Ok(success(
        BulkResult { updated, status },
        format!("{} events updated", updated),
    ))
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<LimitParams>,
) -> Result<Response, AppError> {
    let users = state.store.list_users(params.limit()).await?;
    Ok(success(users, "Users retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: UserRole,
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    AdminUser(admin): AdminUser,
    Json(request): Json<RoleRequest>,
) -> Result<Response, AppError> {
    if user_id == admin.id() && request.role != UserRole::Admin {
        return Err(AppError::ValidationError(
            "You cannot remove your own admin role".to_string(),
        ));
    }
    if !state.store.update_user_role(user_id, request.role).await? {
        return Err(AppError::NotFound(format!("User with id '{}' was not found", user_id)));
    }
    state
        .audit(
            NewActivityLog::new("role_change", "accounts")
                .by(admin.id())
                .on(user_id)
                .with_details(json!({ "role": request.role })),
        )
        .await?;
    Ok(success(
        json!({ "id": user_id, "role": request.role }),
        "Role updated",
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BanRequest {
    /// Flips the current state when absent.
    pub banned: Option<bool>,
}

pub async fn toggle_user_ban(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    AdminUser(admin): AdminUser,
    Json(request): Json<BanRequest>,
) -> Result<Response, AppError> {
    if user_id == admin.id() {
        return Err(AppError::ValidationError("You cannot ban yourself".to_string()));
    }
    let account = state
        .store
        .get_account(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id '{}' was not found", user_id)))?;
    let banned = request.banned.unwrap_or(!account.is_banned);

    state.store.set_user_ban(user_id, banned).await?;
    state
        .audit(
            NewActivityLog::new(if banned { "ban" } else { "unban" }, "accounts")
                .by(admin.id())
                .on(user_id),
        )
        .await?;
    if banned {
        state
            .raise_alert(NewAlert {
                alert_type: AlertSeverity::Warning,
                title: "User banned".to_string(),
                message: format!("{} was banned", account.email),
                entity_type: Some("user"),
                entity_id: Some(user_id),
            })
            .await?;
    }

    Ok(success(
        json!({ "id": user_id, "is_banned": banned }),
        if banned { "User banned" } else { "User unbanned" },
    ))
}

pub async fn activity_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<LimitParams>,
) -> Result<Response, AppError> {
    let logs = state.store.recent_activity(params.limit()).await?;
    Ok(success(logs, "Activity retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct AlertParams {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn alerts(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<AlertParams>,
) -> Result<Response, AppError> {
    let alerts = state.store.alerts(params.unread_only).await?;
    Ok(success(alerts, "Alerts retrieved"))
}

pub async fn mark_alert_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let alert = state
        .store
        .mark_alert_read(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Alert with id '{}' was not found", id)))?;
    state.announce("admin_alerts", ChangeKind::Update, &alert);
    Ok(success(alert, "Alert marked as read"))
}

/// Takes a fresh sample and returns the latest samples.
pub async fn system_health(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let started = Instant::now();
    state.store.ping().await?;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    let active_events = state
        .store
        .count_events(&EventQuery::new().filter(Predicate::Status(EventStatus::Active)))
        .await?;
    let total_users = state.store.admin_stats().await?.total_users;

    let samples = state
        .store
        .insert_metrics(vec![
            NewMetric {
                metric_name: "store_latency",
                metric_value: latency_ms,
                metric_unit: "ms",
            },
            NewMetric {
                metric_name: "active_events",
                metric_value: active_events as f64,
                metric_unit: "count",
            },
            NewMetric {
                metric_name: "total_users",
                metric_value: total_users as f64,
                metric_unit: "count",
            },
        ])
        .await?;
    for sample in &samples {
        state.announce("system_metrics", ChangeKind::Insert, sample);
    }

    let history = state.store.system_health(HEALTH_SAMPLE_LIMIT).await?;
    Ok(success(history, "System health retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    pub days_back: Option<i32>,
}

pub async fn analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<AnalyticsParams>,
) -> Result<Response, AppError> {
    let days_back = params
        .days_back
        .unwrap_or(DEFAULT_DAYS_BACK)
        .clamp(1, MAX_DAYS_BACK);
    let points = state
        .store
        .analytics(Utc::now().date_naive(), days_back)
        .await?;
    Ok(success(points, "Analytics retrieved"))
}

pub async fn platform_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let settings = state.store.platform_settings().await?;
    Ok(success(settings, "Settings retrieved"))
}

pub async fn export_events(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let events = state
        .store
        .fetch_events(&EventQuery::new().order_by(SortOrder::CreatedAtDesc))
        .await?
        .rows;
    let body = events_csv(&events)?;
    Ok(csv_attachment("events-export.csv", body))
}

pub async fn export_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Response, AppError> {
    let users = state.store.list_users(EXPORT_USER_LIMIT).await?;
    let body = users_csv(&users)?;
    Ok(csv_attachment("users-export.csv", body))
}

/// Server-sent stream of [`crate::realtime::Change`]s.
pub async fn change_feed(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    tracing::info!(admin = %admin.id(), "admin feed subscribed");
    let stream = BroadcastStream::new(state.feed.subscribe()).filter_map(|item| async move {
        match item {
            Ok(change) => SseEvent::default()
                .id(change.seq.to_string())
                .event(change.table)
                .json_data(&change)
                .ok()
                .map(Ok),
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::warn!(missed, "admin feed lagged, changes skipped");
                None
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_targets() {
        assert_eq!(ModerationAction::Approve.target_status(), EventStatus::Active);
        assert_eq!(ModerationAction::Reject.target_status(), EventStatus::Deleted);
    }

    #[test]
    fn bulk_request_parses_action() {
        let request: BulkRequest = serde_json::from_value(json!({
            "event_ids": [Uuid::nil()],
            "action": "approve"
        }))
        .unwrap();
        assert_eq!(request.action, ModerationAction::Approve);
        assert_eq!(request.event_ids.len(), 1);
    }

    #[test]
    fn list_limit_defaults_and_clamps() {
        assert_eq!(LimitParams { limit: None }.limit(), 100);
        assert_eq!(LimitParams { limit: Some(0) }.limit(), 1);
        assert_eq!(LimitParams { limit: Some(50_000) }.limit(), 1000);
    }
}
