use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::state::AppState;
use crate::utils::response::success;

pub mod admin;
pub mod auth;
pub mod comments;
pub mod diagnostics;
pub mod events;
pub mod favorites;
pub mod media;
pub mod profiles;
pub mod taxonomy;
pub mod towns;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    store: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    let store = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            "unreachable"
        }
    };
    let payload = HealthPayload {
        status: if store == "ok" { "ok" } else { "degraded" },
        service: "townloop-api",
        store,
    };

    success(payload, "Health check successful")
}
