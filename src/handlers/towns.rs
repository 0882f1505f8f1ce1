use axum::extract::{Path, State};
use axum::response::Response;
use chrono::Utc;

use crate::filter::query::town_count_query;
use crate::models::{Town, TownSummary};
use crate::state::AppState;
use crate::taxonomy::{is_popular_town, town_slug};
use crate::utils::error::AppError;
use crate::utils::response::success;

async fn summarize(state: &AppState, town: Town) -> Result<TownSummary, AppError> {
    let event_count = state
        .store
        .count_events(&town_count_query(&town.slug, Utc::now()))
        .await?;
    Ok(TownSummary {
        is_popular: is_popular_town(&town.slug),
        slug: town.slug,
        name: town.name,
        event_count,
    })
}

pub async fn list_towns(State(state): State<AppState>) -> Result<Response, AppError> {
    let mut summaries = Vec::new();
    for town in state.store.list_towns().await? {
        summaries.push(summarize(&state, town).await?);
    }
    Ok(success(summaries, "Towns retrieved"))
}

pub async fn get_town(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let town = state
        .store
        .get_town(&town_slug(&slug))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Town '{}' was not found", slug)))?;
    let summary = summarize(&state, town).await?;
    Ok(success(summary, "Town retrieved"))
}
