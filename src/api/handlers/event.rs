use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AdminSession, json::ValidJson};
use crate::api::dtos::requests::UpsertEventRequest;
use crate::domain::models::event::{Event, EventSlug};
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

fn parse_slug(raw: &str) -> Result<EventSlug, AppError> {
    raw.parse().map_err(|_| AppError::NotFound("Event not found".into()))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_repo.list().await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let slug = parse_slug(&slug)?;
    let event = state.event_repo.find_by_slug(slug.as_str()).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;
    Ok(Json(event))
}

pub async fn upsert_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(slug): Path<String>,
    ValidJson(payload): ValidJson<UpsertEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let slug = parse_slug(&slug)?;

    let mut event = match state.event_repo.find_by_slug(slug.as_str()).await? {
        Some(existing) => existing,
        None => Event::new(slug, String::new(), String::new()),
    };

    event.title = payload.title.trim().to_string();
    event.description = payload.description.unwrap_or_default();
    event.event_date = blank_to_none(payload.date);
    event.event_time = blank_to_none(payload.time);
    event.venue = blank_to_none(payload.venue);
    event.address = blank_to_none(payload.address);
    event.dress_code = blank_to_none(payload.dress_code);
    event.map_embed_url = blank_to_none(payload.map_embed_url);
    event.updated_at = Utc::now();

    let saved = state.event_repo.upsert(&event).await?;
    info!("Saved event {}", slug);
    Ok(Json(saved))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let slug = parse_slug(&slug)?;
    state.event_repo.delete(slug.as_str()).await?;
    info!("Deleted event {}", slug);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
