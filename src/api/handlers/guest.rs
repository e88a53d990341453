use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AdminSession, json::ValidJson};
use crate::api::dtos::{
    requests::{BulkDeleteRequest, CreateGuestRequest, UpdateGuestRequest},
    responses::{BulkDeleteResponse, EventStats, GuestView, StatsResponse},
};
use crate::domain::models::guest::{Guest, DEFAULT_MAX_DEVICES};
use crate::domain::services::guest_access::{normalize_email, normalize_phone};
use crate::error::AppError;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Deserialize)]
pub struct ListGuestsParams {
    pub search: Option<String>,
}

/// `Some("")` clears, `Some(v)` sets normalized, `None` leaves as-is.
fn apply_contact(field: &mut Option<String>, value: Option<String>, normalize: fn(&str) -> String) {
    if let Some(v) = value {
        *field = if v.trim().is_empty() { None } else { Some(normalize(&v)) };
    }
}

async fn load_guest(state: &AppState, guest_id: &str) -> Result<Guest, AppError> {
    state.guest_repo.find_by_id(guest_id).await?
        .ok_or(AppError::NotFound("Guest not found".into()))
}

/// A guest registering a device between the admin's read and write gets a 409
/// instead of having the new device silently dropped.
async fn save_unless_devices_changed(state: &AppState, guest: &Guest, expected_devices: &str) -> Result<Guest, AppError> {
    match state.guest_repo.update_if_devices(guest, expected_devices).await? {
        Some(updated) => Ok(updated),
        None => {
            warn!(guest_id = %guest.id, "Guest devices changed during admin edit");
            Err(AppError::Conflict("The guest registered a device meanwhile, reload and retry".into()))
        }
    }
}

pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Query(params): Query<ListGuestsParams>,
) -> Result<impl IntoResponse, AppError> {
    let guests = state.guest_repo.list(params.search.as_deref()).await?;
    let views: Vec<GuestView> = guests.into_iter()
        .map(|g| GuestView::new(g, &state.config))
        .collect();
    Ok(Json(views))
}

pub async fn get_guest(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(guest_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let guest = load_guest(&state, &guest_id).await?;
    Ok(Json(GuestView::new(guest, &state.config)))
}

pub async fn create_guest(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(payload): ValidJson<CreateGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut guest = Guest::new(
        payload.name.trim().to_string(),
        payload.access_preset,
        payload.max_devices_allowed.unwrap_or(DEFAULT_MAX_DEVICES),
    );
    apply_contact(&mut guest.phone, payload.phone, normalize_phone);
    apply_contact(&mut guest.email, payload.email, normalize_email);
    guest.token_expires_at = payload.token_expires_at;

    let created = state.guest_repo.create(&guest).await?;
    info!("Created guest {} ({})", created.id, created.access_preset);

    Ok(Json(GuestView::new(created, &state.config)))
}

pub async fn update_guest(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(guest_id): Path<String>,
    ValidJson(payload): ValidJson<UpdateGuestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut guest = load_guest(&state, &guest_id).await?;
    let expected_devices = guest.allowed_devices.clone();

    if let Some(name) = payload.name {
        guest.name = name.trim().to_string();
    }
    apply_contact(&mut guest.phone, payload.phone, normalize_phone);
    apply_contact(&mut guest.email, payload.email, normalize_email);
    if let Some(preset) = payload.access_preset {
        guest.set_access_preset(preset);
    }
    if let Some(max) = payload.max_devices_allowed {
        guest.set_max_devices(max);
    }
    if payload.clear_token_expiry {
        guest.token_expires_at = None;
    } else if let Some(expires_at) = payload.token_expires_at {
        guest.token_expires_at = Some(expires_at);
    }
    guest.updated_at = Utc::now();

    let updated = save_unless_devices_changed(&state, &guest, &expected_devices).await?;
    info!("Updated guest: {}", guest_id);
    Ok(Json(GuestView::new(updated, &state.config)))
}

pub async fn delete_guest(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(guest_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.guest_repo.delete(&guest_id).await?;
    info!("Deleted guest: {}", guest_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn bulk_delete_guests(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(payload): ValidJson<BulkDeleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.guest_repo.delete_many(&payload.ids).await?;
    info!(requested = payload.ids.len(), deleted, "Bulk deleted guests");
    Ok(Json(BulkDeleteResponse { deleted }))
}

pub async fn regenerate_token(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(guest_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut guest = load_guest(&state, &guest_id).await?;
    let expected_devices = guest.allowed_devices.clone();
    guest.regenerate_token();

    let updated = save_unless_devices_changed(&state, &guest, &expected_devices).await?;
    info!("Regenerated token for guest {}", guest_id);
    Ok(Json(GuestView::new(updated, &state.config)))
}

pub async fn guest_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    let guests = state.guest_repo.list(None).await?;
    let mut stats = StatsResponse { total_guests: guests.len(), ..Default::default() };

    for guest in &guests {
        if guest.token_used_first_time.is_some() {
            stats.verified_guests += 1;
        }
        if guest.rsvp_submitted {
            stats.rsvp_submitted += 1;
        }
        if guest.preferences_submitted {
            stats.preferences_submitted += 1;
        }

        let statuses = guest.rsvp_map();
        let counts = guest.attendee_map();
        for slug in guest.event_slugs() {
            let entry: &mut EventStats = stats.events.entry(slug.to_string()).or_default();
            entry.invited += 1;
            match statuses.get(slug.as_str()).map(String::as_str) {
                Some("attending") => {
                    entry.attending += 1;
                    entry.headcount += i64::from(counts.get(slug.as_str()).copied().unwrap_or(1));
                }
                Some("declined") => entry.declined += 1,
                _ => {}
            }
        }
    }

    Ok(Json(stats))
}
