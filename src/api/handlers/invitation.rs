use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{client::{ClientIp, DeviceFingerprint}, json::ValidJson};
use crate::api::dtos::{
    requests::{PreferencesRequest, RsvpRequest, SaveDeviceRequest, VerifyContactRequest},
    responses::{DeviceSavedResponse, GuestEventsResponse, InvitationView, VerifyResponse},
};
use crate::domain::models::event::EventSlug;
use crate::domain::services::guest_access::{DeviceRegistration, Verification};
use crate::error::AppError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

fn throttle(state: &AppState, ip: &str, route: &str) -> Result<(), AppError> {
    state.rate_limiter.check(&format!("{}:{}", ip, route), &state.config.guest_rate_limit)
}

pub async fn get_invitation(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    DeviceFingerprint(fingerprint): DeviceFingerprint,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    throttle(&state, &ip, "invite")?;
    let guest = state.guest_access.load_active(&token).await?;
    Ok(Json(InvitationView::new(&guest, fingerprint.as_deref(), &state.config)))
}

pub async fn verify_contact(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(token): Path<String>,
    ValidJson(payload): ValidJson<VerifyContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    throttle(&state, &ip, "verify")?;
    let (_, outcome, first_use) = state.guest_access.verify(&token, &payload.contact).await?;
    Ok(Json(VerifyResponse {
        verified: true,
        contact_bound: outcome == Verification::Bound,
        first_use,
    }))
}

pub async fn save_device(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Path(token): Path<String>,
    ValidJson(payload): ValidJson<SaveDeviceRequest>,
) -> Result<impl IntoResponse, AppError> {
    throttle(&state, &ip, "device")?;
    let (guest, outcome) = state.guest_access
        .save_device(&token, &payload.contact, &payload.fingerprint)
        .await?;

    Ok(Json(DeviceSavedResponse {
        already_registered: outcome == DeviceRegistration::AlreadyRegistered,
        devices_registered: guest.devices().len(),
        max_devices_allowed: guest.max_devices_allowed,
    }))
}

pub async fn list_guest_events(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    DeviceFingerprint(fingerprint): DeviceFingerprint,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    throttle(&state, &ip, "events")?;
    let guest = state.guest_access.load_for_device(&token, fingerprint.as_deref()).await?;

    let allowed = guest.event_slugs();
    let events = state.event_repo.list().await?
        .into_iter()
        .filter(|e| e.slug.parse::<EventSlug>().is_ok_and(|slug| allowed.contains(&slug)))
        .collect();

    Ok(Json(GuestEventsResponse { events }))
}

pub async fn submit_rsvp(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    DeviceFingerprint(fingerprint): DeviceFingerprint,
    Path(token): Path<String>,
    ValidJson(payload): ValidJson<RsvpRequest>,
) -> Result<impl IntoResponse, AppError> {
    throttle(&state, &ip, "rsvp")?;
    let responses: BTreeMap<_, _> = payload.responses.iter()
        .map(|(slug, entry)| (*slug, (entry.status, entry.headcount())))
        .collect();

    let updated = state.guest_access.update_for_device(&token, fingerprint.as_deref(), |guest| {
        if let Some(slug) = responses.keys().find(|slug| !guest.can_access(**slug)) {
            return Err(AppError::Validation(format!("You are not invited to the {} event", slug)));
        }
        guest.record_rsvp(&responses);
        Ok(())
    }).await?;
    info!(guest_id = %updated.id, "RSVP submitted");
    Ok(Json(InvitationView::new(&updated, fingerprint.as_deref(), &state.config)))
}

pub async fn submit_preferences(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    DeviceFingerprint(fingerprint): DeviceFingerprint,
    Path(token): Path<String>,
    ValidJson(payload): ValidJson<PreferencesRequest>,
) -> Result<impl IntoResponse, AppError> {
    throttle(&state, &ip, "preferences")?;
    let dietary_notes = payload.dietary_notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let updated = state.guest_access.update_for_device(&token, fingerprint.as_deref(), |guest| {
        guest.menu_preference = Some(payload.menu_preference.as_str().to_string());
        guest.dietary_notes = dietary_notes.clone();
        guest.preferences_submitted = true;
        Ok(())
    }).await?;
    info!(guest_id = %updated.id, "Preferences submitted");
    Ok(Json(InvitationView::new(&updated, fingerprint.as_deref(), &state.config)))
}
