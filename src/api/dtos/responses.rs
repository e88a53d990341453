use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::domain::models::{event::Event, guest::Guest};

/// Admin-side view of a guest.
#[derive(Serialize)]
pub struct GuestView {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub token: String,
    pub invite_link: String,
    pub access_preset: String,
    pub event_access: Vec<String>,
    pub max_devices_allowed: i32,
    pub allowed_devices: Vec<String>,
    pub token_used_first_time: Option<DateTime<Utc>>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub rsvp_submitted: bool,
    pub rsvp_status: BTreeMap<String, String>,
    pub attendee_counts: BTreeMap<String, i32>,
    pub menu_preference: Option<String>,
    pub dietary_notes: Option<String>,
    pub preferences_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuestView {
    pub fn new(guest: Guest, config: &Config) -> Self {
        Self {
            invite_link: config.invite_link(&guest.token),
            event_access: guest.event_slugs().iter().map(|s| s.to_string()).collect(),
            allowed_devices: guest.devices(),
            rsvp_status: guest.rsvp_map(),
            attendee_counts: guest.attendee_map(),
            id: guest.id,
            name: guest.name,
            phone: guest.phone,
            email: guest.email,
            token: guest.token,
            access_preset: guest.access_preset,
            max_devices_allowed: guest.max_devices_allowed,
            token_used_first_time: guest.token_used_first_time,
            token_expires_at: guest.token_expires_at,
            rsvp_submitted: guest.rsvp_submitted,
            menu_preference: guest.menu_preference,
            dietary_notes: guest.dietary_notes,
            preferences_submitted: guest.preferences_submitted,
            created_at: guest.created_at,
            updated_at: guest.updated_at,
        }
    }
}

/// What the invitation page sees for a token. Never includes the stored
/// phone/email or other devices' fingerprints.
#[derive(Serialize)]
pub struct InvitationView {
    pub name: String,
    pub events: Vec<String>,
    pub contact_bound: bool,
    pub device_registered: bool,
    pub devices_registered: usize,
    pub max_devices_allowed: i32,
    pub rsvp_submitted: bool,
    pub rsvp_status: BTreeMap<String, String>,
    pub attendee_counts: BTreeMap<String, i32>,
    pub menu_preference: Option<String>,
    pub dietary_notes: Option<String>,
    pub preferences_submitted: bool,
    pub video_url: Option<String>,
}

impl InvitationView {
    pub fn new(guest: &Guest, fingerprint: Option<&str>, config: &Config) -> Self {
        let devices = guest.devices();
        Self {
            name: guest.name.clone(),
            events: guest.event_slugs().iter().map(|s| s.to_string()).collect(),
            contact_bound: guest.has_contact(),
            device_registered: fingerprint.is_some_and(|fp| devices.iter().any(|d| d == fp)),
            devices_registered: devices.len(),
            max_devices_allowed: guest.max_devices_allowed,
            rsvp_submitted: guest.rsvp_submitted,
            rsvp_status: guest.rsvp_map(),
            attendee_counts: guest.attendee_map(),
            menu_preference: guest.menu_preference.clone(),
            dietary_notes: guest.dietary_notes.clone(),
            preferences_submitted: guest.preferences_submitted,
            video_url: config.invitation_video_url.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct DeviceSavedResponse {
    pub already_registered: bool,
    pub devices_registered: usize,
    pub max_devices_allowed: i32,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub contact_bound: bool,
    pub first_use: bool,
}

#[derive(Serialize)]
pub struct GuestEventsResponse {
    pub events: Vec<Event>,
}

#[derive(Serialize, Default)]
pub struct EventStats {
    pub invited: usize,
    pub attending: usize,
    pub declined: usize,
    pub headcount: i64,
}

#[derive(Serialize, Default)]
pub struct StatsResponse {
    pub total_guests: usize,
    pub verified_guests: usize,
    pub rsvp_submitted: usize,
    pub preferences_submitted: usize,
    pub events: BTreeMap<String, EventStats>,
}

#[derive(Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}
