use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::event::EventSlug;

pub const TOKEN_LENGTH: usize = 32;
pub const DEFAULT_MAX_DEVICES: i32 = 2;

/// Admin-facing access choice, expanded into the concrete slug list stored on the guest.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessPreset {
    All,
    WeddingReception,
}

impl AccessPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPreset::All => "all",
            AccessPreset::WeddingReception => "wedding_reception",
        }
    }

    pub fn slugs(&self) -> Vec<EventSlug> {
        match self {
            AccessPreset::All => EventSlug::ALL.to_vec(),
            AccessPreset::WeddingReception => vec![EventSlug::Wedding, EventSlug::Reception],
        }
    }
}

impl fmt::Display for AccessPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(AccessPreset::All),
            "wedding_reception" => Ok(AccessPreset::WeddingReception),
            other => Err(format!("Unknown access preset '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Attending,
    Declined,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Attending => "attending",
            RsvpStatus::Declined => "declined",
        }
    }
}

/// Guest row. List/map columns are stored as JSON text so both SQLite and
/// Postgres can hold them in a plain TEXT column.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Guest {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub token: String,
    pub access_preset: String,
    pub event_access: String,
    pub max_devices_allowed: i32,
    pub allowed_devices: String,
    pub token_used_first_time: Option<DateTime<Utc>>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub rsvp_submitted: bool,
    pub rsvp_status: String,
    pub attendee_counts: String,
    pub menu_preference: Option<String>,
    pub dietary_notes: Option<String>,
    pub preferences_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

impl Guest {
    pub fn new(name: String, preset: AccessPreset, max_devices_allowed: i32) -> Self {
        let now = Utc::now();
        let mut guest = Self {
            id: Uuid::new_v4().to_string(),
            name,
            phone: None,
            email: None,
            token: generate_token(),
            access_preset: String::new(),
            event_access: String::new(),
            max_devices_allowed,
            allowed_devices: "[]".to_string(),
            token_used_first_time: None,
            token_expires_at: None,
            rsvp_submitted: false,
            rsvp_status: "{}".to_string(),
            attendee_counts: "{}".to_string(),
            menu_preference: None,
            dietary_notes: None,
            preferences_submitted: false,
            created_at: now,
            updated_at: now,
        };
        guest.set_access_preset(preset);
        guest
    }

    pub fn set_access_preset(&mut self, preset: AccessPreset) {
        let slugs: Vec<&str> = preset.slugs().iter().map(|s| s.as_str()).collect();
        self.access_preset = preset.to_string();
        self.event_access = serde_json::to_string(&slugs).unwrap_or_else(|_| "[]".to_string());
    }

    pub fn event_slugs(&self) -> Vec<EventSlug> {
        let raw: Vec<String> = serde_json::from_str(&self.event_access).unwrap_or_default();
        raw.iter().filter_map(|s| s.parse().ok()).collect()
    }

    pub fn can_access(&self, slug: EventSlug) -> bool {
        self.event_slugs().contains(&slug)
    }

    pub fn devices(&self) -> Vec<String> {
        serde_json::from_str(&self.allowed_devices).unwrap_or_default()
    }

    pub fn set_devices(&mut self, devices: &[String]) {
        self.allowed_devices = serde_json::to_string(devices).unwrap_or_else(|_| "[]".to_string());
    }

    pub fn has_device(&self, fingerprint: &str) -> bool {
        self.devices().iter().any(|d| d == fingerprint)
    }

    /// Lowers or raises the cap. Lowering keeps the earliest registered devices.
    pub fn set_max_devices(&mut self, max: i32) {
        self.max_devices_allowed = max;
        let mut devices = self.devices();
        let cap = max.max(0) as usize;
        if devices.len() > cap {
            devices.truncate(cap);
            self.set_devices(&devices);
        }
    }

    pub fn has_contact(&self) -> bool {
        self.phone.is_some() || self.email.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at.is_some_and(|exp| exp < now)
    }

    pub fn mark_used(&mut self, now: DateTime<Utc>) {
        if self.token_used_first_time.is_none() {
            self.token_used_first_time = Some(now);
        }
    }

    /// Issues a fresh token and forgets every device bound to the old one.
    pub fn regenerate_token(&mut self) {
        self.token = generate_token();
        self.set_devices(&[]);
        self.token_used_first_time = None;
        self.updated_at = Utc::now();
    }

    pub fn rsvp_map(&self) -> BTreeMap<String, String> {
        serde_json::from_str(&self.rsvp_status).unwrap_or_default()
    }

    pub fn attendee_map(&self) -> BTreeMap<String, i32> {
        serde_json::from_str(&self.attendee_counts).unwrap_or_default()
    }

    pub fn record_rsvp(&mut self, responses: &BTreeMap<EventSlug, (RsvpStatus, i32)>) {
        let mut statuses = self.rsvp_map();
        let mut counts = self.attendee_map();
        for (slug, (status, attendees)) in responses {
            statuses.insert(slug.to_string(), status.as_str().to_string());
            counts.insert(slug.to_string(), *attendees);
        }
        self.rsvp_status = serde_json::to_string(&statuses).unwrap_or_else(|_| "{}".to_string());
        self.attendee_counts = serde_json::to_string(&counts).unwrap_or_else(|_| "{}".to_string());
        self.rsvp_submitted = true;
        self.updated_at = Utc::now();
    }
}
