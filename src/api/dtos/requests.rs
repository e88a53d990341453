use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::{
    event::EventSlug,
    guest::{AccessPreset, RsvpStatus},
};
use crate::domain::services::guest_access::{is_valid_email, is_valid_phone};
use crate::error::FieldError;

pub const MAX_DEVICES_CAP: i32 = 10;
pub const MAX_ATTENDEES: i32 = 10;
pub const MAX_BULK_IDS: usize = 500;

/// Field-level checks run by the `ValidJson` extractor after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

#[derive(Default)]
struct Errors(Vec<FieldError>);

impl Errors {
    fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
    }

    fn required(&mut self, value: &str, field: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.0.push(FieldError::new(field, "is required"));
        } else if value.chars().count() > max_len {
            self.0.push(FieldError::new(field, format!("must be at most {} characters", max_len)));
        }
    }

    fn max_len(&mut self, value: Option<&str>, field: &str, max_len: usize) {
        if let Some(v) = value
            && v.chars().count() > max_len
        {
            self.0.push(FieldError::new(field, format!("must be at most {} characters", max_len)));
        }
    }

    fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() { Ok(()) } else { Err(self.0) }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.required(&self.email, "email", 254);
        errors.required(&self.password, "password", 256);
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
}

impl Validate for CreateAdminRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.check(is_valid_email(&self.email), "email", "must be a valid email address");
        errors.check(self.password.chars().count() >= 8, "password", "must be at least 8 characters");
        errors.max_len(Some(&self.password), "password", 256);
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct UpsertEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub dress_code: Option<String>,
    pub map_embed_url: Option<String>,
}

impl Validate for UpsertEventRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.required(&self.title, "title", 200);
        errors.max_len(self.description.as_deref(), "description", 5000);
        errors.max_len(self.venue.as_deref(), "venue", 200);
        errors.max_len(self.address.as_deref(), "address", 500);
        errors.max_len(self.dress_code.as_deref(), "dress_code", 200);
        if let Some(url) = non_blank(&self.map_embed_url) {
            errors.check(url.starts_with("https://"), "map_embed_url", "must be an https URL");
        }
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct CreateGuestRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub access_preset: AccessPreset,
    pub max_devices_allowed: Option<i32>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl Validate for CreateGuestRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.required(&self.name, "name", 100);
        validate_contact_fields(&mut errors, &self.phone, &self.email);
        if let Some(max) = self.max_devices_allowed {
            errors.check((1..=MAX_DEVICES_CAP).contains(&max), "max_devices_allowed", "must be between 1 and 10");
        }
        errors.finish()
    }
}

/// Partial update. An empty `phone`/`email` string clears the stored value.
#[derive(Deserialize)]
pub struct UpdateGuestRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub access_preset: Option<AccessPreset>,
    pub max_devices_allowed: Option<i32>,
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_token_expiry: bool,
}

impl Validate for UpdateGuestRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        if let Some(name) = &self.name {
            errors.required(name, "name", 100);
        }
        validate_contact_fields(&mut errors, &self.phone, &self.email);
        if let Some(max) = self.max_devices_allowed {
            errors.check((1..=MAX_DEVICES_CAP).contains(&max), "max_devices_allowed", "must be between 1 and 10");
        }
        errors.finish()
    }
}

fn validate_contact_fields(errors: &mut Errors, phone: &Option<String>, email: &Option<String>) {
    if let Some(phone) = non_blank(phone) {
        errors.check(is_valid_phone(phone), "phone", "must contain 7 to 15 digits");
    }
    if let Some(email) = non_blank(email) {
        errors.check(is_valid_email(email), "email", "must be a valid email address");
    }
}

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

impl Validate for BulkDeleteRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.check(!self.ids.is_empty(), "ids", "must not be empty");
        errors.check(self.ids.len() <= MAX_BULK_IDS, "ids", "too many ids");
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct VerifyContactRequest {
    #[serde(alias = "phone_or_email")]
    pub contact: String,
}

impl Validate for VerifyContactRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.required(&self.contact, "contact", 254);
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct SaveDeviceRequest {
    #[serde(alias = "phone_or_email")]
    pub contact: String,
    pub fingerprint: String,
}

impl Validate for SaveDeviceRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.required(&self.contact, "contact", 254);
        errors.required(&self.fingerprint, "fingerprint", 256);
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct RsvpEntry {
    pub status: RsvpStatus,
    pub attendees: Option<i32>,
}

impl RsvpEntry {
    pub fn headcount(&self) -> i32 {
        match self.status {
            RsvpStatus::Attending => self.attendees.unwrap_or(1),
            RsvpStatus::Declined => 0,
        }
    }
}

#[derive(Deserialize)]
pub struct RsvpRequest {
    pub responses: BTreeMap<EventSlug, RsvpEntry>,
}

impl Validate for RsvpRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.check(!self.responses.is_empty(), "responses", "must include at least one event");
        for (slug, entry) in &self.responses {
            if entry.status == RsvpStatus::Attending {
                errors.check(
                    (1..=MAX_ATTENDEES).contains(&entry.headcount()),
                    &format!("responses.{}.attendees", slug),
                    "must be between 1 and 10",
                );
            }
        }
        errors.finish()
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MenuPreference {
    Veg,
    NonVeg,
    Vegan,
    Jain,
}

impl MenuPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuPreference::Veg => "veg",
            MenuPreference::NonVeg => "non_veg",
            MenuPreference::Vegan => "vegan",
            MenuPreference::Jain => "jain",
        }
    }
}

#[derive(Deserialize)]
pub struct PreferencesRequest {
    pub menu_preference: MenuPreference,
    pub dietary_notes: Option<String>,
}

impl Validate for PreferencesRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.max_len(self.dietary_notes.as_deref(), "dietary_notes", 500);
        errors.finish()
    }
}

#[derive(Deserialize, Default)]
pub struct SendInvitationsRequest {
    /// All guests when absent.
    pub guest_ids: Option<Vec<String>>,
}

impl Validate for SendInvitationsRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        if let Some(ids) = &self.guest_ids {
            errors.check(ids.len() <= MAX_BULK_IDS, "guest_ids", "too many ids");
        }
        errors.finish()
    }
}

#[derive(Deserialize)]
pub struct CustomEmailRequest {
    pub guest_ids: Vec<String>,
    pub subject: String,
    pub message: String,
}

impl Validate for CustomEmailRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Errors::default();
        errors.check(!self.guest_ids.is_empty(), "guest_ids", "must not be empty");
        errors.check(self.guest_ids.len() <= MAX_BULK_IDS, "guest_ids", "too many ids");
        errors.required(&self.subject, "subject", 200);
        errors.required(&self.message, "message", 5000);
        errors.finish()
    }
}
