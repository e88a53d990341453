//! Token verification and device binding for guest invitation links.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::domain::{models::guest::Guest, ports::GuestRepository};
use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;
pub const MAX_FINGERPRINT_LEN: usize = 256;
const WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Phone(String),
    Email(String),
}

impl Contact {
    pub fn kind(&self) -> &'static str {
        match self {
            Contact::Phone(_) => "phone",
            Contact::Email(_) => "email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// First submission, value stored on the guest.
    Bound,
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRegistration {
    AlreadyRegistered,
    Registered,
}

pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_RE.is_match(raw.trim())
}

pub fn is_valid_phone(raw: &str) -> bool {
    let digits = normalize_phone(raw).len();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}

/// Anything with an `@` must be an email; otherwise the digit count decides.
pub fn classify_contact(raw: &str) -> Result<Contact, AppError> {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        if is_valid_email(trimmed) {
            return Ok(Contact::Email(normalize_email(trimmed)));
        }
        return Err(AppError::Validation("Invalid email address".into()));
    }

    if is_valid_phone(trimmed) {
        return Ok(Contact::Phone(normalize_phone(trimmed)));
    }

    Err(AppError::Validation("Enter a valid phone number or email address".into()))
}

pub fn ensure_active(guest: &Guest, now: DateTime<Utc>) -> Result<(), AppError> {
    if guest.is_expired(now) {
        return Err(AppError::Forbidden("This invitation link has expired".into()));
    }
    Ok(())
}

pub fn validate_fingerprint(raw: &str) -> Result<&str, AppError> {
    let fingerprint = raw.trim();
    if fingerprint.is_empty() || fingerprint.len() > MAX_FINGERPRINT_LEN {
        return Err(AppError::Validation("Invalid device fingerprint".into()));
    }
    Ok(fingerprint)
}

/// Binds the contact on first use, otherwise requires it to match what is stored.
pub fn verify_contact(guest: &mut Guest, contact: &Contact, now: DateTime<Utc>) -> Result<Verification, AppError> {
    let outcome = if !guest.has_contact() {
        match contact {
            Contact::Phone(phone) => guest.phone = Some(phone.clone()),
            Contact::Email(email) => guest.email = Some(email.clone()),
        }
        Verification::Bound
    } else {
        let stored = match contact {
            Contact::Phone(_) => guest.phone.as_deref().map(normalize_phone),
            Contact::Email(_) => guest.email.as_deref().map(normalize_email),
        };
        let submitted = match contact {
            Contact::Phone(v) | Contact::Email(v) => v.as_str(),
        };
        if stored.as_deref() != Some(submitted) {
            return Err(AppError::Forbidden(format!(
                "This {} does not match the one registered for this invitation",
                contact.kind()
            )));
        }
        Verification::Matched
    };

    guest.mark_used(now);
    Ok(outcome)
}

pub fn register_device(guest: &mut Guest, fingerprint: &str, now: DateTime<Utc>) -> Result<DeviceRegistration, AppError> {
    let mut devices = guest.devices();
    if devices.iter().any(|d| d == fingerprint) {
        return Ok(DeviceRegistration::AlreadyRegistered);
    }

    if devices.len() >= guest.max_devices_allowed.max(0) as usize {
        return Err(AppError::Forbidden(format!(
            "Device limit reached ({} allowed)",
            guest.max_devices_allowed
        )));
    }

    devices.push(fingerprint.to_string());
    guest.set_devices(&devices);
    guest.mark_used(now);
    Ok(DeviceRegistration::Registered)
}

pub struct GuestAccessService {
    repo: Arc<dyn GuestRepository>,
}

impl GuestAccessService {
    pub fn new(repo: Arc<dyn GuestRepository>) -> Self {
        Self { repo }
    }

    /// Resolves a token to a guest whose link has not expired.
    pub async fn load_active(&self, token: &str) -> Result<Guest, AppError> {
        let guest = self.repo.find_by_token(token).await?
            .ok_or(AppError::NotFound("Invitation not found".into()))?;
        ensure_active(&guest, Utc::now())?;
        Ok(guest)
    }

    /// Like `load_active`, but also requires the calling device to be registered.
    pub async fn load_for_device(&self, token: &str, fingerprint: Option<&str>) -> Result<Guest, AppError> {
        let guest = self.load_active(token).await?;
        match fingerprint {
            Some(fp) if guest.has_device(fp.trim()) => Ok(guest),
            _ => Err(AppError::Forbidden("This device is not registered for this invitation".into())),
        }
    }

    /// Reload, mutate, conditional write. Retries when a concurrent request
    /// changed the device list between the read and the write.
    async fn write_guarded<T>(
        &self,
        token: &str,
        fingerprint: Option<&str>,
        mut apply: impl FnMut(&mut Guest) -> Result<(T, bool), AppError>,
    ) -> Result<(Guest, T), AppError> {
        for attempt in 1..=WRITE_ATTEMPTS {
            let mut guest = match fingerprint {
                Some(fp) => self.load_for_device(token, Some(fp)).await?,
                None => self.load_active(token).await?,
            };
            let expected = guest.allowed_devices.clone();

            let (value, dirty) = apply(&mut guest)?;
            if !dirty {
                return Ok((guest, value));
            }

            guest.updated_at = Utc::now();
            if let Some(saved) = self.repo.update_if_devices(&guest, &expected).await? {
                return Ok((saved, value));
            }
            debug!(guest_id = %guest.id, attempt, "Device list changed during write, retrying");
        }

        warn!(attempts = WRITE_ATTEMPTS, "Gave up on contended guest write");
        Err(AppError::Conflict("The invitation was updated concurrently, please retry".into()))
    }

    /// Returns the guest, the outcome, and whether this call stamped the first-use time.
    pub async fn verify(&self, token: &str, raw_contact: &str) -> Result<(Guest, Verification, bool), AppError> {
        let contact = classify_contact(raw_contact)?;

        let (guest, (outcome, first_use)) = self.write_guarded(token, None, |guest| {
            let first_use = guest.token_used_first_time.is_none();
            let outcome = verify_contact(guest, &contact, Utc::now()).inspect_err(|_| {
                warn!(guest_id = %guest.id, kind = contact.kind(), "Contact mismatch on verification");
            })?;
            let dirty = outcome == Verification::Bound || first_use;
            Ok(((outcome, first_use), dirty))
        }).await?;

        info!(guest_id = %guest.id, ?outcome, "Guest verified");
        Ok((guest, outcome, first_use))
    }

    pub async fn save_device(&self, token: &str, raw_contact: &str, raw_fingerprint: &str) -> Result<(Guest, DeviceRegistration), AppError> {
        let fingerprint = validate_fingerprint(raw_fingerprint)?;
        let contact = classify_contact(raw_contact)?;

        let (guest, outcome) = self.write_guarded(token, None, |guest| {
            let now = Utc::now();
            let had_first_use = guest.token_used_first_time.is_some();
            let verification = verify_contact(guest, &contact, now)?;
            let registration = register_device(guest, fingerprint, now).inspect_err(|_| {
                warn!(guest_id = %guest.id, "Device limit reached");
            })?;
            let dirty = registration == DeviceRegistration::Registered
                || verification == Verification::Bound
                || !had_first_use;
            Ok((registration, dirty))
        }).await?;

        info!(guest_id = %guest.id, ?outcome, devices = guest.devices().len(), "Device saved");
        Ok((guest, outcome))
    }

    /// Applies a guest-side edit from a registered device.
    pub async fn update_for_device(
        &self,
        token: &str,
        fingerprint: Option<&str>,
        mut apply: impl FnMut(&mut Guest) -> Result<(), AppError>,
    ) -> Result<Guest, AppError> {
        let fingerprint = fingerprint
            .ok_or(AppError::Forbidden("This device is not registered for this invitation".into()))?;
        let (guest, ()) = self.write_guarded(token, Some(fingerprint), |guest| {
            apply(guest)?;
            Ok(((), true))
        }).await?;
        Ok(guest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::guest::AccessPreset;

    fn guest(max_devices: i32) -> Guest {
        Guest::new("Meera".into(), AccessPreset::All, max_devices)
    }

    #[test]
    fn test_classify_contact() {
        assert_eq!(classify_contact("+91 98765-43210").unwrap(), Contact::Phone("919876543210".into()));
        assert_eq!(classify_contact("  Meera@Example.COM ").unwrap(), Contact::Email("meera@example.com".into()));
        assert!(classify_contact("12345").is_err());
        assert!(classify_contact("not@valid").is_err());
        assert!(classify_contact("hello").is_err());
    }

    #[test]
    fn test_first_submission_binds_then_must_match() {
        let mut g = guest(2);
        let now = Utc::now();

        let first = verify_contact(&mut g, &Contact::Phone("9876543210".into()), now).unwrap();
        assert_eq!(first, Verification::Bound);
        assert_eq!(g.phone.as_deref(), Some("9876543210"));
        assert_eq!(g.token_used_first_time, Some(now));

        let again = verify_contact(&mut g, &Contact::Phone("9876543210".into()), Utc::now()).unwrap();
        assert_eq!(again, Verification::Matched);
        assert_eq!(g.token_used_first_time, Some(now));

        let other = verify_contact(&mut g, &Contact::Phone("9999999999".into()), now);
        assert!(matches!(other, Err(AppError::Forbidden(_))));

        let other_kind = verify_contact(&mut g, &Contact::Email("x@y.com".into()), now);
        assert!(matches!(other_kind, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_prefilled_contact_compares_normalized() {
        let mut g = guest(2);
        g.email = Some(" Guest@Example.com".into());
        let outcome = verify_contact(&mut g, &Contact::Email("guest@example.com".into()), Utc::now()).unwrap();
        assert_eq!(outcome, Verification::Matched);
    }

    #[test]
    fn test_device_cap_never_exceeded() {
        let mut g = guest(2);
        let now = Utc::now();

        for i in 0..10 {
            let fp = format!("fp-{}", i % 4);
            let _ = register_device(&mut g, &fp, now);
            assert!(g.devices().len() <= 2);
        }
        assert_eq!(g.devices(), vec!["fp-0".to_string(), "fp-1".to_string()]);
    }

    #[test]
    fn test_known_device_is_noop() {
        let mut g = guest(1);
        let now = Utc::now();
        assert_eq!(register_device(&mut g, "fp", now).unwrap(), DeviceRegistration::Registered);
        assert_eq!(register_device(&mut g, "fp", now).unwrap(), DeviceRegistration::AlreadyRegistered);
        assert!(matches!(register_device(&mut g, "other", now), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_fingerprint_validation() {
        assert!(validate_fingerprint("   ").is_err());
        assert!(validate_fingerprint(&"x".repeat(MAX_FINGERPRINT_LEN + 1)).is_err());
        assert_eq!(validate_fingerprint(" abc ").unwrap(), "abc");
    }
}
