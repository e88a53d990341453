use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tera::{Context, Tera};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::{models::guest::Guest, ports::EmailService};
use crate::error::AppError;

pub const INVITATION_TEMPLATE: &str = "invitation.html";
pub const CUSTOM_TEMPLATE: &str = "custom.html";

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(INVITATION_TEMPLATE, include_str!("../../templates/invitation.html"))?;
    tera.add_raw_template(CUSTOM_TEMPLATE, include_str!("../../templates/custom.html"))?;
    Ok(tera)
}

pub enum MailKind {
    Invitation,
    Custom { subject: String, message: String },
}

#[derive(Debug, Serialize, Clone)]
pub struct SendFailure {
    pub guest_id: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Default)]
pub struct BulkSendReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<SendFailure>,
}

pub struct InvitationMailer {
    email_service: Arc<dyn EmailService>,
    templates: Arc<Tera>,
    config: Config,
}

impl InvitationMailer {
    pub fn new(email_service: Arc<dyn EmailService>, templates: Arc<Tera>, config: Config) -> Self {
        Self { email_service, templates, config }
    }

    fn render(&self, guest: &Guest, kind: &MailKind) -> Result<(String, String), AppError> {
        let events: Vec<&str> = guest.event_slugs().iter().map(|s| s.as_str()).collect();
        let mut data = json!({
            "guest_name": guest.name,
            "invite_link": self.config.invite_link(&guest.token),
            "events": events,
        });

        let (subject, template) = match kind {
            MailKind::Invitation => (format!("You're invited, {}!", guest.name), INVITATION_TEMPLATE),
            MailKind::Custom { subject, message } => {
                data["message"] = json!(message);
                (subject.clone(), CUSTOM_TEMPLATE)
            }
        };

        let context = Context::from_value(data).map_err(|_| AppError::Internal)?;
        let body = self.templates.render(template, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Template render failed: {}", e)))?;

        Ok((subject, body))
    }

    /// Sends one mail per requested guest, strictly in order and without retries.
    /// Every entry lands in exactly one of `sent`, `failed` or `skipped`.
    pub async fn send_batch(&self, targets: Vec<(String, Option<Guest>)>, kind: &MailKind) -> BulkSendReport {
        let mut report = BulkSendReport { total: targets.len(), ..Default::default() };

        for (guest_id, guest) in targets {
            let Some(guest) = guest else {
                warn!(%guest_id, "Skipping unknown guest");
                report.skipped += 1;
                continue;
            };
            let Some(recipient) = guest.email.as_deref() else {
                report.skipped += 1;
                continue;
            };

            let result = match self.render(&guest, kind) {
                Ok((subject, body)) => self.email_service.send(recipient, &subject, &body).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    error!(%guest_id, "Email send failed: {}", e);
                    report.failed += 1;
                    report.failures.push(SendFailure { guest_id, reason: e.to_string() });
                }
            }
        }

        info!(
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "Bulk email run finished"
        );
        report
    }
}
