use std::sync::Arc;
use crate::domain::ports::{AdminRepository, EmailService, EventRepository, GuestRepository};
use crate::domain::services::{
    auth_service::AuthService,
    guest_access::GuestAccessService,
    mailer::InvitationMailer,
    rate_limiter::FixedWindowLimiter,
};
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub admin_repo: Arc<dyn AdminRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub guest_repo: Arc<dyn GuestRepository>,
    pub auth_service: Arc<AuthService>,
    pub guest_access: Arc<GuestAccessService>,
    pub mailer: Arc<InvitationMailer>,
    pub rate_limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    pub fn new(
        config: Config,
        admin_repo: Arc<dyn AdminRepository>,
        event_repo: Arc<dyn EventRepository>,
        guest_repo: Arc<dyn GuestRepository>,
        email_service: Arc<dyn EmailService>,
        templates: Arc<Tera>,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(&config.jwt_secret)),
            guest_access: Arc::new(GuestAccessService::new(guest_repo.clone())),
            mailer: Arc::new(InvitationMailer::new(email_service, templates, config.clone())),
            rate_limiter: Arc::new(FixedWindowLimiter::new()),
            config,
            admin_repo,
            event_repo,
            guest_repo,
        }
    }
}
