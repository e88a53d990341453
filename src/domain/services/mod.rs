pub mod auth_service;
pub mod guest_access;
pub mod mailer;
pub mod rate_limiter;
