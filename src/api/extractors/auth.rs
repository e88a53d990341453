use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use crate::state::AppState;
use crate::domain::models::admin::Admin;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

pub const SESSION_COOKIE: &str = "admin_token";

/// An admin re-derived from the `admin_token` cookie on every request.
pub struct AdminSession(pub Admin);

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(AppError::InternalWithMsg("Cookie layer missing".into()))?;

        let token = cookies.get(SESSION_COOKIE)
            .ok_or(AppError::Unauthorized)?
            .value()
            .to_string();

        let claims = state.auth_service.verify_session(&token)?;

        // Sessions of deleted admins die with the row.
        let admin = state.admin_repo.find_by_id(&claims.sub).await?
            .ok_or(AppError::Unauthorized)?;

        Span::current().record("admin_id", admin.id.as_str());

        Ok(AdminSession(admin))
    }
}
