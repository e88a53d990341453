use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::LoginRequest;
use crate::api::extractors::{auth::{AdminSession, SESSION_COOKIE}, client::ClientIp, json::ValidJson};
use crate::domain::models::auth::{AdminProfile, LoginResponse};
use crate::domain::services::auth_service::{AuthService, SESSION_DAYS};
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::{info, warn};

pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    cookies: Cookies,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.rate_limiter.check(&format!("{}:login", ip), &state.config.login_rate_limit)?;

    let email = payload.email.trim().to_lowercase();
    let admin = state.admin_repo.find_by_email(&email).await?
        .ok_or(AppError::Unauthorized)
        .inspect_err(|_| warn!(%ip, "Login attempt for unknown admin"))?;

    AuthService::verify_password(&payload.password, &admin.password_hash)
        .inspect_err(|_| warn!(%ip, admin_id = %admin.id, "Login attempt with wrong password"))?;

    let token = state.auth_service.issue_session(&admin)?;
    set_session_cookie(&cookies, token, !state.config.is_development());

    info!("Admin logged in: {}", admin.id);

    Ok(Json(LoginResponse {
        admin: AdminProfile { id: admin.id, email: admin.email },
        expires_in_secs: SESSION_DAYS * 24 * 60 * 60,
    }))
}

pub async fn logout(cookies: Cookies) -> impl IntoResponse {
    cookies.remove(Cookie::build((SESSION_COOKIE, "")).path("/").into());
    info!("Admin logged out");
    Json(serde_json::json!({"status": "logged_out"}))
}

pub async fn me(AdminSession(admin): AdminSession) -> impl IntoResponse {
    Json(AdminProfile { id: admin.id, email: admin.email })
}

fn set_session_cookie(cookies: &Cookies, token: String, secure: bool) {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(Duration::days(SESSION_DAYS));
    cookies.add(cookie);
}
