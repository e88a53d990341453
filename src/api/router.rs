use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, auth, email, event, guest, health, invitation};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Admin session
        .route("/api/v1/admin/login", post(auth::login))
        .route("/api/v1/admin/logout", post(auth::logout))
        .route("/api/v1/admin/me", get(auth::me))

        // Admin accounts
        .route("/api/v1/admin/admins", get(admin::list_admins).post(admin::create_admin))
        .route("/api/v1/admin/admins/{admin_id}", delete(admin::delete_admin))

        // Events
        .route("/api/v1/admin/events", get(event::list_events))
        .route("/api/v1/admin/events/{slug}", get(event::get_event).put(event::upsert_event).delete(event::delete_event))

        // Guests
        .route("/api/v1/admin/guests", get(guest::list_guests).post(guest::create_guest))
        .route("/api/v1/admin/guests/bulk-delete", post(guest::bulk_delete_guests))
        .route("/api/v1/admin/guests/stats", get(guest::guest_stats))
        .route("/api/v1/admin/guests/{guest_id}", get(guest::get_guest).put(guest::update_guest).delete(guest::delete_guest))
        .route("/api/v1/admin/guests/{guest_id}/regenerate-token", post(guest::regenerate_token))

        // Email
        .route("/api/v1/admin/emails/invitations", post(email::send_invitations))
        .route("/api/v1/admin/emails/custom", post(email::send_custom_email))

        // Guest invitation flow
        .route("/api/v1/invite/{token}", get(invitation::get_invitation))
        .route("/api/v1/invite/{token}/verify", post(invitation::verify_contact))
        .route("/api/v1/invite/{token}/device", post(invitation::save_device))
        .route("/api/v1/invite/{token}/events", get(invitation::list_guest_events))
        .route("/api/v1/invite/{token}/rsvp", post(invitation::submit_rsvp))
        .route("/api/v1/invite/{token}/preferences", post(invitation::submit_preferences))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = %request.uri().path(),
                        admin_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
