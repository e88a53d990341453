use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AdminSession, json::ValidJson};
use crate::api::dtos::requests::{CustomEmailRequest, SendInvitationsRequest};
use crate::domain::models::guest::Guest;
use crate::domain::services::mailer::MailKind;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

/// Pairs every requested id with its guest, keeping unknown ids so they count as skipped.
async fn resolve_targets(state: &AppState, ids: &[String]) -> Result<Vec<(String, Option<Guest>)>, AppError> {
    let mut targets = Vec::with_capacity(ids.len());
    for id in ids {
        targets.push((id.clone(), state.guest_repo.find_by_id(id).await?));
    }
    Ok(targets)
}

pub async fn send_invitations(
    State(state): State<Arc<AppState>>,
    AdminSession(admin): AdminSession,
    ValidJson(payload): ValidJson<SendInvitationsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let targets = match payload.guest_ids {
        Some(ids) => resolve_targets(&state, &ids).await?,
        None => state.guest_repo.list(None).await?
            .into_iter()
            .map(|g| (g.id.clone(), Some(g)))
            .collect(),
    };

    info!(admin_id = %admin.id, count = targets.len(), "Sending invitation emails");
    let report = state.mailer.send_batch(targets, &MailKind::Invitation).await;
    Ok(Json(report))
}

pub async fn send_custom_email(
    State(state): State<Arc<AppState>>,
    AdminSession(admin): AdminSession,
    ValidJson(payload): ValidJson<CustomEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let targets = resolve_targets(&state, &payload.guest_ids).await?;

    info!(admin_id = %admin.id, count = targets.len(), "Sending custom emails");
    let kind = MailKind::Custom {
        subject: payload.subject.trim().to_string(),
        message: payload.message,
    };
    let report = state.mailer.send_batch(targets, &kind).await;
    Ok(Json(report))
}
