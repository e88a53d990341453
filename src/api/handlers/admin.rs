use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AdminSession, json::ValidJson};
use crate::api::dtos::requests::CreateAdminRequest;
use crate::domain::models::admin::Admin;
use crate::domain::services::auth_service::AuthService;
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    let admins = state.admin_repo.list().await?;
    Ok(Json(admins))
}

pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    AdminSession(creator): AdminSession,
    ValidJson(payload): ValidJson<CreateAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    if state.admin_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("An admin with this email already exists".into()));
    }

    let admin = Admin::new(&email, AuthService::hash_password(&payload.password)?);
    let created = state.admin_repo.create(&admin).await?;

    info!(created_by = %creator.id, "Created admin: {}", created.id);
    Ok(Json(created))
}

pub async fn delete_admin(
    State(state): State<Arc<AppState>>,
    AdminSession(actor): AdminSession,
    Path(admin_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_repo.find_by_id(&admin_id).await?
        .ok_or(AppError::NotFound("Admin not found".into()))?;

    if !state.admin_repo.delete_unless_last(&admin_id).await? {
        warn!(actor = %actor.id, "Refused to delete the last admin");
        return Err(AppError::Validation("Cannot delete the last remaining admin".into()));
    }

    info!(actor = %actor.id, "Deleted admin {}", admin_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}
