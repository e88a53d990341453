use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::error;

static EXPOSE_ERROR_DETAIL: OnceLock<bool> = OnceLock::new();

/// Enables internal error details in response bodies. Only set in development.
pub fn expose_error_detail(enabled: bool) {
    let _ = EXPOSE_ERROR_DETAIL.set(enabled);
}

fn detail_enabled() -> bool {
    EXPOSE_ERROR_DETAIL.get().copied().unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid input: {} field error(s)", .0.len())]
    InvalidFields(Vec<FieldError>),
    #[error("Too many requests, retry after {0}s")]
    RateLimited(u64),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal | AppError::InternalWithMsg(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

fn internal_body(detail: String) -> serde_json::Value {
    if detail_enabled() {
        json!({ "error": "Internal server error", "detail": detail })
    } else {
        json!({ "error": "Internal server error" })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                internal_body(e.to_string())
            }
            AppError::InvalidFields(details) => json!({
                "error": "Validation failed",
                "details": details,
            }),
            AppError::RateLimited(retry_after) => {
                let body = Json(json!({ "error": "Too many requests, please try again later" }));
                return (status, [(header::RETRY_AFTER, retry_after.to_string())], body).into_response();
            }
            AppError::Internal => internal_body("unspecified".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                internal_body(msg)
            }
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg) => json!({ "error": msg }),
            AppError::Unauthorized => json!({ "error": "Unauthorized" }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RateLimited(3).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::InvalidFields(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited(42).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
