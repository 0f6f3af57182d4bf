use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use board_auth::OwnershipError;

use crate::app::services::ServiceError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    /// Path segment that is not a valid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("resource does not exist")]
    Missing,
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Duplicate(_) => {
            json_error(StatusCode::CONFLICT, "duplicate", "login id is already taken")
        }
        ServiceError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid login id or password",
        ),
        ServiceError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required")
        }
        ServiceError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        ServiceError::Ownership(OwnershipError::NoIdentity) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required")
        }
        ServiceError::Ownership(e @ (OwnershipError::NotOwner | OwnershipError::OrphanResource)) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
        }
        ServiceError::Internal(detail) => {
            tracing::error!(error = %detail, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
