use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};

use board_auth::RequestIdentity;
use board_members::Registration;

use crate::app::errors;
use crate::app::routes::session;
use crate::app::services::{AppServices, ServiceError};

pub fn router() -> Router {
    Router::new()
        .route("/join", post(join))
        .route("/login", post(session::login))
        .route("/me", get(me))
}

pub async fn join(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<Registration>,
) -> Response {
    match services.join(form).await {
        Ok(_) => Redirect::to("/posts").into_response(),
        Err(ServiceError::Duplicate(_)) => Redirect::to("/members/join?error=duplicate").into_response(),
        Err(ServiceError::Validation(_)) => Redirect::to("/members/join?error=invalid").into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn me(Extension(identity): Extension<RequestIdentity>) -> Response {
    match identity.identity() {
        Some(identity) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "login_id": identity.subject(),
                "role": identity.role().as_str(),
            })),
        )
            .into_response(),
        None => errors::service_error_to_response(ServiceError::Unauthenticated),
    }
}
