//! Login, logout and token issuance.

use std::sync::Arc;

use axum::{
    extract::{Extension, OriginalUri},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;

use crate::app::services::{AppServices, ServiceError};
use crate::app::{dto, errors};
use crate::config::AuthMode;
use crate::cookies::{read_cookie, CookieSettings, SESSION_COOKIE};

/// Where a successful login or a logout lands.
const AFTER_LOGIN: &str = "/posts";

#[derive(Debug, Copy, Clone)]
pub struct LoginSettings {
    pub mode: AuthMode,
    pub cookie: CookieSettings,
}

/// Form login. Sets the credential cookie for the configured mode.
///
/// A failed login redirects back to the submitting path with `?error=true`;
/// unknown login id and wrong password look the same.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(settings): Extension<LoginSettings>,
    OriginalUri(uri): OriginalUri,
    Form(form): Form<dto::LoginRequest>,
) -> Response {
    let now = Utc::now();
    let credential = match settings.mode {
        AuthMode::Token => services
            .login_token(&form.login_id, &form.password, now)
            .await
            .map(|pair| pair.access_token),
        AuthMode::Session => services
            .login_session(&form.login_id, &form.password, now)
            .await
            .map(|session| session.id),
    };

    match credential {
        Ok(value) => (
            [(header::SET_COOKIE, settings.cookie.issue(&value))],
            Redirect::to(AFTER_LOGIN),
        )
            .into_response(),
        Err(ServiceError::InvalidCredentials) => {
            Redirect::to(&format!("{}?error=true", uri.path())).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Drop the credential cookie. In session mode the server session is revoked too.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(settings): Extension<LoginSettings>,
    headers: HeaderMap,
) -> Response {
    if settings.mode == AuthMode::Session {
        if let Some(id) = read_cookie(&headers, SESSION_COOKIE) {
            services.logout_session(id);
        }
    }

    (
        [(header::SET_COOKIE, settings.cookie.clear())],
        Redirect::to(AFTER_LOGIN),
    )
        .into_response()
}

/// JSON login for API clients (token mode only).
pub async fn token(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> Response {
    match services.login_token(&body.login_id, &body.password, Utc::now()).await {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
