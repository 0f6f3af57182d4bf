use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use board_auth::{AccessPolicy, GateDecision, IdentityResolver};

use crate::app::errors;
use crate::config::{AuthMode, RejectStyle};
use crate::cookies::{read_cookie, ACCESS_TOKEN_COOKIE, SESSION_COOKIE};

pub const LOGIN_PAGE: &str = "/members/login";

#[derive(Clone)]
pub struct GateState {
    pub policy: Arc<AccessPolicy>,
    pub resolver: Arc<dyn IdentityResolver>,
    pub mode: AuthMode,
    pub reject: RejectStyle,
}

/// Runs before every route. Resolves the caller once, applies the access
/// policy, and hands the `RequestIdentity` to handlers via request extensions.
pub async fn access_gate(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let credential = extract_credential(req.headers(), state.mode);
    let identity = state.resolver.resolve(credential, Utc::now());

    let path = req.uri().path().to_string();
    let decision = state.policy.decide(&path, &identity);
    tracing::debug!(
        method = %req.method(),
        path = %path,
        subject = identity.subject(),
        ?decision,
        "access decision"
    );

    match decision {
        GateDecision::Proceed => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        GateDecision::Reject => {
            let rule = state
                .policy
                .matching_rule(&path)
                .map(|rule| rule.pattern.as_str())
                .unwrap_or("<default>");
            tracing::info!(method = %req.method(), path = %path, rule, "unauthenticated request rejected");
            match state.reject {
                RejectStyle::Status => errors::json_error(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "authentication required",
                ),
                RejectStyle::Redirect => Redirect::to(LOGIN_PAGE).into_response(),
            }
        }
    }
}

/// Raw credential for the configured mode. Token mode prefers the
/// `Authorization` header over the cookie.
fn extract_credential(headers: &HeaderMap, mode: AuthMode) -> Option<&str> {
    match mode {
        AuthMode::Token => {
            extract_bearer(headers).or_else(|| read_cookie(headers, ACCESS_TOKEN_COOKIE))
        }
        AuthMode::Session => read_cookie(headers, SESSION_COOKIE),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
