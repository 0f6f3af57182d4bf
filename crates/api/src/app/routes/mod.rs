use axum::{
    routing::{get, post},
    Router,
};

use crate::config::AuthMode;

pub mod members;
pub mod posts;
pub mod session;
pub mod system;

/// Router for every endpoint. The access gate is layered on top by `build_router`.
pub fn router(mode: AuthMode) -> Router {
    let router = Router::new()
        .route("/", get(system::home))
        .route("/health", get(system::health))
        .route("/login", post(session::login))
        .route("/logout", get(session::logout))
        .nest("/members", members::router())
        .nest("/posts", posts::router());

    match mode {
        AuthMode::Token => router.route("/auth/token", post(session::token)),
        AuthMode::Session => router,
    }
}
