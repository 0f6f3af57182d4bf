//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: operations behind the routes (repositories, auth, ownership)
//! - `routes/`: HTTP handlers, one file per area
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use board_auth::{
    AccessPolicy, Argon2Passwords, Authenticator, BearerTokenResolver, CookieSessionResolver,
    CredentialStore, IdentityResolver, InMemorySessionStore, SessionStore, TokenCodec,
};
use board_infra::{InMemoryBoardStore, MemberRepository, PostRepository};

use crate::config::{AppConfig, AuthMode};
use crate::cookies::{CookieSettings, ACCESS_TOKEN_COOKIE, SESSION_COOKIE};
use crate::middleware::{self, GateState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use routes::session::LoginSettings;
use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Uses Postgres when `DATABASE_URL` is configured, otherwise an in-memory store.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    match &config.database_url {
        #[cfg(feature = "postgres")]
        Some(url) => {
            let store = board_infra::PostgresBoardStore::connect(url).await?;
            store.migrate().await?;
            tracing::info!("using postgres store");
            build_router(config, Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => anyhow::bail!("DATABASE_URL is set but this build lacks the `postgres` feature"),
        None => {
            tracing::info!("using in-memory store");
            build_router(config, Arc::new(InMemoryBoardStore::new()))
        }
    }
}

/// Wire services, the access gate and all routes around a given store.
pub fn build_router<S>(config: &AppConfig, store: Arc<S>) -> anyhow::Result<Router>
where
    S: MemberRepository + PostRepository + CredentialStore + 'static,
{
    let passwords = Arc::new(match config.argon2 {
        Some(p) => Argon2Passwords::with_params(p.m_cost, p.t_cost, p.p_cost)?,
        None => Argon2Passwords::new(),
    });
    let codec = Arc::new(TokenCodec::new(&config.token));
    let authenticator = Authenticator::new(store.clone(), passwords.clone(), codec.clone());

    let (resolver, sessions, cookie_name) = match config.auth_mode {
        AuthMode::Token => {
            let resolver: Arc<dyn IdentityResolver> = Arc::new(BearerTokenResolver::new(codec));
            (resolver, None, ACCESS_TOKEN_COOKIE)
        }
        AuthMode::Session => {
            let sessions: Arc<dyn SessionStore> =
                Arc::new(InMemorySessionStore::new(config.token.access_ttl));
            let resolver: Arc<dyn IdentityResolver> =
                Arc::new(CookieSessionResolver::new(sessions.clone()));
            (resolver, Some(sessions), SESSION_COOKIE)
        }
    };

    let services = Arc::new(AppServices::new(
        store.clone(),
        store,
        passwords,
        authenticator,
        sessions,
    ));
    let login = LoginSettings {
        mode: config.auth_mode,
        cookie: CookieSettings {
            name: cookie_name,
            max_age_secs: config.token.access_ttl.num_seconds(),
            secure: config.cookie_secure,
        },
    };
    let gate = GateState {
        policy: Arc::new(AccessPolicy::board_defaults()),
        resolver,
        mode: config.auth_mode,
        reject: config.reject_style,
    };

    tracing::info!(mode = ?config.auth_mode, reject = ?config.reject_style, "router built");

    Ok(routes::router(config.auth_mode).layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(gate, middleware::access_gate))
            .layer(Extension(services))
            .layer(Extension(login)),
    ))
}
