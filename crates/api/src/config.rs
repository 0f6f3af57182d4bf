//! Process configuration, read once at startup.
//!
//! | Variable | Required | Default |
//! |---|---|---|
//! | `BOARD_JWT_SECRET` | yes | |
//! | `BOARD_ACCESS_TTL_SECS` | yes | |
//! | `BOARD_REFRESH_TTL_SECS` | yes | |
//! | `BOARD_BIND_ADDR` | no | `0.0.0.0:8080` |
//! | `BOARD_AUTH_MODE` | no | `token` |
//! | `BOARD_REJECT_STYLE` | no | `status` |
//! | `BOARD_COOKIE_SECURE` | no | `false` |
//! | `BOARD_ARGON2_PARAMS` | no | library defaults |
//! | `BOARD_LOG_FORMAT` | no | `json` |
//! | `DATABASE_URL` | no | in-memory store |

use core::str::FromStr;
use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use board_auth::{KeyError, SigningKey, TokenConfig};
use board_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Upper bound for token and session lifetimes (ten years).
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("BOARD_JWT_SECRET is unusable: {0}")]
    SigningKey(#[from] KeyError),
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// How callers carry their identity between requests.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Signed token in `Authorization: Bearer` or the `accessToken` cookie.
    #[default]
    Token,
    /// Opaque id in the `SESSION` cookie, backed by a server-side store.
    Session,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(Self::Token),
            "session" => Ok(Self::Session),
            other => Err(format!("expected `token` or `session`, got `{other}`")),
        }
    }
}

/// What the access gate answers when it rejects a request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RejectStyle {
    /// `401` with a JSON error body.
    #[default]
    Status,
    /// `303` to the login page.
    Redirect,
}

impl FromStr for RejectStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "redirect" => Ok(Self::Redirect),
            other => Err(format!("expected `status` or `redirect`, got `{other}`")),
        }
    }
}

/// Argon2 cost parameters (memory KiB, iterations, parallelism).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Argon2Params {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl FromStr for Argon2Params {
    type Err = String;

    /// `m,t,p`, e.g. `19456,2,1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [m_cost, t_cost, p_cost] => Ok(Self {
                m_cost: *m_cost,
                t_cost: *t_cost,
                p_cost: *p_cost,
            }),
            _ => Err("expected three comma-separated integers `m,t,p`".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub token: TokenConfig,
    pub auth_mode: AuthMode,
    pub reject_style: RejectStyle,
    pub cookie_secure: bool,
    pub argon2: Option<Argon2Params>,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = get("BOARD_JWT_SECRET").ok_or(ConfigError::Missing("BOARD_JWT_SECRET"))?;
        let key = SigningKey::from_base64(&secret)?;
        let access_ttl = required_ttl(&get, "BOARD_ACCESS_TTL_SECS")?;
        let refresh_ttl = required_ttl(&get, "BOARD_REFRESH_TTL_SECS")?;

        let bind_addr = get("BOARD_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BOARD_BIND_ADDR", e.to_string()))?;

        let auth_mode = optional(&get, "BOARD_AUTH_MODE")?.unwrap_or_default();
        let reject_style = optional(&get, "BOARD_REJECT_STYLE")?.unwrap_or_default();
        let cookie_secure = optional::<bool>(&get, "BOARD_COOKIE_SECURE")?.unwrap_or(false);
        let argon2 = optional(&get, "BOARD_ARGON2_PARAMS")?;
        let log_format = optional(&get, "BOARD_LOG_FORMAT")?.unwrap_or_default();

        Ok(Self {
            bind_addr,
            token: TokenConfig::new(key, access_ttl, refresh_ttl),
            auth_mode,
            reject_style,
            cookie_secure,
            argon2,
            log_format,
            database_url: get("DATABASE_URL"),
        })
    }
}

fn required_ttl(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Duration, ConfigError> {
    let secs = optional::<i64>(get, var)?.ok_or(ConfigError::Missing(var))?;
    if secs <= 0 {
        return Err(ConfigError::invalid(var, "must be a positive number of seconds"));
    }
    if secs > MAX_TTL_SECS {
        return Err(ConfigError::invalid(
            var,
            format!("must be at most {MAX_TTL_SECS} seconds"),
        ));
    }
    Duration::try_seconds(secs).ok_or_else(|| ConfigError::invalid(var, "out of range"))
}

fn optional<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    get(var)
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .map_err(|e| ConfigError::invalid(var, e.to_string()))
}
