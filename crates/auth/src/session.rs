//! Server-side sessions for cookie-session deployments.
//!
//! Only used when the board runs in session mode; token deployments never
//! touch this module.

use std::collections::HashMap;
use std::sync::RwLock;

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::Identity;

/// An open session. `id` is the opaque cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("failed to generate session id: {0}")]
    Entropy(String),

    #[error("session store unavailable")]
    Unavailable,

    #[error("session lifetime is out of range")]
    OutOfRange,
}

pub trait SessionStore: Send + Sync {
    /// Open a session for a freshly authenticated identity.
    fn open(&self, identity: Identity, now: DateTime<Utc>) -> Result<Session, SessionError>;

    /// Identity bound to a live session, or `None` if unknown or expired.
    fn lookup(&self, id: &str, now: DateTime<Utc>) -> Option<Identity>;

    /// Invalidate a session. Returns whether it existed.
    fn revoke(&self, id: &str) -> bool;
}

/// In-memory session store for single-process deployments and tests.
#[derive(Debug)]
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every expired session. Returns how many were removed.
    ///
    /// Also runs on every `open`, so sessions that are never looked up again
    /// do not accumulate.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        match self.sessions.write() {
            Ok(mut map) => purge(&mut map, now),
            Err(_) => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn open(&self, identity: Identity, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(SessionError::OutOfRange)?;
        let session = Session {
            id: generate_id()?,
            identity,
            issued_at: now,
            expires_at,
        };

        let mut map = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        let purged = purge(&mut map, now);
        map.insert(session.id.clone(), session.clone());
        tracing::debug!(subject = session.identity.subject(), purged, "session opened");
        Ok(session)
    }

    fn lookup(&self, id: &str, now: DateTime<Utc>) -> Option<Identity> {
        {
            let map = self.sessions.read().ok()?;
            let session = map.get(id)?;
            if session.expires_at >= now {
                return Some(session.identity.clone());
            }
        }

        if let Ok(mut map) = self.sessions.write() {
            map.remove(id);
        }
        None
    }

    fn revoke(&self, id: &str) -> bool {
        match self.sessions.write() {
            Ok(mut map) => map.remove(id).is_some(),
            Err(_) => false,
        }
    }
}

fn purge(map: &mut HashMap<String, Session>, now: DateTime<Utc>) -> usize {
    let before = map.len();
    map.retain(|_, s| s.expires_at >= now);
    before - map.len()
}

/// 256-bit random id, base64url without padding.
fn generate_id() -> Result<String, SessionError> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| SessionError::Entropy(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}
