//! Request identity resolution.
//!
//! A resolver gets the raw credential already extracted from its carrier
//! (header or cookie) by the HTTP layer. It never fails: anything that does
//! not verify is treated as no credential at all.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{RequestIdentity, SessionStore, TokenCodec, TokenError};

pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: Option<&str>, now: DateTime<Utc>) -> RequestIdentity;
}

/// Resolves signed access tokens (token deployments).
#[derive(Debug, Clone)]
pub struct BearerTokenResolver {
    codec: Arc<TokenCodec>,
}

impl BearerTokenResolver {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }
}

impl IdentityResolver for BearerTokenResolver {
    fn resolve(&self, credential: Option<&str>, now: DateTime<Utc>) -> RequestIdentity {
        let Some(token) = credential.filter(|t| !t.is_empty()) else {
            return RequestIdentity::Anonymous;
        };

        match self.codec.verify(token, now) {
            Ok(claims) => RequestIdentity::Authenticated(claims.into_identity()),
            Err(TokenError::Expired { subject, expired_at }) => {
                tracing::debug!(?subject, %expired_at, "expired token ignored");
                RequestIdentity::Anonymous
            }
            Err(e) => {
                tracing::debug!(error = %e, "token ignored");
                RequestIdentity::Anonymous
            }
        }
    }
}

/// Resolves server-side session ids (session deployments).
#[derive(Clone)]
pub struct CookieSessionResolver {
    sessions: Arc<dyn SessionStore>,
}

impl CookieSessionResolver {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }
}

impl IdentityResolver for CookieSessionResolver {
    fn resolve(&self, credential: Option<&str>, now: DateTime<Utc>) -> RequestIdentity {
        credential
            .filter(|id| !id.is_empty())
            .and_then(|id| self.sessions.lookup(id, now))
            .map(RequestIdentity::Authenticated)
            .unwrap_or(RequestIdentity::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    use crate::{Identity, InMemorySessionStore, Role, SigningKey, TokenConfig};

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(&TokenConfig::new(
            SigningKey::from_bytes(vec![9u8; 32]).unwrap(),
            Duration::hours(24),
            Duration::hours(24),
        )))
    }

    #[test]
    fn missing_credential_is_anonymous() {
        let resolver = BearerTokenResolver::new(codec());
        assert_eq!(resolver.resolve(None, t0()), RequestIdentity::Anonymous);
        assert_eq!(resolver.resolve(Some(""), t0()), RequestIdentity::Anonymous);
    }

    #[test]
    fn valid_token_resolves_subject_and_role() {
        let codec = codec();
        let pair = codec.issue(&Identity::new("alice", Role::user()), t0()).unwrap();
        let resolved = BearerTokenResolver::new(codec).resolve(Some(&pair.access_token), t0());
        assert_eq!(resolved.subject(), Some("alice"));
        assert_eq!(resolved.identity().map(|i| i.role().as_str()), Some("USER"));
    }

    #[test]
    fn expired_and_refresh_tokens_are_anonymous() {
        let codec = codec();
        let pair = codec.issue(&Identity::new("alice", Role::user()), t0()).unwrap();
        let resolver = BearerTokenResolver::new(codec);

        let later = t0() + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(resolver.resolve(Some(&pair.access_token), later), RequestIdentity::Anonymous);
        assert_eq!(resolver.resolve(Some(&pair.refresh_token), t0()), RequestIdentity::Anonymous);
    }

    #[test]
    fn session_resolver_follows_store() {
        let store = Arc::new(InMemorySessionStore::new(Duration::hours(1)));
        let session = store.open(Identity::new("bob", Role::user()), t0()).unwrap();
        let resolver = CookieSessionResolver::new(store.clone());

        assert_eq!(resolver.resolve(Some(&session.id), t0()).subject(), Some("bob"));
        assert_eq!(resolver.resolve(Some("forged"), t0()), RequestIdentity::Anonymous);
        assert_eq!(resolver.resolve(None, t0()), RequestIdentity::Anonymous);

        store.revoke(&session.id);
        assert_eq!(resolver.resolve(Some(&session.id), t0()), RequestIdentity::Anonymous);
    }

    proptest! {
        #[test]
        fn bearer_resolver_never_raises(s in ".*") {
            let resolver = BearerTokenResolver::new(codec());
            prop_assert_eq!(resolver.resolve(Some(&s), t0()), RequestIdentity::Anonymous);
        }
    }
}
