//! Signed, expiring identity tokens (JWT, HS256).
//!
//! Tokens are integrity-protected, not encrypted: anyone holding one can read
//! its claims. The same symmetric key signs and verifies.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use crate::claims::WireClaims;
use crate::{Claims, Identity, TokenError};

/// Minimum signing key length for HS256 (256 bits).
pub const MIN_KEY_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("signing secret is empty")]
    Empty,

    #[error("signing secret is not valid base64: {0}")]
    NotBase64(String),

    #[error("signing key is {len} bytes; at least {MIN_KEY_LEN} are required")]
    TooShort { len: usize },
}

/// Raw HMAC key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Decode a base64 (standard alphabet) secret into key bytes.
    pub fn from_base64(secret: &str) -> Result<Self, KeyError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(KeyError::Empty);
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(secret)
            .map_err(|e| KeyError::NotBase64(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyError> {
        if bytes.is_empty() {
            return Err(KeyError::Empty);
        }
        if bytes.len() < MIN_KEY_LEN {
            return Err(KeyError::TooShort { len: bytes.len() });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SigningKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Key and lifetimes the codec is built from. Loaded once at startup.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub key: SigningKey,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(key: SigningKey, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            key,
            access_ttl,
            refresh_ttl,
        }
    }
}

/// Token pair handed to a client after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub grant_type: &'static str,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to sign token: {0}")]
pub struct TokenIssueError(String);

/// Issues and verifies tokens with a fixed key and fixed lifetimes.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        // Expiry is checked against the caller's `now` in `WireClaims::into_verified`,
        // so the library's wall-clock checks are switched off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(config.key.as_bytes()),
            decoding: DecodingKey::from_secret(config.key.as_bytes()),
            validation,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issue an access/refresh pair for `identity`, valid from `now`.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<TokenPair, TokenIssueError> {
        let access = WireClaims {
            sub: Some(identity.subject().to_string()),
            auth: Some(identity.role().as_str().to_string()),
            iat: Some(now.timestamp()),
            exp: expiry(now, self.access_ttl)?,
        };
        let refresh = WireClaims {
            sub: None,
            auth: None,
            iat: None,
            exp: expiry(now, self.refresh_ttl)?,
        };

        Ok(TokenPair {
            grant_type: "Bearer",
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Verify an access token against `now`.
    ///
    /// Pure function of (token, key, now). Never panics on arbitrary input.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Malformed)?;
        data.claims.into_verified(now)
    }

    fn sign(&self, claims: &WireClaims) -> Result<String, TokenIssueError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenIssueError(e.to_string()))
    }
}

/// `now + ttl` as a unix timestamp, refusing instants chrono cannot represent.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenIssueError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| TokenIssueError(format!("token lifetime of {}s is out of range", ttl.num_seconds())))
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
